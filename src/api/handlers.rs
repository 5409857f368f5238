//! API Handlers
//!
//! HTTP request handlers for each burn ban endpoint. Every lookup first gives
//! the store a chance to refresh, then resolves a county name and reads it.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};

use crate::auth::Authenticator;
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::models::{CountyResponse, HealthResponse, StatsResponse, TokenRequest, TokenResponse};
use crate::rate_limit::RateLimiter;
use crate::store::{normalize_county_name, CountyDb, CountyStore};
use crate::upstream::{GeoResolver, HttpBanFeed, HttpGeoResolver};

/// Application state shared across all handlers.
///
/// Handles are cheap to clone; clones share the same database, refresh
/// guard and rate limiter.
#[derive(Clone)]
pub struct AppState {
    /// County data and refresh logic
    pub store: CountyStore,
    /// Place to county resolution
    pub geo: Arc<dyn GeoResolver>,
    /// Token issuer, None when lookups are open
    pub auth: Option<Authenticator>,
    /// Per-IP limiter, None when unlimited
    pub limiter: Option<Arc<RateLimiter>>,
}

impl AppState {
    /// Creates an AppState without auth or rate limiting.
    pub fn new(store: CountyStore, geo: Arc<dyn GeoResolver>) -> Self {
        Self {
            store,
            geo,
            auth: None,
            limiter: None,
        }
    }

    /// Requires bearer tokens on lookup routes and mounts `POST /auth`.
    pub fn with_auth(mut self, auth: Authenticator) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Limits each client IP to `per_minute` requests. Zero disables the limit.
    pub fn with_rate_limit(mut self, per_minute: u32) -> Self {
        self.limiter = (per_minute > 0).then(|| Arc::new(RateLimiter::per_minute(per_minute)));
        self
    }

    /// Wires the HTTP feed and geocoders described by the configuration.
    pub fn from_config(config: &Config, db: CountyDb, http: reqwest::Client) -> Self {
        let feed = Arc::new(HttpBanFeed::new(http.clone(), config.feed_url.clone()));
        let geo = Arc::new(HttpGeoResolver::new(
            http,
            config.fcc_url.clone(),
            config.nominatim_url.clone(),
        ));
        let store = CountyStore::new(db.clone(), feed, config.refresh_threshold);

        let mut state = Self::new(store, geo);
        if config.rate_limit_per_minute > 0 {
            let limiter = RateLimiter::per_minute(config.rate_limit_per_minute)
                .trusting_forwarded_for(config.trust_forwarded_for);
            state.limiter = Some(Arc::new(limiter));
        }
        if let Some(settings) = &config.auth {
            state = state.with_auth(Authenticator::new(db, settings));
        }
        state
    }
}

/// Reads a county after normalization, mapping absence to 404.
async fn lookup(state: &AppState, name: &str) -> Result<Json<CountyResponse>> {
    let county = state
        .store
        .lookup(name)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("county {} not found", normalize_county_name(name))))?;

    Ok(Json(county.into()))
}

fn parse_coordinate(label: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| ApiError::InvalidRequest(format!("{} {:?} is not a number", label, raw)))
}

/// Handler for GET /county/:name
pub async fn county_handler(
    State(state): State<AppState>,
    name: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<CountyResponse>> {
    let Path(name) = name?;
    state.store.update_bans().await;
    lookup(&state, &name).await
}

/// Handler for GET /location/:lat/:lng
///
/// Reverse geocodes the coordinates to a county first.
pub async fn location_handler(
    State(state): State<AppState>,
    coordinates: std::result::Result<Path<(String, String)>, PathRejection>,
) -> Result<Json<CountyResponse>> {
    let Path((lat, lng)) = coordinates?;
    let lat = parse_coordinate("latitude", &lat)?;
    let lng = parse_coordinate("longitude", &lng)?;

    state.store.update_bans().await;
    let county = state.geo.resolve_by_coordinates(lat, lng).await?;
    lookup(&state, &county).await
}

/// Handler for GET /place/:place
///
/// Forward geocodes free text, then reverse geocodes the first match.
pub async fn place_handler(
    State(state): State<AppState>,
    place: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<CountyResponse>> {
    let Path(place) = place?;
    if place.trim().is_empty() {
        return Err(ApiError::InvalidRequest("place cannot be empty".to_string()));
    }

    state.store.update_bans().await;
    let county = state.geo.resolve_by_address(place.trim()).await?;
    lookup(&state, &county).await
}

/// Handler for POST /auth
///
/// Exchanges an API key and secret for a bearer token. Malformed bodies
/// are reported through [`ApiError`] like every other failure.
pub async fn auth_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>> {
    let Json(req) = payload?;
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let auth = state
        .auth
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("authentication is not enabled".to_string()))?;

    let token = auth.issue(&req.api_key, &req.api_secret).await?;
    Ok(Json(TokenResponse::new(token)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.store.stats().await.into())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
