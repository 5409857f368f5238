//! API Routes
//!
//! Configures the Axum router with all burn ban endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    auth_handler, county_handler, health_handler, location_handler, place_handler, stats_handler,
    AppState,
};
use crate::auth::require_bearer;
use crate::rate_limit::rate_limit;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /county/:name` - Burn ban status by county name
/// - `GET /location/:lat/:lng` - Burn ban status by coordinates
/// - `GET /place/:place` - Burn ban status by address or place name
/// - `POST /auth` - Exchange API credentials for a token (auth enabled only)
/// - `GET /stats` - Refresh and lookup counters
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - Bearer auth on the three lookups when the state carries an authenticator
/// - Per-IP rate limit on lookups and `/auth` when a limiter is configured
/// - CORS and request tracing on everything
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut api = Router::new()
        .route("/county/:name", get(county_handler))
        .route("/location/:lat/:lng", get(location_handler))
        .route("/place/:place", get(place_handler));

    if let Some(auth) = state.auth.clone() {
        api = api
            .route_layer(middleware::from_fn_with_state(auth, require_bearer))
            .route("/auth", post(auth_handler));
    }

    // Added last so it runs before the token check
    if let Some(limiter) = state.limiter.clone() {
        api = api.route_layer(middleware::from_fn_with_state(limiter, rate_limit));
    }

    api.route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
