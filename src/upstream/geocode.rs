//! Geocoding clients.
//!
//! Reverse geocoding uses the FCC Area API (`results[0].county_name`).
//! Forward geocoding uses Nominatim search and hands the first hit's
//! coordinates to the reverse geocoder.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{GeoError, GeoResolver};
use crate::store::normalize_county_name;

// == Wire Types ==
#[derive(Debug, Deserialize)]
struct AreaResponse {
    #[serde(default)]
    results: Vec<AreaResult>,
}

#[derive(Debug, Deserialize)]
struct AreaResult {
    county_name: Option<String>,
}

/// Nominatim reports coordinates as strings; accept numbers too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Text(String),
    Number(f64),
}

impl Coordinate {
    fn value(&self) -> Option<f64> {
        match self {
            Coordinate::Text(s) => s.trim().parse().ok(),
            Coordinate::Number(n) => Some(*n),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Place {
    lat: Coordinate,
    lon: Coordinate,
}

/// Rejects non-finite or out of range coordinates.
pub fn validate_coordinates(lat: f64, lng: f64) -> Result<(), GeoError> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(GeoError::InvalidCoordinates(format!("latitude {} out of range", lat)));
    }
    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        return Err(GeoError::InvalidCoordinates(format!("longitude {} out of range", lng)));
    }
    Ok(())
}

// == HTTP Resolver ==
/// Resolves places through the FCC and Nominatim HTTP APIs.
#[derive(Debug, Clone)]
pub struct HttpGeoResolver {
    http: reqwest::Client,
    fcc_url: String,
    nominatim_url: String,
}

impl HttpGeoResolver {
    pub fn new(
        http: reqwest::Client,
        fcc_url: impl Into<String>,
        nominatim_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            fcc_url: fcc_url.into(),
            nominatim_url: nominatim_url.into(),
        }
    }

    async fn get_json<T>(&self, url: &str, query: &[(&str, String)]) -> Result<T, GeoError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| GeoError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeoError::Http(format!("{} returned status {}", url, status)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| GeoError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl GeoResolver for HttpGeoResolver {
    async fn resolve_by_coordinates(&self, lat: f64, lng: f64) -> Result<String, GeoError> {
        validate_coordinates(lat, lng)?;

        let area: AreaResponse = self
            .get_json(
                &self.fcc_url,
                &[
                    ("lat", lat.to_string()),
                    ("lon", lng.to_string()),
                    ("format", "json".to_string()),
                ],
            )
            .await?;

        let county = area
            .results
            .into_iter()
            .next()
            .and_then(|r| r.county_name)
            .map(|name| normalize_county_name(&name))
            .filter(|name| !name.is_empty())
            .ok_or_else(|| GeoError::NotFound(format!("no county found at {}, {}", lat, lng)))?;

        debug!("({}, {}) resolved to {}", lat, lng, county);
        Ok(county)
    }

    async fn resolve_by_address(&self, query: &str) -> Result<String, GeoError> {
        let places: Vec<Place> = self
            .get_json(
                &self.nominatim_url,
                &[
                    ("q", query.to_string()),
                    ("format", "json".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;

        let place = places
            .first()
            .ok_or_else(|| GeoError::NotFound(format!("no place found for {:?}", query)))?;

        let (lat, lng) = match (place.lat.value(), place.lon.value()) {
            (Some(lat), Some(lng)) => (lat, lng),
            _ => return Err(GeoError::Malformed(format!("unreadable coordinates for {:?}", query))),
        };

        debug!("{:?} geocoded to ({}, {})", query, lat, lng);
        self.resolve_by_coordinates(lat, lng).await
    }
}
