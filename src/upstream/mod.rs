//! Upstream Services Module
//!
//! Clients for the burn ban bulletin and the geocoding services, each behind
//! a trait so the store and handlers can run against in-process fakes.

mod feed;
mod geocode;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use feed::{parse_bulletin, HttpBanFeed};
pub use geocode::{validate_coordinates, HttpGeoResolver};

/// User agent sent on every outbound request. Nominatim rejects anonymous clients.
pub const USER_AGENT: &str = concat!("burnban/", env!("CARGO_PKG_VERSION"));

// == Errors ==
/// Failure fetching or reading the burn ban bulletin.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// Network failure or timeout
    #[error("feed request failed: {0}")]
    Http(String),

    /// Non-success HTTP status
    #[error("feed returned status {0}")]
    Status(u16),

    /// Body is not the expected XML shape
    #[error("feed parse error: {0}")]
    Parse(String),
}

/// Failure resolving a place to a county.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeoError {
    /// The geocoder had no answer for the input
    #[error("{0}")]
    NotFound(String),

    /// Input coordinates are out of range
    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(String),

    /// Network failure, timeout or error status
    #[error("geocoding request failed: {0}")]
    Http(String),

    /// Geocoder replied with something unreadable
    #[error("unexpected geocoder response: {0}")]
    Malformed(String),
}

// == Traits ==
/// Source of the current list of banned counties.
#[async_trait]
pub trait BanFeed: Send + Sync {
    /// Returns normalized names of every county currently under a ban.
    async fn fetch(&self) -> Result<Vec<String>, FeedError>;
}

/// Resolves places to normalized county names.
#[async_trait]
pub trait GeoResolver: Send + Sync {
    /// Reverse geocodes a coordinate pair.
    async fn resolve_by_coordinates(&self, lat: f64, lng: f64) -> Result<String, GeoError>;

    /// Forward geocodes free text, then reverse geocodes the first match.
    async fn resolve_by_address(&self, query: &str) -> Result<String, GeoError>;
}

/// Builds the HTTP client shared by the feed and geocoders.
pub fn build_http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}
