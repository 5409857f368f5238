//! Response DTOs for the burn ban API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::Utc;
use serde::Serialize;

use crate::store::{encode_timestamp, County, ServiceStats};

/// Response body for every lookup endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CountyResponse {
    /// Normalized county name
    pub name: String,
    /// Whether a burn ban is in effect
    pub burn_ban: bool,
    /// Time of the refresh that produced this status, ISO 8601
    pub updated_date: Option<String>,
}

impl From<County> for CountyResponse {
    fn from(county: County) -> Self {
        Self {
            name: county.name,
            burn_ban: county.burn_ban,
            updated_date: county.updated_at.map(encode_timestamp),
        }
    }
}

/// Response body for token issuance (POST /auth)
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
}

impl TokenResponse {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Completed feed refreshes
    pub refreshes: u64,
    /// Abandoned feed refreshes
    pub refresh_failures: u64,
    /// Lookups that found a county
    pub hits: u64,
    /// Lookups for unknown counties
    pub misses: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Counties banned by the last refresh
    pub banned_counties: usize,
    /// Time of the last refresh, ISO 8601
    pub last_refresh: Option<String>,
}

impl From<ServiceStats> for StatsResponse {
    fn from(stats: ServiceStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            refreshes: stats.refreshes,
            refresh_failures: stats.refresh_failures,
            hits: stats.hits,
            misses: stats.misses,
            banned_counties: stats.banned_counties,
            last_refresh: stats.last_refresh.map(encode_timestamp),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_county_response_from_county() {
        let at = Utc.with_ymd_and_hms(2024, 8, 1, 15, 30, 0).unwrap();
        let resp = CountyResponse::from(County {
            name: "TRAVIS".to_string(),
            burn_ban: true,
            updated_at: Some(at),
        });
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["name"], "TRAVIS");
        assert_eq!(json["burn_ban"], true);
        assert_eq!(json["updated_date"], "2024-08-01T15:30:00.000000Z");
    }

    #[test]
    fn test_county_response_never_refreshed() {
        let resp = CountyResponse::from(County {
            name: "HAYS".to_string(),
            burn_ban: false,
            updated_at: None,
        });
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json["updated_date"].is_null());
    }

    #[test]
    fn test_stats_response_hit_rate() {
        let mut stats = ServiceStats::new();
        stats.record_hit();
        stats.record_miss();
        let resp = StatsResponse::from(stats);
        assert!((resp.hit_rate - 0.5).abs() < 0.001);
        assert!(resp.last_refresh.is_none());
    }

    #[test]
    fn test_token_response_serialize() {
        let json = serde_json::to_string(&TokenResponse::new("abc")).unwrap();
        assert_eq!(json, r#"{"access_token":"abc"}"#);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}
