//! Configuration Module
//!
//! Loads and validates server configuration from environment variables.
//! Everything is read once at startup into a single [`Config`].

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

// == Defaults ==
pub const DEFAULT_FCC_URL: &str = "https://geo.fcc.gov/api/census/area";
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_DATABASE: &str = "burnban.db";
pub const DEFAULT_PORT: u16 = 2222;
pub const DEFAULT_REFRESH_THRESHOLD: u64 = 300;
pub const DEFAULT_RATE_LIMIT: u32 = 60;
pub const DEFAULT_TOKEN_TTL: u64 = 300;
pub const DEFAULT_HTTP_TIMEOUT: u64 = 10;

/// Longest token lifetime accepted, one year.
pub const MAX_TOKEN_TTL: u64 = 365 * 24 * 60 * 60;

/// Shortest signing secret accepted for HS256 tokens.
pub const MIN_SECRET_LEN: usize = 16;

// == Config Error ==
/// Raised when the environment does not describe a usable configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Where the county table lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    File(PathBuf),
    Memory,
}

impl DatabaseLocation {
    /// Parses `DATABASE_URL`. Accepts a bare path, a `sqlite://` URL or `:memory:`.
    pub fn parse(raw: &str) -> Self {
        let path = raw.strip_prefix("sqlite://").unwrap_or(raw);
        if path == ":memory:" {
            DatabaseLocation::Memory
        } else {
            DatabaseLocation::File(PathBuf::from(path))
        }
    }

    /// Reads only `DATABASE_URL`, for commands that never touch the feed.
    pub fn from_env() -> Self {
        Self::parse(&env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE.to_string()))
    }
}

/// Token signing settings. Present only when `JWT_SECRET` is set.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// HS256 signing secret
    pub secret: String,
    /// Lifetime of issued tokens
    pub token_ttl: Duration,
}

/// Server configuration parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// XML bulletin listing counties under a burn ban
    pub feed_url: String,
    /// Reverse geocoder (coordinates to county)
    pub fcc_url: String,
    /// Forward geocoder (address to coordinates)
    pub nominatim_url: String,
    /// SQLite database location
    pub database: DatabaseLocation,
    /// HTTP server port
    pub server_port: u16,
    /// Age after which cached bans are refetched
    pub refresh_threshold: Duration,
    /// Background refresh period, None when disabled
    pub refresh_interval: Option<Duration>,
    /// Requests per minute per client IP, 0 disables limiting
    pub rate_limit_per_minute: u32,
    /// Key the rate limit on the first `X-Forwarded-For` hop
    pub trust_forwarded_for: bool,
    /// Bearer token settings, None leaves lookups open
    pub auth: Option<AuthSettings>,
    /// Timeout applied to every outbound request
    pub http_timeout: Duration,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `BURNBAN_URL` - burn ban bulletin URL (required)
    /// - `FCC_URL` - reverse geocoder URL
    /// - `NOMINATIM_URL` - forward geocoder URL
    /// - `DATABASE_URL` - SQLite path (default: burnban.db)
    /// - `PORT` - HTTP server port (default: 2222)
    /// - `REFRESH_THRESHOLD_SECS` - staleness window (default: 300)
    /// - `REFRESH_INTERVAL_SECS` - background refresh period (default: 0, off)
    /// - `RATE_LIMIT_PER_MINUTE` - per-IP limit (default: 60, 0 = off)
    /// - `TRUST_FORWARDED_FOR` - limit on `X-Forwarded-For` instead of the peer (default: false)
    /// - `JWT_SECRET` - token signing secret (unset = no auth)
    /// - `JWT_EXPIRATION_SECS` - token lifetime (default: 300)
    /// - `HTTP_TIMEOUT_SECS` - outbound timeout (default: 10)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a Config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let feed_url = get("BURNBAN_URL").ok_or(ConfigError::Missing("BURNBAN_URL"))?;
        let feed_url = parse_url("BURNBAN_URL", feed_url)?;
        let fcc_url = parse_url(
            "FCC_URL",
            get("FCC_URL").unwrap_or_else(|| DEFAULT_FCC_URL.to_string()),
        )?;
        let nominatim_url = parse_url(
            "NOMINATIM_URL",
            get("NOMINATIM_URL").unwrap_or_else(|| DEFAULT_NOMINATIM_URL.to_string()),
        )?;

        let database = DatabaseLocation::parse(
            &get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
        );

        let server_port = parse_num("PORT", get("PORT"), DEFAULT_PORT)?;

        let threshold: u64 = parse_num(
            "REFRESH_THRESHOLD_SECS",
            get("REFRESH_THRESHOLD_SECS"),
            DEFAULT_REFRESH_THRESHOLD,
        )?;
        if threshold == 0 {
            return Err(invalid("REFRESH_THRESHOLD_SECS", "0", "must be positive"));
        }

        let interval: u64 = parse_num("REFRESH_INTERVAL_SECS", get("REFRESH_INTERVAL_SECS"), 0)?;

        let rate_limit_per_minute = parse_num(
            "RATE_LIMIT_PER_MINUTE",
            get("RATE_LIMIT_PER_MINUTE"),
            DEFAULT_RATE_LIMIT,
        )?;
        let trust_forwarded_for = parse_bool("TRUST_FORWARDED_FOR", get("TRUST_FORWARDED_FOR"))?;

        let token_ttl: u64 = parse_num(
            "JWT_EXPIRATION_SECS",
            get("JWT_EXPIRATION_SECS"),
            DEFAULT_TOKEN_TTL,
        )?;
        if token_ttl == 0 {
            return Err(invalid("JWT_EXPIRATION_SECS", "0", "must be positive"));
        }
        if token_ttl > MAX_TOKEN_TTL {
            return Err(invalid(
                "JWT_EXPIRATION_SECS",
                &token_ttl.to_string(),
                &format!("must be at most {} seconds", MAX_TOKEN_TTL),
            ));
        }

        let auth = match get("JWT_SECRET") {
            Some(secret) if secret.len() < MIN_SECRET_LEN => {
                return Err(invalid(
                    "JWT_SECRET",
                    "<redacted>",
                    &format!("must be at least {} bytes", MIN_SECRET_LEN),
                ));
            }
            Some(secret) => Some(AuthSettings {
                secret,
                token_ttl: Duration::from_secs(token_ttl),
            }),
            None => None,
        };

        let timeout: u64 = parse_num("HTTP_TIMEOUT_SECS", get("HTTP_TIMEOUT_SECS"), DEFAULT_HTTP_TIMEOUT)?;
        if timeout == 0 {
            return Err(invalid("HTTP_TIMEOUT_SECS", "0", "must be positive"));
        }

        Ok(Self {
            feed_url,
            fcc_url,
            nominatim_url,
            database,
            server_port,
            refresh_threshold: Duration::from_secs(threshold),
            refresh_interval: (interval > 0).then(|| Duration::from_secs(interval)),
            rate_limit_per_minute,
            trust_forwarded_for,
            auth,
            http_timeout: Duration::from_secs(timeout),
        })
    }
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_num<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|e: T::Err| invalid(var, &v, &e.to_string())),
    }
}

fn parse_bool(var: &'static str, raw: Option<String>) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(var, &raw, "expected true or false")),
    }
}

fn parse_url(var: &'static str, raw: String) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Err(invalid(var, trimmed, "expected an http(s) URL"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config =
            Config::from_lookup(lookup(&[("BURNBAN_URL", "https://feed.example/bans.xml")])).unwrap();
        assert_eq!(config.feed_url, "https://feed.example/bans.xml");
        assert_eq!(config.fcc_url, DEFAULT_FCC_URL);
        assert_eq!(config.nominatim_url, DEFAULT_NOMINATIM_URL);
        assert_eq!(config.database, DatabaseLocation::File(PathBuf::from("burnban.db")));
        assert_eq!(config.server_port, 2222);
        assert_eq!(config.refresh_threshold, Duration::from_secs(300));
        assert!(config.refresh_interval.is_none());
        assert_eq!(config.rate_limit_per_minute, 60);
        assert!(!config.trust_forwarded_for);
        assert!(config.auth.is_none());
        assert_eq!(config.http_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_config_requires_feed_url() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("BURNBAN_URL"));
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("BURNBAN_URL", "http://localhost:9000/feed"),
            ("DATABASE_URL", "sqlite://:memory:"),
            ("PORT", "8080"),
            ("REFRESH_THRESHOLD_SECS", "1"),
            ("REFRESH_INTERVAL_SECS", "60"),
            ("RATE_LIMIT_PER_MINUTE", "10"),
            ("TRUST_FORWARDED_FOR", "true"),
            ("JWT_SECRET", "0123456789abcdef0123"),
            ("JWT_EXPIRATION_SECS", "900"),
        ]))
        .unwrap();

        assert_eq!(config.database, DatabaseLocation::Memory);
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.refresh_threshold, Duration::from_secs(1));
        assert_eq!(config.refresh_interval, Some(Duration::from_secs(60)));
        assert_eq!(config.rate_limit_per_minute, 10);
        assert!(config.trust_forwarded_for);
        let auth = config.auth.unwrap();
        assert_eq!(auth.token_ttl, Duration::from_secs(900));
    }

    #[test]
    fn test_config_rejects_bad_numbers() {
        let err = Config::from_lookup(lookup(&[
            ("BURNBAN_URL", "https://feed.example"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "PORT", .. }));

        let err = Config::from_lookup(lookup(&[
            ("BURNBAN_URL", "https://feed.example"),
            ("REFRESH_THRESHOLD_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "REFRESH_THRESHOLD_SECS", .. }));
    }

    #[test]
    fn test_config_bounds_token_ttl() {
        let err = Config::from_lookup(lookup(&[
            ("BURNBAN_URL", "https://feed.example"),
            ("JWT_EXPIRATION_SECS", "18446744073709551615"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "JWT_EXPIRATION_SECS", .. }));

        let one_past = (MAX_TOKEN_TTL + 1).to_string();
        let err = Config::from_lookup(lookup(&[
            ("BURNBAN_URL", "https://feed.example"),
            ("JWT_EXPIRATION_SECS", one_past.as_str()),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "JWT_EXPIRATION_SECS", .. }));

        let max = MAX_TOKEN_TTL.to_string();
        let config = Config::from_lookup(lookup(&[
            ("BURNBAN_URL", "https://feed.example"),
            ("JWT_SECRET", "0123456789abcdef0123"),
            ("JWT_EXPIRATION_SECS", max.as_str()),
        ]))
        .unwrap();
        assert_eq!(config.auth.unwrap().token_ttl, Duration::from_secs(MAX_TOKEN_TTL));
    }

    #[test]
    fn test_config_rejects_bad_bool() {
        let err = Config::from_lookup(lookup(&[
            ("BURNBAN_URL", "https://feed.example"),
            ("TRUST_FORWARDED_FOR", "maybe"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "TRUST_FORWARDED_FOR", .. }));
    }

    #[test]
    fn test_config_rejects_short_secret() {
        let err = Config::from_lookup(lookup(&[
            ("BURNBAN_URL", "https://feed.example"),
            ("JWT_SECRET", "short"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "JWT_SECRET", .. }));
    }

    #[test]
    fn test_config_rejects_non_http_url() {
        let err = Config::from_lookup(lookup(&[("BURNBAN_URL", "ftp://feed.example")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "BURNBAN_URL", .. }));
    }

    #[test]
    fn test_database_location_parse() {
        assert_eq!(DatabaseLocation::parse(":memory:"), DatabaseLocation::Memory);
        assert_eq!(
            DatabaseLocation::parse("sqlite:///var/lib/burnban.db"),
            DatabaseLocation::File(PathBuf::from("/var/lib/burnban.db"))
        );
    }
}
