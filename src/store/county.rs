//! County Record Module
//!
//! Defines a county row, name normalization and the timestamp encoding
//! used by the database.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::error::StoreError;

// == County ==
/// A county and its current burn ban status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct County {
    /// Normalized county name
    pub name: String,
    /// Whether outdoor burning is currently prohibited
    pub burn_ban: bool,
    /// Time of the refresh that last wrote this row, None if never refreshed
    pub updated_at: Option<DateTime<Utc>>,
}

// == Refresh State ==
/// Earliest `updated_at` across all counties.
///
/// `earliest` is None when any row has never been refreshed or the table is
/// empty, which always counts as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshState {
    pub earliest: Option<DateTime<Utc>>,
}

impl RefreshState {
    // == Is Stale ==
    /// Checks whether the data needs a refresh at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, threshold: chrono::Duration) -> bool {
        match self.earliest {
            Some(at) => match now.checked_sub_signed(threshold) {
                Some(cutoff) => at < cutoff,
                None => false,
            },
            None => true,
        }
    }
}

// == Name Normalization ==
/// Canonical form of a county name: trimmed, uppercase, no trailing "COUNTY".
///
/// Every path into the store goes through this, so "Travis", " travis " and
/// "Travis County" all resolve to `TRAVIS`.
pub fn normalize_county_name(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    let mut name = upper.split_whitespace().collect::<Vec<_>>().join(" ");
    while let Some(stripped) = name.strip_suffix(" COUNTY") {
        let len = stripped.len();
        name.truncate(len);
    }
    name
}

// == Timestamp Encoding ==
/// Encodes a timestamp for storage.
///
/// Fixed width with a `Z` suffix so lexical order matches time order,
/// which lets SQL `MIN` work directly on the text column.
pub fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Decodes a stored timestamp.
pub fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::Timestamp(raw.to_string()))
}

/// Returns the current time truncated to the stored precision.
pub fn now_utc() -> DateTime<Utc> {
    let now = Utc::now();
    // Round-trips through storage unchanged
    decode_timestamp(&encode_timestamp(now)).unwrap_or(now)
}
