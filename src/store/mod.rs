//! Store Module
//!
//! Persisted county burn ban data and the stale-checked refresh around it.

mod county;
mod db;
mod migrations;
mod refresh;
mod stats;


// Re-export public types
pub use county::{decode_timestamp, encode_timestamp, normalize_county_name, now_utc, County, RefreshState};
pub use db::CountyDb;
pub use refresh::{CountyStore, RefreshOutcome};
pub use stats::ServiceStats;
