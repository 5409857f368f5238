//! Burn Ban - county burn ban lookup service
//!
//! Mirrors a published bulletin of counties under a burn ban into SQLite and
//! answers lookups by county name, coordinates or address.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod rate_limit;
pub mod store;
pub mod tasks;
pub mod upstream;

#[cfg(test)]
mod testing;

pub use api::{create_router, AppState};
pub use config::Config;
pub use store::{CountyDb, CountyStore, RefreshOutcome};
pub use tasks::spawn_refresh_task;
