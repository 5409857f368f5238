//! Service Statistics Module
//!
//! Tracks refresh outcomes and lookup hits and misses.

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Service Stats ==
/// Counters describing how the county store has been used.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServiceStats {
    /// Feed refreshes that completed and were written
    pub refreshes: u64,
    /// Feed refreshes that were abandoned
    pub refresh_failures: u64,
    /// Lookups that found a county
    pub hits: u64,
    /// Lookups for unknown counties
    pub misses: u64,
    /// Time of the last successful refresh
    pub last_refresh: Option<DateTime<Utc>>,
    /// Counties banned by the last successful refresh
    pub banned_counties: usize,
}

impl ServiceStats {
    // == Constructor ==
    /// Creates a new ServiceStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Recorders ==
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Records a refresh that wrote `banned` counties at `at`.
    pub fn record_refresh(&mut self, at: DateTime<Utc>, banned: usize) {
        self.refreshes += 1;
        self.last_refresh = Some(at);
        self.banned_counties = banned;
    }

    pub fn record_refresh_failure(&mut self) {
        self.refresh_failures += 1;
    }
}
