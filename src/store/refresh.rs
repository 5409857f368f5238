//! County Store Module
//!
//! Combines the county database with the bulletin feed. Bans are refetched
//! when the oldest row is older than the staleness window, at most one
//! refresh runs at a time, and a failed refresh leaves the old data in place.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::store::county::{normalize_county_name, now_utc, County};
use crate::store::{CountyDb, ServiceStats};
use crate::upstream::BanFeed;

/// Upper bound used when a configured window does not fit a chrono duration.
const MAX_THRESHOLD_WEEKS: i64 = 52 * 100;

// == Refresh Outcome ==
/// What a call to [`CountyStore::update_bans`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Data was inside the staleness window, nothing fetched
    Fresh,
    /// Feed fetched and the new snapshot written
    Refreshed {
        /// Counties listed in the bulletin
        banned: usize,
        /// Listed counties that exist in the store
        matched: usize,
        /// Timestamp written to every row
        at: DateTime<Utc>,
    },
    /// Refresh abandoned; cached data is still served
    Failed(String),
}

// == County Store ==
/// Shared handle to the county data. Clones share the same refresh guard.
#[derive(Clone)]
pub struct CountyStore {
    db: CountyDb,
    feed: Arc<dyn BanFeed>,
    threshold: chrono::Duration,
    refresh_guard: Arc<Mutex<()>>,
    stats: Arc<RwLock<ServiceStats>>,
}

impl CountyStore {
    // == Constructor ==
    /// Creates a store over `db` that refreshes from `feed`.
    ///
    /// # Arguments
    /// * `db` - County database handle
    /// * `feed` - Source of the banned county list
    /// * `threshold` - Age after which cached bans are refetched
    pub fn new(db: CountyDb, feed: Arc<dyn BanFeed>, threshold: Duration) -> Self {
        let threshold = chrono::Duration::from_std(threshold)
            .unwrap_or_else(|_| chrono::Duration::weeks(MAX_THRESHOLD_WEEKS));
        Self {
            db,
            feed,
            threshold,
            refresh_guard: Arc::new(Mutex::new(())),
            stats: Arc::new(RwLock::new(ServiceStats::new())),
        }
    }

    /// Underlying database handle.
    pub fn db(&self) -> &CountyDb {
        &self.db
    }

    // == Update Bans ==
    /// Refreshes from the feed if the cached data is stale.
    ///
    /// The staleness check runs under the refresh guard, so callers that
    /// queue behind an in-flight refresh see its result and return
    /// [`RefreshOutcome::Fresh`] without fetching again.
    pub async fn update_bans(&self) -> RefreshOutcome {
        let _guard = self.refresh_guard.lock().await;

        let state = match self.db.refresh_state().await {
            Ok(state) => state,
            Err(e) => {
                warn!("could not read refresh state, serving cached data: {}", e);
                self.stats.write().await.record_refresh_failure();
                return RefreshOutcome::Failed(e.to_string());
            }
        };

        let now = now_utc();
        if !state.is_stale(now, self.threshold) {
            debug!("burn bans fresh as of {:?}", state.earliest);
            return RefreshOutcome::Fresh;
        }

        debug!("burn bans stale (earliest update {:?}), refreshing", state.earliest);
        self.refresh_locked().await
    }

    // == Force Refresh ==
    /// Refreshes from the feed regardless of staleness.
    pub async fn force_refresh(&self) -> RefreshOutcome {
        let _guard = self.refresh_guard.lock().await;
        self.refresh_locked().await
    }

    /// Fetches and writes a new snapshot. Caller must hold the refresh guard.
    async fn refresh_locked(&self) -> RefreshOutcome {
        let listed = match self.feed.fetch().await {
            Ok(listed) => listed,
            Err(e) => {
                warn!("burn ban refresh skipped, serving cached data: {}", e);
                self.stats.write().await.record_refresh_failure();
                return RefreshOutcome::Failed(e.to_string());
            }
        };

        let banned: HashSet<String> = listed.iter().map(|n| normalize_county_name(n)).collect();
        let at = now_utc();

        match self.db.apply_bans(&banned, at).await {
            Ok(matched) => {
                if matched < banned.len() {
                    debug!(
                        "{} bulletin counties have no row in the store",
                        banned.len() - matched
                    );
                }
                info!("burn bans refreshed: {} listed, {} matched", banned.len(), matched);
                self.stats.write().await.record_refresh(at, matched);
                RefreshOutcome::Refreshed {
                    banned: banned.len(),
                    matched,
                    at,
                }
            }
            Err(e) => {
                warn!("writing burn bans failed, serving cached data: {}", e);
                self.stats.write().await.record_refresh_failure();
                RefreshOutcome::Failed(e.to_string())
            }
        }
    }

    // == Lookup ==
    /// Finds a county by name, normalizing it first.
    pub async fn lookup(&self, name: &str) -> Result<Option<County>, StoreError> {
        let county = self.db.get_county(&normalize_county_name(name)).await?;
        let mut stats = self.stats.write().await;
        if county.is_some() {
            stats.record_hit();
        } else {
            stats.record_miss();
        }
        Ok(county)
    }

    // == Stats ==
    /// Snapshot of the current counters.
    pub async fn stats(&self) -> ServiceStats {
        self.stats.read().await.clone()
    }
}
