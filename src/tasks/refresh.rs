//! Periodic Bulletin Refresh
//!
//! Background task that asks the store to refresh on a fixed period, so
//! lookups rarely pay for a feed fetch themselves.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::store::{CountyStore, RefreshOutcome};

/// Spawns a task that calls [`CountyStore::update_bans`] every `interval`.
///
/// The staleness check still applies, so a tick landing inside the window
/// fetches nothing. The first tick fires immediately to warm the table.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_refresh_task(store: CountyStore, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting bulletin refresh task with interval of {} seconds",
            interval.as_secs()
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match store.update_bans().await {
                RefreshOutcome::Fresh => debug!("Scheduled refresh: data still fresh"),
                RefreshOutcome::Refreshed { banned, matched, .. } => {
                    info!("Scheduled refresh: {} banned, {} matched", banned, matched)
                }
                RefreshOutcome::Failed(reason) => warn!("Scheduled refresh failed: {}", reason),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::store::CountyDb;
    use crate::testing::StaticFeed;

    async fn store_with(feed: Arc<StaticFeed>, threshold: Duration) -> CountyStore {
        let db = CountyDb::open_in_memory().await.unwrap();
        db.seed_counties(["TRAVIS", "HAYS"]).await.unwrap();
        CountyStore::new(db, feed, threshold)
    }

    #[tokio::test]
    async fn test_refresh_task_warms_table() {
        let feed = Arc::new(StaticFeed::new(&["HAYS"]));
        let store = store_with(feed.clone(), Duration::from_secs(300)).await;

        let handle = spawn_refresh_task(store.clone(), Duration::from_secs(3600));
        tokio::time::sleep(Duration::from_millis(200)).await;

        let hays = store.db().get_county("HAYS").await.unwrap().unwrap();
        assert!(hays.burn_ban);
        assert!(hays.updated_at.is_some());
        assert_eq!(feed.fetches(), 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_refresh_task_picks_up_changes() {
        let feed = Arc::new(StaticFeed::new(&["HAYS"]));
        let store = store_with(feed.clone(), Duration::ZERO).await;

        let handle = spawn_refresh_task(store.clone(), Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(120)).await;
        feed.set_counties(&["TRAVIS"]);
        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.abort();

        let travis = store.db().get_county("TRAVIS").await.unwrap().unwrap();
        let hays = store.db().get_county("HAYS").await.unwrap().unwrap();
        assert!(travis.burn_ban);
        assert!(!hays.burn_ban);
        assert!(feed.fetches() >= 2);
    }

    #[tokio::test]
    async fn test_refresh_task_can_be_aborted() {
        let feed = Arc::new(StaticFeed::new(&[]));
        let store = store_with(feed, Duration::from_secs(300)).await;

        let handle = spawn_refresh_task(store, Duration::from_secs(1));
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
