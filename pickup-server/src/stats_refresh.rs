//! Background statistics refresh.
//!
//! Collects a fresh snapshot on a fixed cadence and swaps it into the
//! shared cache. Renderers keep reading whatever snapshot is current;
//! a slow provider only delays the next swap, never a render.

use std::sync::Arc;
use std::time::Duration;

use pickup_core::stats::{StatsCache, StatsProvider};
use time::OffsetDateTime;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Spawns the refresh loop. Returns the task handle and a notify used to
/// stop it on shutdown.
pub fn spawn_stats_refresh(
    cache: StatsCache,
    provider: Arc<dyn StatsProvider>,
    interval: Duration,
) -> (JoinHandle<()>, Arc<Notify>) {
    let shutdown = Arc::new(Notify::new());
    let shutdown_task = shutdown.clone();

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let snapshot = provider.collect(OffsetDateTime::now_utc());
                    cache.publish(snapshot);
                    tracing::debug!("statistics snapshot refreshed");
                }
                _ = shutdown_task.notified() => {
                    tracing::debug!("stats refresh task shutting down");
                    break;
                }
            }
        }
    });

    (handle, shutdown)
}
