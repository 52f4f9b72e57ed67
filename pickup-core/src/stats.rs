//! Read-only player statistics snapshot.
//!
//! Stats come from an external subsystem and only decorate player names in
//! rendered output. The engine never blocks on a refresh: readers take the
//! snapshot current at call time and a refresh in progress does not
//! invalidate it. Swaps go through a `watch` channel so interested tasks
//! can also await the next refresh.

use std::collections::HashMap;
use std::sync::Arc;

use compact_str::CompactString;
use time::OffsetDateTime;
use tokio::sync::watch;

use crate::player::PlayerId;

/// One refresh worth of per-player annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    tags: HashMap<PlayerId, CompactString>,
    pub refreshed_at: OffsetDateTime,
}

impl StatsSnapshot {
    pub fn new(
        tags: HashMap<PlayerId, CompactString>,
        refreshed_at: OffsetDateTime,
    ) -> Self {
        StatsSnapshot { tags, refreshed_at }
    }

    pub fn empty(refreshed_at: OffsetDateTime) -> Self {
        Self::new(HashMap::new(), refreshed_at)
    }

    /// The annotation to append after a player's name, if any.
    pub fn tag(&self, id: PlayerId) -> Option<&str> {
        self.tags.get(&id).map(CompactString::as_str)
    }
}

/// Produces snapshots. Implemented by the external statistics subsystem.
pub trait StatsProvider: Send + Sync {
    fn collect(&self, now: OffsetDateTime) -> StatsSnapshot;
}

/// Provider that annotates nobody.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStatsProvider;

impl StatsProvider for NullStatsProvider {
    fn collect(&self, now: OffsetDateTime) -> StatsSnapshot {
        StatsSnapshot::empty(now)
    }
}

/// Atomically swapped snapshot holder shared between the refresh task and
/// renderers.
#[derive(Debug, Clone)]
pub struct StatsCache {
    tx: Arc<watch::Sender<Arc<StatsSnapshot>>>,
}

impl StatsCache {
    pub fn new(initial: StatsSnapshot) -> Self {
        let (tx, _) = watch::channel(Arc::new(initial));
        StatsCache { tx: Arc::new(tx) }
    }

    /// Swap in a fresh snapshot and notify subscribers. The swap happens
    /// whether or not anyone is subscribed; plain `snapshot()` readers see
    /// the new value either way.
    pub fn publish(&self, snapshot: StatsSnapshot) {
        self.tx.send_replace(Arc::new(snapshot));
    }

    /// The snapshot current right now. Never blocks.
    pub fn snapshot(&self) -> Arc<StatsSnapshot> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<StatsSnapshot>> {
        self.tx.subscribe()
    }
}
