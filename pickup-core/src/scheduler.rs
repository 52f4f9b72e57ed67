//! Tick-driven timer evaluation.
//!
//! The engine never times itself. An external driver calls
//! [`Scheduler::tick`] at whatever cadence it likes; each tick scans the
//! registry for readiness deadlines that have passed and fires their expiry
//! paths. Deadlines are plain data cleared on resolution, so a deadline
//! fires at most once no matter how often ticks arrive.

use time::OffsetDateTime;
use tracing::debug;

use crate::events::ChannelEvent;
use crate::registry::ChannelPickupRegistry;

#[derive(Debug, Default)]
pub struct Scheduler {
    last_tick: Option<OffsetDateTime>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate all due deadlines. Ticks that do not move time forward are
    /// ignored, which keeps replayed or reordered ticks harmless.
    pub fn tick(
        &mut self,
        now: OffsetDateTime,
        registry: &mut ChannelPickupRegistry,
    ) -> Vec<ChannelEvent> {
        if self.last_tick.is_some_and(|last| now <= last) {
            debug!(%now, "ignoring non-monotonic tick");
            return Vec::new();
        }
        self.last_tick = Some(now);
        registry.expire_due(now)
    }
}
