//! Readiness marks and the per-fill readiness check.
//!
//! Marks outlive any single check: confirming once keeps a player exempt
//! from later checks until the mark goes stale (`ready_expire`) or the
//! player drops out. A check instance only tracks who still owes a
//! confirmation for the current fill and when that window closes.

use std::collections::HashMap;

use time::{Duration, OffsetDateTime};

use crate::player::{Player, PlayerId};

/// Player -> time of last readiness confirmation.
#[derive(Debug, Default, Clone)]
pub struct ReadyMarks {
    marks: HashMap<PlayerId, OffsetDateTime>,
}

impl ReadyMarks {
    pub fn confirm(&mut self, id: PlayerId, now: OffsetDateTime) {
        self.marks.insert(id, now);
    }

    pub fn invalidate(&mut self, id: PlayerId) {
        self.marks.remove(&id);
    }

    /// Whether a mark still counts. With no expiry configured, any mark
    /// counts until explicitly invalidated.
    pub fn is_fresh(
        &self,
        id: PlayerId,
        now: OffsetDateTime,
        expire: Option<Duration>,
    ) -> bool {
        match self.marks.get(&id) {
            Some(at) => expire.is_none_or(|window| now - *at <= window),
            None => false,
        }
    }
}

/// One confirmation gate between a full queue and its draft.
#[derive(Debug, Clone)]
pub struct ReadinessCheck {
    match_id: u64,
    /// Players still owing a confirmation, in join order.
    waiting: Vec<PlayerId>,
    deadline: OffsetDateTime,
}

impl ReadinessCheck {
    /// Build a check for a full roster. Players with a fresh mark are
    /// exempt from the start; a typical backfill therefore only waits on
    /// the replacement.
    pub fn new(
        match_id: u64,
        roster: &[Player],
        marks: &ReadyMarks,
        expire: Option<Duration>,
        now: OffsetDateTime,
        window: Duration,
    ) -> Self {
        let waiting = roster
            .iter()
            .filter(|p| !marks.is_fresh(p.id, now, expire))
            .map(|p| p.id)
            .collect();
        ReadinessCheck {
            match_id,
            waiting,
            deadline: now + window,
        }
    }

    pub fn match_id(&self) -> u64 {
        self.match_id
    }

    pub fn deadline(&self) -> OffsetDateTime {
        self.deadline
    }

    pub fn waiting(&self) -> &[PlayerId] {
        &self.waiting
    }

    /// All confirmations are in.
    pub fn is_satisfied(&self) -> bool {
        self.waiting.is_empty()
    }

    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        !self.is_satisfied() && self.deadline <= now
    }

    /// Clear one player's outstanding confirmation.
    pub fn confirm(&mut self, id: PlayerId) {
        self.waiting.retain(|&w| w != id);
    }
}
