//! Event type definitions.
//!
//! Events carry resolved players rather than bare ids so renderers do not
//! need to reach back into engine state mid-flush.

use crate::player::{ChannelId, Player};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Why a player dropped out of a readiness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotReadyReason {
    /// The player aborted the check or left while it was running.
    Aborted,
    /// The check deadline passed without their confirmation.
    Expired,
}

/// A named team with its members, captain first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRoster {
    pub name: CompactString,
    pub players: Vec<Player>,
}

/// Conventional team label for a team index: alpha, beta, gamma, delta,
/// then `team<n>`.
pub fn team_name(index: usize) -> CompactString {
    match index {
        0 => "alpha".into(),
        1 => "beta".into(),
        2 => "gamma".into(),
        3 => "delta".into(),
        n => compact_str::format_compact!("team{}", n + 1),
    }
}

/// One outbound intent produced by a pickup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PickupEvent {
    PlayerJoined {
        player: Player,
        count: usize,
        total: usize,
    },
    PlayerLeft {
        player: Player,
        count: usize,
        total: usize,
    },
    /// The queue reached its required size; a readiness check or draft
    /// follows in the same batch.
    QueueFull {
        match_id: u64,
    },
    ReadyCheckStarted {
        match_id: u64,
        waiting: Vec<Player>,
        deadline: OffsetDateTime,
    },
    ReadyCheckFailed {
        player: Player,
        reason: NotReadyReason,
    },
    /// A fresh join refilled a slot somebody vacated mid-cycle.
    PlayerBackfilled {
        removed: Player,
        replacement: Player,
    },
    DraftStarted {
        match_id: u64,
        captains: Vec<Player>,
        unpicked: Vec<(u32, Player)>,
    },
    TurnAdvanced {
        team: usize,
        captain: Player,
        quota: usize,
        unpicked: Vec<(u32, Player)>,
    },
    /// Somebody abandoned an in-progress draft.
    PlayerLeftDraft {
        player: Player,
    },
    /// The roster dropped below the required size and the pickup is
    /// gathering again.
    ReturnedToGathering {
        count: usize,
        total: usize,
    },
    TeamsReady {
        match_id: u64,
        teams: Vec<TeamRoster>,
    },
    MatchRecorded {
        index: usize,
        teams: Vec<TeamRoster>,
    },
}

/// A pickup event stamped with its originating channel and game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelEvent {
    pub channel: ChannelId,
    pub game: CompactString,
    pub event: PickupEvent,
}
