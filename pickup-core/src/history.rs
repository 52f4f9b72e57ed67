//! Append-only match history, queryable by recency, game and player name.

use std::collections::HashMap;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::CommandError;
use crate::events::TeamRoster;
use crate::player::ChannelId;

/// One completed draft. Never mutated after recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub game: CompactString,
    /// Final rosters, captain first in each.
    pub teams: Vec<TeamRoster>,
    #[serde(with = "time::serde::rfc3339")]
    pub finished_at: OffsetDateTime,
}

impl MatchRecord {
    fn involves(&self, name: &str) -> bool {
        self.teams
            .iter()
            .flat_map(|t| &t.players)
            .any(|p| p.name.eq_ignore_ascii_case(name))
    }
}

/// A lookup hit: the record plus its back index within the caller's view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchSummary<'a> {
    /// 0 = most recent match satisfying the query's filters.
    pub back_index: usize,
    pub record: &'a MatchRecord,
}

/// Per-channel match sequences, newest last in storage, addressed newest
/// first by queries.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MatchHistoryStore {
    channels: HashMap<ChannelId, Vec<MatchRecord>>,
}

impl MatchHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed match. The new record becomes back index 0 for
    /// its channel; every older record's back index increments.
    pub fn record(&mut self, channel: ChannelId, record: MatchRecord) {
        self.channels.entry(channel).or_default().push(record);
    }

    /// Most-recent-first query. Filters (game name, player display name,
    /// case-insensitive) apply before `back_index` counts into the view.
    pub fn lookup(
        &self,
        channel: ChannelId,
        game: Option<&str>,
        back_index: usize,
        player_name: Option<&str>,
    ) -> Result<MatchSummary<'_>, CommandError> {
        let records = self
            .channels
            .get(&channel)
            .ok_or(CommandError::MatchNotFound)?;
        records
            .iter()
            .rev()
            .filter(|r| game.is_none_or(|g| r.game.eq_ignore_ascii_case(g)))
            .filter(|r| player_name.is_none_or(|n| r.involves(n)))
            .nth(back_index)
            .map(|record| MatchSummary {
                back_index,
                record,
            })
            .ok_or(CommandError::MatchNotFound)
    }

    pub fn channel_len(&self, channel: ChannelId) -> usize {
        self.channels.get(&channel).map_or(0, Vec::len)
    }
}
