//! The structured command surface.
//!
//! The transport collaborator parses raw text and identity; the engine only
//! accepts these resolved values. Every command is validated and answered at
//! the point of handling.

use compact_str::CompactString;
use time::OffsetDateTime;

use crate::draft::PickToken;
use crate::events::ChannelEvent;
use crate::history::MatchRecord;
use crate::pickup::ReadyReaction;
use crate::player::{ChannelId, Player};

/// One inbound command, already parsed and identity-resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Join {
        game: CompactString,
    },
    Leave {
        game: CompactString,
    },
    /// Targets whichever draft in the channel the issuer belongs to.
    Pick {
        tokens: Vec<PickToken>,
    },
    ReadyReact {
        reaction: ReadyReaction,
    },
    Enable,
    AddGame {
        name: CompactString,
        size: usize,
        captains: usize,
    },
    SetOption {
        game: CompactString,
        key: CompactString,
        value: CompactString,
    },
    Who,
    Last {
        game: Option<CompactString>,
        back_index: usize,
        player_name: Option<CompactString>,
    },
}

impl Command {
    /// Commands gated behind the single admin capability bit.
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Command::Enable | Command::AddGame { .. } | Command::SetOption { .. }
        )
    }
}

/// Who issued the command, where, and when.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub channel: ChannelId,
    pub issuer: Player,
    /// The one capability check the engine performs.
    pub is_admin: bool,
    pub now: OffsetDateTime,
}

/// Fill state of one game, for roster queries.
#[derive(Debug, Clone, PartialEq)]
pub struct GameStatus {
    pub game: CompactString,
    pub phase: &'static str,
    pub count: usize,
    pub total: usize,
    pub players: Vec<Player>,
}

/// An owned history hit.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchView {
    pub back_index: usize,
    pub record: MatchRecord,
}

/// Direct answer to a query command, distinct from broadcast events.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandReply {
    None,
    Who(Vec<GameStatus>),
    Last(MatchView),
}

/// Everything one handled command produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub events: Vec<ChannelEvent>,
    pub reply: CommandReply,
}

impl CommandOutcome {
    pub fn events(events: Vec<ChannelEvent>) -> Self {
        CommandOutcome {
            events,
            reply: CommandReply::None,
        }
    }

    pub fn reply(reply: CommandReply) -> Self {
        CommandOutcome {
            events: Vec::new(),
            reply,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_gate_covers_setup_commands() {
        assert!(Command::Enable.requires_admin());
        assert!(
            Command::AddGame {
                name: "elim".into(),
                size: 8,
                captains: 2
            }
            .requires_admin()
        );
        assert!(!Command::Join { game: "elim".into() }.requires_admin());
        assert!(!Command::Who.requires_admin());
    }
}
