//! Command failure taxonomy.
//!
//! Every error is resolved at the point of command handling and handed back
//! to the transport collaborator as a value to render; none are fatal.

use compact_str::CompactString;
use thiserror::Error;

/// Coarse classification of a [`CommandError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or missing arguments, out-of-turn picks, unresolved references.
    Validation,
    /// The command is valid but the target is in the wrong state.
    State,
    /// A query matched nothing.
    NotFound,
}

/// Errors produced by command handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("this channel is not enabled for pickups")]
    ChannelNotEnabled,

    #[error("no game named {0} in this channel")]
    UnknownGame(CompactString),

    #[error("game {0} already exists in this channel")]
    DuplicateGame(CompactString),

    #[error("game {0} is already full")]
    GameFull(CompactString),

    #[error("settings cannot change while a match is in progress")]
    MatchInProgress,

    #[error("unknown option {0}")]
    UnknownOption(CompactString),

    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        key: CompactString,
        reason: String,
    },

    #[error("could not find an active match")]
    NoActiveDraft,

    #[error("you are not a captain")]
    NotACaptain,

    #[error("not your turn to pick")]
    NotYourTurn,

    #[error("you must specify a player to pick")]
    NoPlayerSpecified,

    #[error("specified players are not in the unpicked list")]
    UnresolvedPick,

    #[error("you are not allowed to do that")]
    NotAllowed,

    #[error("no match found")]
    MatchNotFound,
}

impl CommandError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommandError::InvalidValue { .. }
            | CommandError::UnknownOption(_)
            | CommandError::NoActiveDraft
            | CommandError::NotACaptain
            | CommandError::NotYourTurn
            | CommandError::NoPlayerSpecified
            | CommandError::UnresolvedPick
            | CommandError::NotAllowed => ErrorKind::Validation,

            CommandError::ChannelNotEnabled
            | CommandError::DuplicateGame(_)
            | CommandError::GameFull(_)
            | CommandError::MatchInProgress => ErrorKind::State,

            CommandError::UnknownGame(_) | CommandError::MatchNotFound => ErrorKind::NotFound,
        }
    }
}
