//! Identity types shared across the engine.
//!
//! Identity resolution (mapping chat mentions and nicknames to stable ids)
//! is the transport collaborator's job; the engine only sees the resolved
//! values defined here.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Chat channel identifier, assigned by the transport collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

/// Player identifier, assigned by the transport collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u64);

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A player as the engine sees one: a stable id plus the display name the
/// renderer should use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: CompactString,
}

impl Player {
    pub fn new(id: u64, name: impl Into<CompactString>) -> Self {
        Self {
            id: PlayerId(id),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
