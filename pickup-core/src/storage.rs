//! Persistence seam.
//!
//! The engine is state-first: it advances in-memory state, then hands the
//! changed data to this trait best-effort. A storage failure is logged by
//! the caller and never rolls back applied state.

use thiserror::Error;

use crate::config::GameConfig;
use crate::history::MatchRecord;
use crate::player::ChannelId;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage encoding failed: {0}")]
    Encode(String),
}

/// Durable home for channel setup and match history.
pub trait PickupStorage: Send {
    /// A channel was enabled for pickups.
    fn save_channel(&mut self, channel: ChannelId) -> Result<(), StorageError>;

    /// A game was added or its settings changed.
    fn save_game(&mut self, channel: ChannelId, config: &GameConfig) -> Result<(), StorageError>;

    /// A draft completed.
    fn append_match(
        &mut self,
        channel: ChannelId,
        record: &MatchRecord,
    ) -> Result<(), StorageError>;
}

/// Discards everything. The default for tests and ephemeral runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStorage;

impl PickupStorage for NullStorage {
    fn save_channel(&mut self, _channel: ChannelId) -> Result<(), StorageError> {
        Ok(())
    }

    fn save_game(&mut self, _channel: ChannelId, _config: &GameConfig) -> Result<(), StorageError> {
        Ok(())
    }

    fn append_match(
        &mut self,
        _channel: ChannelId,
        _record: &MatchRecord,
    ) -> Result<(), StorageError> {
        Ok(())
    }
}
