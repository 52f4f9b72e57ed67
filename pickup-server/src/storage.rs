//! JSON-file persistence.
//!
//! One file mirrors everything durable: enabled channels, their game
//! settings, and the match history. Every write rewrites the file through
//! a temp-then-rename so a crash mid-write never leaves a torn file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pickup_core::config::GameConfig;
use pickup_core::history::{MatchHistoryStore, MatchRecord};
use pickup_core::player::ChannelId;
use pickup_core::storage::{PickupStorage, StorageError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct PersistedChannel {
    #[serde(default)]
    games: Vec<GameConfig>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct PersistedState {
    #[serde(default)]
    channels: BTreeMap<u64, PersistedChannel>,
    #[serde(default)]
    history: MatchHistoryStore,
}

/// Keeps a full in-memory mirror and rewrites the file on every change.
/// Fine at this scale; history grows slowly and reads happen once at boot.
pub struct JsonFileStorage {
    path: PathBuf,
    state: PersistedState,
}

impl JsonFileStorage {
    /// Open the data file, or start empty when it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let state = match std::fs::read_to_string(&path) {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|e| StorageError::Encode(e.to_string()))?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => PersistedState::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(JsonFileStorage { path, state })
    }

    /// Channels and game configs for boot-time restore.
    pub fn channels(&self) -> impl Iterator<Item = (ChannelId, &[GameConfig])> {
        self.state
            .channels
            .iter()
            .map(|(&id, c)| (ChannelId(id), c.games.as_slice()))
    }

    pub fn history(&self) -> MatchHistoryStore {
        self.state.history.clone()
    }

    fn flush(&self) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(&self.state)
            .map_err(|e| StorageError::Encode(e.to_string()))?;
        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, json)?;
        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl PickupStorage for JsonFileStorage {
    fn save_channel(&mut self, channel: ChannelId) -> Result<(), StorageError> {
        self.state.channels.entry(channel.0).or_default();
        self.flush()
    }

    fn save_game(&mut self, channel: ChannelId, config: &GameConfig) -> Result<(), StorageError> {
        let entry = self.state.channels.entry(channel.0).or_default();
        match entry.games.iter_mut().find(|g| g.name == config.name) {
            Some(existing) => *existing = config.clone(),
            None => entry.games.push(config.clone()),
        }
        self.flush()
    }

    fn append_match(
        &mut self,
        channel: ChannelId,
        record: &MatchRecord,
    ) -> Result<(), StorageError> {
        self.state.history.record(channel, record.clone());
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pickup_core::events::{TeamRoster, team_name};
    use pickup_core::player::Player;
    use time::OffsetDateTime;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("pickup-storage-test-{name}-{}.json", std::process::id()))
    }

    #[test]
    fn test_roundtrip_through_the_file() {
        let path = temp_path("roundtrip");
        let _ = std::fs::remove_file(&path);

        let mut storage = JsonFileStorage::open(&path).unwrap();
        let ch = ChannelId(100);
        storage.save_channel(ch).unwrap();
        let config = GameConfig::new("elim", 8, 2).unwrap();
        storage.save_game(ch, &config).unwrap();
        let record = MatchRecord {
            game: "elim".into(),
            teams: vec![
                TeamRoster {
                    name: team_name(0),
                    players: vec![Player::new(1, "ana")],
                },
                TeamRoster {
                    name: team_name(1),
                    players: vec![Player::new(2, "bob")],
                },
            ],
            finished_at: OffsetDateTime::UNIX_EPOCH,
        };
        storage.append_match(ch, &record).unwrap();

        let reopened = JsonFileStorage::open(&path).unwrap();
        let channels: Vec<_> = reopened.channels().collect();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].0, ch);
        assert_eq!(channels[0].1[0].name, "elim");
        let history = reopened.history();
        assert_eq!(history.channel_len(ch), 1);
        assert!(history.lookup(ch, Some("elim"), 0, Some("bob")).is_ok());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_save_game_replaces_by_name() {
        let path = temp_path("replace");
        let _ = std::fs::remove_file(&path);

        let mut storage = JsonFileStorage::open(&path).unwrap();
        let ch = ChannelId(1);
        let mut config = GameConfig::new("elim", 8, 2).unwrap();
        storage.save_game(ch, &config).unwrap();
        config.set_option("players", "10").unwrap();
        storage.save_game(ch, &config).unwrap();

        let reopened = JsonFileStorage::open(&path).unwrap();
        let channels: Vec<_> = reopened.channels().collect();
        assert_eq!(channels[0].1.len(), 1);
        assert_eq!(channels[0].1[0].size, 10);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let path = temp_path("missing");
        let _ = std::fs::remove_file(&path);
        let storage = JsonFileStorage::open(&path).unwrap();
        assert_eq!(storage.channels().count(), 0);
    }
}
