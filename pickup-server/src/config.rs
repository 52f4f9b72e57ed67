//! Configuration loading for pickup-server.
//!
//! The TOML file declares the server cadence plus every channel and game
//! the engine should know at boot. File-level types map the TOML layout
//! one to one; `ConfigLoader` converts them into validated engine configs.

use std::path::{Path, PathBuf};

use pickup_core::config::GameConfig;
use pickup_core::player::ChannelId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub channels: Vec<ChannelFileConfig>,
}

/// Server cadence and storage section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Scheduler tick interval in seconds.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
    /// Statistics cache refresh interval in seconds.
    #[serde(default = "default_stats_refresh_secs")]
    pub stats_refresh_secs: u64,
    /// Where channel setup and match history are persisted.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            tick_secs: default_tick_secs(),
            stats_refresh_secs: default_stats_refresh_secs(),
            data_file: default_data_file(),
        }
    }
}

fn default_tick_secs() -> u64 {
    2
}

fn default_stats_refresh_secs() -> u64 {
    300
}

fn default_data_file() -> PathBuf {
    PathBuf::from("./pickup-data.json")
}

/// One chat channel the engine serves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelFileConfig {
    pub id: u64,
    /// Player ids holding the admin capability in this channel.
    #[serde(default)]
    pub admins: Vec<u64>,
    #[serde(default)]
    pub games: Vec<GameFileConfig>,
}

/// One game declaration inside a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameFileConfig {
    pub name: String,
    pub players: usize,
    #[serde(default = "default_captains")]
    pub captains: usize,
    /// Pick order override; derived as strict alternation when absent.
    pub pick_order: Option<String>,
    /// Readiness window, e.g. "60s" or "2m". Absent means no check.
    pub require_ready: Option<String>,
    /// Ready mark lifetime, e.g. "5m". Absent means marks never expire.
    pub ready_expire: Option<String>,
}

fn default_captains() -> usize {
    2
}

/// A channel with its games converted to validated engine configs.
#[derive(Debug, Clone)]
pub struct LoadedChannel {
    pub id: ChannelId,
    pub admins: Vec<u64>,
    pub games: Vec<GameConfig>,
}

/// Everything `main` needs after loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub channels: Vec<LoadedChannel>,
}

impl LoadedConfig {
    pub fn is_admin(&self, channel: ChannelId, player: u64) -> bool {
        self.channels
            .iter()
            .find(|c| c.id == channel)
            .is_some_and(|c| c.admins.contains(&player))
    }
}

/// Loads and validates the configuration file.
pub struct ConfigLoader {
    config_path: PathBuf,
    tick_override: Option<u64>,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, tick_override: Option<u64>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            tick_override,
        }
    }

    /// Read the TOML file, apply CLI overrides, and convert every game
    /// declaration into a validated engine config.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&content)?;

        if let Some(tick) = self.tick_override {
            file_config.server.tick_secs = tick;
        }
        if file_config.server.tick_secs == 0 {
            return Err(ConfigError::Validation(
                "tick_secs must be at least 1".to_string(),
            ));
        }

        let mut channels = Vec::with_capacity(file_config.channels.len());
        for channel in file_config.channels {
            let mut games = Vec::with_capacity(channel.games.len());
            for game in channel.games {
                games.push(convert_game(channel.id, game)?);
            }
            channels.push(LoadedChannel {
                id: ChannelId(channel.id),
                admins: channel.admins,
                games,
            });
        }

        Ok(LoadedConfig {
            server: file_config.server,
            channels,
        })
    }
}

fn convert_game(channel: u64, game: GameFileConfig) -> Result<GameConfig, ConfigError> {
    let label = format!("channel {channel} game {}", game.name);
    let mut config = GameConfig::new(game.name.as_str(), game.players, game.captains)
        .map_err(|e| ConfigError::Validation(format!("{label}: {e}")))?;
    if let Some(order) = &game.pick_order {
        config
            .set_option("pick_order", order)
            .map_err(|e| ConfigError::Validation(format!("{label}: {e}")))?;
    }
    if let Some(ready) = &game.require_ready {
        config
            .set_option("require_ready", ready)
            .map_err(|e| ConfigError::Validation(format!("{label}: {e}")))?;
    }
    if let Some(expire) = &game.ready_expire {
        config
            .set_option("ready_expire", expire)
            .map_err(|e| ConfigError::Validation(format!("{label}: {e}")))?;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[server]
tick_secs = 1
data_file = "./state.json"

[[channels]]
id = 100
admins = [1]

[[channels.games]]
name = "elim"
players = 8
pick_order = "abbaab"
require_ready = "60s"
ready_expire = "5m"

[[channels.games]]
name = "duel"
players = 2
captains = 1
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.tick_secs, 1);
        assert_eq!(config.channels.len(), 1);
        assert_eq!(config.channels[0].games.len(), 2);
        assert_eq!(config.channels[0].games[0].captains, 2);
        assert_eq!(config.channels[0].games[1].captains, 1);
    }

    #[test]
    fn test_defaults_apply() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.tick_secs, 2);
        assert_eq!(config.server.stats_refresh_secs, 300);
        assert!(config.channels.is_empty());
    }

    #[test]
    fn test_game_conversion_validates() {
        let game = GameFileConfig {
            name: "elim".to_string(),
            players: 8,
            captains: 2,
            pick_order: Some("abba".to_string()),
            require_ready: None,
            ready_expire: None,
        };
        // Four letters cannot cover six draft slots.
        assert!(convert_game(1, game).is_err());

        let game = GameFileConfig {
            name: "elim".to_string(),
            players: 8,
            captains: 2,
            pick_order: Some("abbaab".to_string()),
            require_ready: Some("60s".to_string()),
            ready_expire: None,
        };
        let config = convert_game(1, game).unwrap();
        assert_eq!(config.pick_order, "abbaab");
        assert_eq!(config.require_ready, Some(time::Duration::seconds(60)));
    }
}
