use super::parse_duration;
use crate::error::CommandError;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// How teams are assembled once a pickup fills.
///
/// `Manual` is the captain-driven draft specified by the pick order. Other
/// modes are a deliberate extension point (see `draft::PickStrategy`) and
/// are rejected at option-set time until specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamPickMode {
    Manual,
}

/// Settings for one game inside one channel.
///
/// Immutable while a readiness check or draft is in progress; the registry
/// enforces that before calling [`set_option`](GameConfig::set_option).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Game name, unique within its channel.
    pub name: CompactString,
    /// Required player count N.
    pub size: usize,
    /// Captain count C.
    pub captains: usize,
    pub pick_mode: TeamPickMode,
    /// Pick order over lowercase letters; one letter per draftable slot.
    pub pick_order: CompactString,
    /// Readiness window. `None` skips the readiness check entirely.
    pub require_ready: Option<time::Duration>,
    /// How long a ready mark stays valid. `None` means marks never expire.
    pub ready_expire: Option<time::Duration>,
}

impl GameConfig {
    /// Create a config with a derived alternating pick order.
    pub fn new(
        name: impl Into<CompactString>,
        size: usize,
        captains: usize,
    ) -> Result<Self, CommandError> {
        let config = Self {
            name: name.into(),
            size,
            captains,
            pick_mode: TeamPickMode::Manual,
            pick_order: default_pick_order(size.saturating_sub(captains), captains),
            require_ready: None,
            ready_expire: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Number of players to be drafted (everyone who is not a captain).
    pub fn draft_slots(&self) -> usize {
        self.size - self.captains
    }

    /// Apply one option change, re-validating the whole config.
    ///
    /// The change is committed only if the resulting config validates, so a
    /// rejected value never leaves the config in a broken state. Changing
    /// `players` or `pick_captains` re-derives the default pick order when
    /// the configured one no longer fits the new slot count.
    pub fn set_option(&mut self, key: &str, value: &str) -> Result<(), CommandError> {
        let invalid = |reason: &str| CommandError::InvalidValue {
            key: key.into(),
            reason: reason.to_string(),
        };

        let mut next = self.clone();
        match key {
            "players" => {
                next.size = value.parse().map_err(|_| invalid("expected a number"))?;
                next.refit_pick_order();
            }
            "pick_captains" => {
                next.captains = value.parse().map_err(|_| invalid("expected a number"))?;
                next.refit_pick_order();
            }
            "pick_teams" => {
                next.pick_mode = match value {
                    "manual" => TeamPickMode::Manual,
                    _ => return Err(invalid("only \"manual\" is supported")),
                };
            }
            "pick_order" => {
                next.pick_order = value.into();
            }
            "require_ready" => {
                next.require_ready =
                    parse_duration(value).map_err(|e| invalid(&e.to_string()))?;
            }
            "ready_expire" => {
                next.ready_expire = parse_duration(value).map_err(|e| invalid(&e.to_string()))?;
            }
            _ => return Err(CommandError::UnknownOption(key.into())),
        }

        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Cross-field validation.
    pub fn validate(&self) -> Result<(), CommandError> {
        let invalid = |key: &str, reason: &str| CommandError::InvalidValue {
            key: key.into(),
            reason: reason.to_string(),
        };

        if self.size < 2 {
            return Err(invalid("players", "a pickup needs at least 2 players"));
        }
        if self.captains == 0 {
            return Err(invalid("pick_captains", "at least one captain is required"));
        }
        if self.captains >= self.size {
            return Err(invalid(
                "pick_captains",
                "captain count must be below the player count",
            ));
        }
        if !self.pick_order.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(invalid(
                "pick_order",
                "pick order may only contain lowercase letters",
            ));
        }
        if self.pick_order.len() != self.draft_slots() {
            return Err(invalid(
                "pick_order",
                "pick order length must equal players minus captains",
            ));
        }
        Ok(())
    }

    fn refit_pick_order(&mut self) {
        if self.pick_order.len() != self.size.saturating_sub(self.captains) {
            self.pick_order =
                default_pick_order(self.size.saturating_sub(self.captains), self.captains);
        }
    }
}

/// Strict alternation over the first `captains` letters, e.g. `"ababab"`.
fn default_pick_order(slots: usize, captains: usize) -> CompactString {
    if captains == 0 {
        return CompactString::default();
    }
    (0..slots)
        .map(|i| char::from(b'a' + (i % captains.min(26)) as u8))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pick_order() {
        let config = GameConfig::new("elim", 8, 2).unwrap();
        assert_eq!(config.pick_order, "ababab");
        assert_eq!(config.draft_slots(), 6);
    }

    #[test]
    fn test_set_option_roundtrip() {
        let mut config = GameConfig::new("elim", 8, 2).unwrap();
        config.set_option("pick_order", "abbaab").unwrap();
        assert_eq!(config.pick_order, "abbaab");

        config.set_option("require_ready", "60s").unwrap();
        assert_eq!(config.require_ready, Some(time::Duration::seconds(60)));

        config.set_option("ready_expire", "5m").unwrap();
        assert_eq!(config.ready_expire, Some(time::Duration::minutes(5)));

        config.set_option("require_ready", "off").unwrap();
        assert_eq!(config.require_ready, None);
    }

    #[test]
    fn test_resize_refits_order() {
        let mut config = GameConfig::new("elim", 8, 2).unwrap();
        config.set_option("pick_order", "abbaab").unwrap();
        config.set_option("players", "10").unwrap();
        assert_eq!(config.pick_order.len(), 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = GameConfig::new("elim", 8, 2).unwrap();
        assert!(matches!(
            config.set_option("pick_order", "ABBA"),
            Err(CommandError::InvalidValue { .. })
        ));
        assert!(matches!(
            config.set_option("pick_teams", "random"),
            Err(CommandError::InvalidValue { .. })
        ));
        assert!(matches!(
            config.set_option("coolness", "11"),
            Err(CommandError::UnknownOption(_))
        ));
        assert!(matches!(
            config.set_option("pick_captains", "8"),
            Err(CommandError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_rejects_too_small() {
        assert!(GameConfig::new("duel", 1, 1).is_err());
        assert!(GameConfig::new("elim", 4, 4).is_err());
    }
}
