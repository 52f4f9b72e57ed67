//! Team-building strategy seam.
//!
//! `pick_teams` is an option so that other strategies can slot in later;
//! today only the manual captain draft exists, and it plans its turns from
//! the configured pick order.

use super::order::{PickOrderError, Turn, parse_pick_order};
use crate::config::GameConfig;

/// Plans the turn sequence for a filled queue.
pub trait PickStrategy: Send + Sync {
    fn plan(&self, config: &GameConfig) -> Result<Vec<Turn>, PickOrderError>;
}

/// Captains pick by hand following the configured pick order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualOrder;

impl PickStrategy for ManualOrder {
    fn plan(&self, config: &GameConfig) -> Result<Vec<Turn>, PickOrderError> {
        parse_pick_order(&config.pick_order, config.captains)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_plan_follows_config() {
        let mut config = GameConfig::new("duel", 6, 2).unwrap();
        config.set_option("pick_order", "abba").unwrap();
        let turns = ManualOrder.plan(&config).unwrap();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[1], Turn { team: 1, quota: 2 });
    }
}
