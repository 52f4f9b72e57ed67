//! Pick-order parsing.
//!
//! A pick order is a string over lowercase letters. Each maximal run of one
//! letter becomes a single turn whose quota is the run length; a letter's
//! team is fixed by first appearance, round-robin over the captain count.
//! `"abbaab"` therefore parses to alpha 1, beta 2, alpha 2, beta 1.

use itertools::Itertools;
use thiserror::Error;

/// One atomic unit of the draft: which team picks, and how many players its
/// captain may take before the turn ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Turn {
    pub team: usize,
    pub quota: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PickOrderError {
    #[error("pick order is empty")]
    Empty,
    #[error("pick order may only contain lowercase letters")]
    BadCharacter,
    #[error("pick order needs at least one team")]
    NoTeams,
}

/// Parse a pick-order string into its turn list.
///
/// The caller guarantees elsewhere that the total quota matches the number
/// of draftable players; this function only shapes the string.
pub fn parse_pick_order(order: &str, captain_count: usize) -> Result<Vec<Turn>, PickOrderError> {
    if captain_count == 0 {
        return Err(PickOrderError::NoTeams);
    }
    if order.is_empty() {
        return Err(PickOrderError::Empty);
    }
    if !order.chars().all(|c| c.is_ascii_lowercase()) {
        return Err(PickOrderError::BadCharacter);
    }

    let mut first_seen: Vec<char> = Vec::new();
    let mut turns = Vec::new();
    for (letter, run) in &order.chars().chunk_by(|&c| c) {
        let slot = match first_seen.iter().position(|&c| c == letter) {
            Some(i) => i,
            None => {
                first_seen.push(letter);
                first_seen.len() - 1
            }
        };
        turns.push(Turn {
            team: slot % captain_count,
            quota: run.count(),
        });
    }
    Ok(turns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(team: usize, quota: usize) -> Turn {
        Turn { team, quota }
    }

    #[test]
    fn test_runs_become_turns() {
        let turns = parse_pick_order("abbaab", 2).unwrap();
        assert_eq!(turns, vec![turn(0, 1), turn(1, 2), turn(0, 2), turn(1, 1)]);
    }

    #[test]
    fn test_alternation() {
        let turns = parse_pick_order("abab", 2).unwrap();
        assert_eq!(turns, vec![turn(0, 1), turn(1, 1), turn(0, 1), turn(1, 1)]);
    }

    #[test]
    fn test_quota_sum_equals_length() {
        for order in ["abbaab", "abbaabbaab", "aabb", "ab"] {
            let turns = parse_pick_order(order, 2).unwrap();
            let total: usize = turns.iter().map(|t| t.quota).sum();
            assert_eq!(total, order.len());
        }
    }

    #[test]
    fn test_extra_letters_wrap_around_teams() {
        // Three letters over two teams: c maps back onto team 0.
        let turns = parse_pick_order("abc", 2).unwrap();
        assert_eq!(turns, vec![turn(0, 1), turn(1, 1), turn(0, 1)]);
    }

    #[test]
    fn test_letter_team_is_sticky() {
        let turns = parse_pick_order("baab", 2).unwrap();
        // b was seen first, so b is team 0 everywhere.
        assert_eq!(turns, vec![turn(0, 1), turn(1, 2), turn(0, 1)]);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(parse_pick_order("", 2), Err(PickOrderError::Empty));
        assert_eq!(
            parse_pick_order("aBba", 2),
            Err(PickOrderError::BadCharacter)
        );
        assert_eq!(parse_pick_order("ab", 0), Err(PickOrderError::NoTeams));
    }
}
