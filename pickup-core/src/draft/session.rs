//! The live draft: captains taking turns picking from a numbered pool.
//!
//! Pool numbers are assigned once at draft start and stay stable for the
//! whole draft, so a captain can quote a number they saw in an earlier
//! announcement. A turn ends when its captain picks, even when the pick
//! came in under quota; lost quota is made up with single-pick overflow
//! turns after the configured sequence runs out.

use std::collections::BTreeMap;

use crate::error::CommandError;
use crate::events::{TeamRoster, team_name};
use crate::player::{Player, PlayerId};

use super::order::Turn;

/// One way a captain can name a player in a pick command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickToken {
    /// A pool position from the draft announcement.
    Position(u32),
    /// A direct player reference.
    Player(PlayerId),
    /// A token the transport could not resolve. Never matches anyone, so
    /// it is skipped like any other stale reference.
    Unresolved,
}

/// What the current turn looks like from the outside.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentTurn {
    pub team: usize,
    pub captain: Player,
    pub quota: usize,
}

/// Outcome of a successful pick.
#[derive(Debug, Clone, PartialEq)]
pub struct PickResult {
    /// Players the captain actually took, in token order.
    pub picked: Vec<Player>,
    /// Set when the pick left exactly one player, who was assigned without
    /// a turn of their own: `(team, player)`.
    pub auto_assigned: Option<(usize, Player)>,
    /// The pool is empty and team rosters are final.
    pub complete: bool,
}

/// An in-progress captain draft for one filled queue.
#[derive(Debug, Clone)]
pub struct DraftSession {
    /// One roster per captain, captain first. Indexed by team.
    teams: Vec<Vec<Player>>,
    /// Remaining pool keyed by stable 1-based position.
    unpicked: BTreeMap<u32, Player>,
    turns: Vec<Turn>,
    cursor: usize,
}

impl DraftSession {
    /// Start a draft with the given captains and pool.
    ///
    /// `turns` comes from the game's pick strategy and is never empty here:
    /// a game with zero draftable slots skips the draft entirely.
    pub fn new(captains: Vec<Player>, pool: Vec<Player>, turns: Vec<Turn>) -> Self {
        let teams = captains.into_iter().map(|c| vec![c]).collect();
        let unpicked = pool
            .into_iter()
            .enumerate()
            .map(|(i, p)| (i as u32 + 1, p))
            .collect();
        DraftSession {
            teams,
            unpicked,
            turns,
            cursor: 0,
        }
    }

    pub fn captains(&self) -> impl Iterator<Item = &Player> {
        self.teams.iter().filter_map(|t| t.first())
    }

    /// Remaining pool as `(position, player)` pairs in position order.
    pub fn unpicked(&self) -> Vec<(u32, Player)> {
        self.unpicked.iter().map(|(&n, p)| (n, p.clone())).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.unpicked.is_empty()
    }

    /// Everyone involved: team members first, then the remaining pool.
    pub fn players(&self) -> Vec<Player> {
        self.teams
            .iter()
            .flatten()
            .chain(self.unpicked.values())
            .cloned()
            .collect()
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.unpicked.values().any(|p| p.id == id)
            || self.teams.iter().flatten().any(|p| p.id == id)
    }

    /// The turn waiting on a pick, or `None` once the draft is complete.
    pub fn current_turn(&self) -> Option<CurrentTurn> {
        if self.is_complete() {
            return None;
        }
        let turn = self.turn_at(self.cursor);
        let captain = self.teams.get(turn.team).and_then(|t| t.first())?;
        Some(CurrentTurn {
            team: turn.team,
            captain: captain.clone(),
            quota: turn.quota,
        })
    }

    /// Effective turn at a cursor, extending past the configured sequence
    /// with single-pick turns that keep alternating from where it left off.
    fn turn_at(&self, cursor: usize) -> Turn {
        if let Some(turn) = self.turns.get(cursor) {
            return *turn;
        }
        let last = match self.turns.last() {
            Some(t) => t.team,
            None => self.teams.len() - 1,
        };
        let offset = cursor - self.turns.len();
        Turn {
            team: (last + 1 + offset) % self.teams.len(),
            quota: 1,
        }
    }

    /// Assign the last remaining player to whichever team would pick next,
    /// without waiting for that captain. Runs after every turn and once on
    /// draft entry, so a one-slot pool never waits for a pick command.
    pub fn settle(&mut self) -> Option<(usize, Player)> {
        if self.unpicked.len() != 1 {
            return None;
        }
        let team = self.turn_at(self.cursor).team;
        let (_, player) = self.unpicked.pop_first()?;
        self.teams[team].push(player.clone());
        Some((team, player))
    }

    /// Resolve the issuer's pick. Tokens that do not match anyone left in
    /// the pool are skipped; duplicates count once; anything past the turn
    /// quota is dropped.
    pub fn pick(
        &mut self,
        issuer: PlayerId,
        tokens: &[PickToken],
    ) -> Result<PickResult, CommandError> {
        let turn = match self.current_turn() {
            Some(t) => t,
            None => return Err(CommandError::NoActiveDraft),
        };
        if !self.captains().any(|c| c.id == issuer) {
            return Err(CommandError::NotACaptain);
        }
        if turn.captain.id != issuer {
            return Err(CommandError::NotYourTurn);
        }
        if tokens.is_empty() {
            return Err(CommandError::NoPlayerSpecified);
        }

        let mut positions: Vec<u32> = Vec::new();
        for token in tokens {
            if positions.len() >= turn.quota {
                break;
            }
            let hit = match *token {
                PickToken::Position(n) => self.unpicked.contains_key(&n).then_some(n),
                PickToken::Player(id) => self
                    .unpicked
                    .iter()
                    .find(|(_, p)| p.id == id)
                    .map(|(&n, _)| n),
                PickToken::Unresolved => None,
            };
            if let Some(n) = hit {
                if !positions.contains(&n) {
                    positions.push(n);
                }
            }
        }
        if positions.is_empty() {
            return Err(CommandError::UnresolvedPick);
        }

        let mut picked = Vec::with_capacity(positions.len());
        for n in positions {
            if let Some(player) = self.unpicked.remove(&n) {
                self.teams[turn.team].push(player.clone());
                picked.push(player);
            }
        }

        // The turn is spent even when the captain took less than the quota.
        self.cursor += 1;
        let auto_assigned = self.settle();

        Ok(PickResult {
            picked,
            auto_assigned,
            complete: self.is_complete(),
        })
    }

    /// Final rosters, captain first in each.
    pub fn into_rosters(self) -> Vec<TeamRoster> {
        self.teams
            .into_iter()
            .enumerate()
            .map(|(i, players)| TeamRoster {
                name: team_name(i),
                players,
            })
            .collect()
    }

    /// Everyone still involved, for falling back to the gathering queue.
    /// Captains come first so a restarted cycle keeps them near the front.
    pub fn into_players(self) -> Vec<Player> {
        let mut players: Vec<Player> = Vec::new();
        let mut rest: Vec<Player> = Vec::new();
        for mut team in self.teams {
            if !team.is_empty() {
                players.push(team.remove(0));
            }
            rest.extend(team);
        }
        players.extend(rest);
        players.extend(self.unpicked.into_values());
        players
    }
}
