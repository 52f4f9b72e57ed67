//! The per-channel, per-game pickup state machine.
//!
//! One `Pickup` cycles forever through gathering, an optional readiness
//! check, and a captain draft. Every mutation returns the events it
//! produced plus, when a draft finished, the match record; the caller
//! owns delivery and persistence.

pub mod ready;

use std::collections::{HashSet, VecDeque};
use std::mem;

use rand::Rng;
use time::OffsetDateTime;
use tracing::info;

use crate::config::GameConfig;
use crate::draft::{DraftSession, ManualOrder, PickStrategy, PickToken};
use crate::error::CommandError;
use crate::events::{NotReadyReason, PickupEvent};
use crate::history::MatchRecord;
use crate::player::{Player, PlayerId};

use ready::{ReadinessCheck, ReadyMarks};

/// A readiness reaction, as resolved by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyReaction {
    Confirm,
    Abort,
}

/// Everything one mutation produced.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PickupOutput {
    pub events: Vec<PickupEvent>,
    /// Present when this mutation completed a draft.
    pub record: Option<MatchRecord>,
}

#[derive(Debug, Clone)]
enum Phase {
    Gathering,
    ReadyCheck(ReadinessCheck),
    Drafting { match_id: u64, session: DraftSession },
}

/// One channel+game queue/draft/match cycle.
#[derive(Debug, Clone)]
pub struct Pickup {
    config: GameConfig,
    /// Joined players in join order. Empties into the draft session when a
    /// draft starts.
    queue: Vec<Player>,
    marks: ReadyMarks,
    /// Players who dropped out mid-cycle; fresh joins refill their slots.
    vacated: VecDeque<Player>,
    phase: Phase,
}

impl Pickup {
    pub fn new(config: GameConfig) -> Self {
        Pickup {
            config,
            queue: Vec::new(),
            marks: ReadyMarks::default(),
            vacated: VecDeque::new(),
            phase: Phase::Gathering,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn is_gathering(&self) -> bool {
        matches!(self.phase, Phase::Gathering)
    }

    pub fn phase_name(&self) -> &'static str {
        match self.phase {
            Phase::Gathering => "gathering",
            Phase::ReadyCheck(_) => "ready_check",
            Phase::Drafting { .. } => "drafting",
        }
    }

    /// Readiness deadline awaiting the scheduler, if any.
    pub fn deadline(&self) -> Option<OffsetDateTime> {
        match &self.phase {
            Phase::ReadyCheck(check) => Some(check.deadline()),
            _ => None,
        }
    }

    /// Everyone currently involved, whatever the phase.
    pub fn roster(&self) -> Vec<Player> {
        match &self.phase {
            Phase::Gathering | Phase::ReadyCheck(_) => self.queue.clone(),
            Phase::Drafting { session, .. } => session.players(),
        }
    }

    pub fn player_count(&self) -> usize {
        match &self.phase {
            Phase::Gathering | Phase::ReadyCheck(_) => self.queue.len(),
            Phase::Drafting { session, .. } => session.players().len(),
        }
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        match &self.phase {
            Phase::Gathering | Phase::ReadyCheck(_) => self.queue.iter().any(|p| p.id == id),
            Phase::Drafting { session, .. } => session.contains(id),
        }
    }

    /// Change one setting. Only permitted while gathering, and never in a
    /// way that strands already-joined players above the new size.
    pub fn set_option(&mut self, key: &str, value: &str) -> Result<(), CommandError> {
        if !self.is_gathering() {
            return Err(CommandError::MatchInProgress);
        }
        let previous = self.config.clone();
        self.config.set_option(key, value)?;
        if self.queue.len() > self.config.size {
            self.config = previous;
            return Err(CommandError::InvalidValue {
                key: key.into(),
                reason: "more players are already queued".to_string(),
            });
        }
        Ok(())
    }

    /// Add a player to the queue. Re-joining is a no-op; joining a pickup
    /// whose match is underway is refused.
    pub fn join(
        &mut self,
        player: Player,
        now: OffsetDateTime,
        rng: &mut impl Rng,
        match_seq: &mut u64,
    ) -> Result<PickupOutput, CommandError> {
        if self.contains(player.id) {
            return Ok(PickupOutput::default());
        }
        if !self.is_gathering() {
            return Err(CommandError::GameFull(self.config.name.clone()));
        }

        let mut out = PickupOutput::default();
        self.queue.push(player.clone());
        out.events.push(PickupEvent::PlayerJoined {
            player: player.clone(),
            count: self.queue.len(),
            total: self.config.size,
        });
        if let Some(removed) = self.vacated.pop_front() {
            out.events.push(PickupEvent::PlayerBackfilled {
                removed,
                replacement: player,
            });
        }
        self.fill_if_ready(now, rng, match_seq, &mut out)?;
        Ok(out)
    }

    /// Start the next cycle if the queue is at size. Called from `join` and
    /// after a `players` option change shrank the size to the queue.
    pub fn fill_if_ready(
        &mut self,
        now: OffsetDateTime,
        rng: &mut impl Rng,
        match_seq: &mut u64,
        out: &mut PickupOutput,
    ) -> Result<(), CommandError> {
        if !self.is_gathering() || self.queue.len() < self.config.size {
            return Ok(());
        }

        *match_seq += 1;
        let match_id = *match_seq;
        out.events.push(PickupEvent::QueueFull { match_id });
        info!(game = %self.config.name, match_id, "queue full");

        if let Some(window) = self.config.require_ready {
            let check = ReadinessCheck::new(
                match_id,
                &self.queue,
                &self.marks,
                self.config.ready_expire,
                now,
                window,
            );
            if !check.is_satisfied() {
                out.events.push(PickupEvent::ReadyCheckStarted {
                    match_id,
                    waiting: self.waiting_players(&check),
                    deadline: check.deadline(),
                });
                self.phase = Phase::ReadyCheck(check);
                return Ok(());
            }
            // Everyone holds a fresh mark; skip straight to the draft.
        }
        self.start_draft(match_id, now, rng, out)
    }

    fn waiting_players(&self, check: &ReadinessCheck) -> Vec<Player> {
        self.queue
            .iter()
            .filter(|p| check.waiting().contains(&p.id))
            .cloned()
            .collect()
    }

    /// Sample captains, hand the rest to a draft session, and announce the
    /// first turn. A one-slot pool settles before any pick is asked for.
    fn start_draft(
        &mut self,
        match_id: u64,
        now: OffsetDateTime,
        rng: &mut impl Rng,
        out: &mut PickupOutput,
    ) -> Result<(), CommandError> {
        let queue = mem::take(&mut self.queue);
        let picked = rand::seq::index::sample(rng, queue.len(), self.config.captains);
        let chosen: HashSet<usize> = picked.iter().collect();
        let captains: Vec<Player> = picked.iter().map(|i| queue[i].clone()).collect();
        let pool: Vec<Player> = queue
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !chosen.contains(i))
            .map(|(_, p)| p)
            .collect();

        let turns = ManualOrder
            .plan(&self.config)
            .map_err(|e| CommandError::InvalidValue {
                key: "pick_order".into(),
                reason: e.to_string(),
            })?;

        let mut session = DraftSession::new(captains.clone(), pool, turns);
        out.events.push(PickupEvent::DraftStarted {
            match_id,
            captains,
            unpicked: session.unpicked(),
        });
        info!(game = %self.config.name, match_id, "draft started");

        session.settle();
        match session.current_turn() {
            Some(turn) => {
                out.events.push(PickupEvent::TurnAdvanced {
                    team: turn.team,
                    captain: turn.captain,
                    quota: turn.quota,
                    unpicked: session.unpicked(),
                });
                self.phase = Phase::Drafting { match_id, session };
            }
            None => self.finish(match_id, session, now, out),
        }
        Ok(())
    }

    /// Seal the rosters, emit the result, and reset for the next cycle.
    fn finish(
        &mut self,
        match_id: u64,
        session: DraftSession,
        now: OffsetDateTime,
        out: &mut PickupOutput,
    ) {
        let teams = session.into_rosters();
        out.events.push(PickupEvent::TeamsReady {
            match_id,
            teams: teams.clone(),
        });
        out.record = Some(MatchRecord {
            game: self.config.name.clone(),
            teams,
            finished_at: now,
        });
        self.phase = Phase::Gathering;
        self.vacated.clear();
        info!(game = %self.config.name, match_id, "draft complete");
    }

    /// Route a captain's pick into the live draft.
    pub fn pick(
        &mut self,
        issuer: PlayerId,
        tokens: &[PickToken],
        now: OffsetDateTime,
    ) -> Result<PickupOutput, CommandError> {
        let (match_id, mut session) = match mem::replace(&mut self.phase, Phase::Gathering) {
            Phase::Drafting { match_id, session } => (match_id, session),
            other => {
                self.phase = other;
                return Err(CommandError::NoActiveDraft);
            }
        };

        let result = match session.pick(issuer, tokens) {
            Ok(r) => r,
            Err(e) => {
                self.phase = Phase::Drafting { match_id, session };
                return Err(e);
            }
        };

        let mut out = PickupOutput::default();
        if result.complete {
            self.finish(match_id, session, now, &mut out);
        } else if let Some(turn) = session.current_turn() {
            out.events.push(PickupEvent::TurnAdvanced {
                team: turn.team,
                captain: turn.captain,
                quota: turn.quota,
                unpicked: session.unpicked(),
            });
            self.phase = Phase::Drafting { match_id, session };
        }
        Ok(out)
    }

    /// Handle a readiness reaction. Reactions outside a check, or from
    /// non-members, are ignored rather than errors: reactions race state
    /// transitions by nature.
    pub fn ready_react(
        &mut self,
        id: PlayerId,
        reaction: ReadyReaction,
        now: OffsetDateTime,
        rng: &mut impl Rng,
    ) -> Result<PickupOutput, CommandError> {
        if !matches!(self.phase, Phase::ReadyCheck(_)) || !self.contains(id) {
            return Ok(PickupOutput::default());
        }
        match reaction {
            ReadyReaction::Confirm => {
                let satisfied = match &mut self.phase {
                    Phase::ReadyCheck(check) => {
                        self.marks.confirm(id, now);
                        check.confirm(id);
                        check.is_satisfied().then(|| check.match_id())
                    }
                    _ => None,
                };
                let mut out = PickupOutput::default();
                if let Some(match_id) = satisfied {
                    self.phase = Phase::Gathering;
                    self.start_draft(match_id, now, rng, &mut out)?;
                }
                Ok(out)
            }
            ReadyReaction::Abort => {
                let mut out = PickupOutput::default();
                self.fail_ready_check(Some(id), NotReadyReason::Aborted, &mut out);
                Ok(out)
            }
        }
    }

    /// Fail the current readiness check: everyone still waiting (plus the
    /// aborter, when there is one) is dropped from the roster and must
    /// rejoin; confirmed players keep their marks and their slots.
    fn fail_ready_check(
        &mut self,
        aborter: Option<PlayerId>,
        reason: NotReadyReason,
        out: &mut PickupOutput,
    ) {
        let check = match mem::replace(&mut self.phase, Phase::Gathering) {
            Phase::ReadyCheck(check) => check,
            other => {
                self.phase = other;
                return;
            }
        };

        let mut dropped: Vec<PlayerId> = check.waiting().to_vec();
        if let Some(id) = aborter {
            if !dropped.contains(&id) {
                dropped.push(id);
            }
        }
        for &id in &dropped {
            if let Some(pos) = self.queue.iter().position(|p| p.id == id) {
                let player = self.queue.remove(pos);
                self.marks.invalidate(id);
                self.vacated.push_back(player.clone());
                out.events.push(PickupEvent::ReadyCheckFailed { player, reason });
            }
        }
        out.events.push(PickupEvent::ReturnedToGathering {
            count: self.queue.len(),
            total: self.config.size,
        });
        info!(
            game = %self.config.name,
            match_id = check.match_id(),
            removed = dropped.len(),
            "readiness check failed"
        );
    }

    /// Remove a player wherever they are. Leaving mid-cycle aborts the
    /// check or draft back to gathering; leaving a queue you are not in
    /// does nothing.
    pub fn leave(&mut self, id: PlayerId, _now: OffsetDateTime) -> PickupOutput {
        let mut out = PickupOutput::default();
        if !self.contains(id) {
            return out;
        }
        match mem::replace(&mut self.phase, Phase::Gathering) {
            Phase::Gathering => {
                if let Some(pos) = self.queue.iter().position(|p| p.id == id) {
                    let player = self.queue.remove(pos);
                    self.marks.invalidate(id);
                    out.events.push(PickupEvent::PlayerLeft {
                        player,
                        count: self.queue.len(),
                        total: self.config.size,
                    });
                }
            }
            Phase::ReadyCheck(check) => {
                if let Some(pos) = self.queue.iter().position(|p| p.id == id) {
                    let player = self.queue.remove(pos);
                    self.marks.invalidate(id);
                    self.vacated.push_back(player.clone());
                    out.events.push(PickupEvent::ReadyCheckFailed {
                        player,
                        reason: NotReadyReason::Aborted,
                    });
                    out.events.push(PickupEvent::ReturnedToGathering {
                        count: self.queue.len(),
                        total: self.config.size,
                    });
                    info!(
                        game = %self.config.name,
                        match_id = check.match_id(),
                        "player left during readiness check"
                    );
                }
            }
            Phase::Drafting { session, .. } => {
                let mut players = session.into_players();
                if let Some(pos) = players.iter().position(|p| p.id == id) {
                    let player = players.remove(pos);
                    self.marks.invalidate(id);
                    self.vacated.push_back(player.clone());
                    out.events.push(PickupEvent::PlayerLeftDraft { player });
                }
                self.queue = players;
                out.events.push(PickupEvent::ReturnedToGathering {
                    count: self.queue.len(),
                    total: self.config.size,
                });
            }
        }
        out
    }

    /// Scheduler entry point: fire the expiry path once if the readiness
    /// deadline has passed.
    pub fn expire(&mut self, now: OffsetDateTime) -> Option<PickupOutput> {
        match &self.phase {
            Phase::ReadyCheck(check) if check.is_expired(now) => {
                let mut out = PickupOutput::default();
                self.fail_ready_check(None, NotReadyReason::Expired, &mut out);
                Some(out)
            }
            _ => None,
        }
    }
}
