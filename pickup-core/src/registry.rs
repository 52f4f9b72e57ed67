//! Ownership and lookup of every pickup, and the command entry point.
//!
//! The registry owns all `Pickup` instances keyed by (channel, game name),
//! the match history, the RNG used for captain sampling, and the storage
//! handle. All inbound commands funnel through [`handle`]
//! (ChannelPickupRegistry::handle); scheduler ticks funnel through
//! [`expire_due`](ChannelPickupRegistry::expire_due).

use std::collections::HashMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use time::OffsetDateTime;
use tracing::warn;

use crate::command::{
    Command, CommandContext, CommandOutcome, CommandReply, GameStatus, MatchView,
};
use crate::config::GameConfig;
use crate::draft::PickToken;
use crate::error::CommandError;
use crate::events::{ChannelEvent, PickupEvent};
use crate::history::MatchHistoryStore;
use crate::pickup::{Pickup, PickupOutput};
use crate::player::ChannelId;
use crate::storage::PickupStorage;

/// All pickups in one enabled channel, in creation order.
#[derive(Debug, Default)]
struct Channel {
    games: Vec<Pickup>,
    /// Monotonic per-channel match id source.
    match_seq: u64,
}

impl Channel {
    fn game(&self, name: &str) -> Option<usize> {
        self.games
            .iter()
            .position(|p| p.config().name.eq_ignore_ascii_case(name))
    }
}

pub struct ChannelPickupRegistry {
    channels: HashMap<ChannelId, Channel>,
    history: MatchHistoryStore,
    storage: Box<dyn PickupStorage>,
    rng: StdRng,
}

impl ChannelPickupRegistry {
    pub fn new(storage: Box<dyn PickupStorage>) -> Self {
        Self::with_rng(storage, StdRng::from_os_rng())
    }

    /// Deterministic construction for tests and replay.
    pub fn with_rng(storage: Box<dyn PickupStorage>, rng: StdRng) -> Self {
        ChannelPickupRegistry {
            channels: HashMap::new(),
            history: MatchHistoryStore::new(),
            storage,
            rng,
        }
    }

    // Restore paths for boot-time loading; these do not write back to
    // storage.

    pub fn restore_channel(&mut self, channel: ChannelId) {
        self.channels.entry(channel).or_default();
    }

    pub fn restore_game(
        &mut self,
        channel: ChannelId,
        config: GameConfig,
    ) -> Result<(), CommandError> {
        let entry = self.channels.entry(channel).or_default();
        if entry.game(&config.name).is_some() {
            return Err(CommandError::DuplicateGame(config.name));
        }
        entry.games.push(Pickup::new(config));
        Ok(())
    }

    pub fn restore_history(&mut self, history: MatchHistoryStore) {
        self.history = history;
    }

    pub fn history(&self) -> &MatchHistoryStore {
        &self.history
    }

    /// Handle one resolved command to completion.
    pub fn handle(
        &mut self,
        ctx: &CommandContext,
        command: Command,
    ) -> Result<CommandOutcome, CommandError> {
        if command.requires_admin() && !ctx.is_admin {
            return Err(CommandError::NotAllowed);
        }
        match command {
            Command::Enable => self.enable(ctx),
            Command::AddGame {
                name,
                size,
                captains,
            } => self.add_game(ctx, name.as_str(), size, captains),
            Command::SetOption { game, key, value } => {
                self.set_option(ctx, game.as_str(), key.as_str(), value.as_str())
            }
            Command::Join { game } => self.join(ctx, game.as_str()),
            Command::Leave { game } => self.leave(ctx, game.as_str()),
            Command::Pick { tokens } => self.pick(ctx, &tokens),
            Command::ReadyReact { reaction } => {
                let (channel, rng) = self.channel_parts(ctx.channel)?;
                let mut outs = Vec::new();
                for pickup in &mut channel.games {
                    let out = pickup.ready_react(ctx.issuer.id, reaction, ctx.now, rng)?;
                    if !out.events.is_empty() || out.record.is_some() {
                        let game = pickup.config().name.clone();
                        outs.push((game, out));
                    }
                }
                let mut events = Vec::new();
                for (game, out) in outs {
                    events.extend(self.absorb(ctx.channel, &game, out));
                }
                Ok(CommandOutcome::events(events))
            }
            Command::Who => self.who(ctx),
            Command::Last {
                game,
                back_index,
                player_name,
            } => {
                let hit = self.history.lookup(
                    ctx.channel,
                    game.as_deref(),
                    back_index,
                    player_name.as_deref(),
                )?;
                Ok(CommandOutcome::reply(CommandReply::Last(MatchView {
                    back_index: hit.back_index,
                    record: hit.record.clone(),
                })))
            }
        }
    }

    /// Evaluate readiness deadlines across every pickup. Called by the
    /// scheduler once per tick.
    pub fn expire_due(&mut self, now: OffsetDateTime) -> Vec<ChannelEvent> {
        let mut events = Vec::new();
        for (&channel, entry) in &mut self.channels {
            for pickup in &mut entry.games {
                if let Some(out) = pickup.expire(now) {
                    let game = pickup.config().name.clone();
                    events.extend(out.events.into_iter().map(|event| ChannelEvent {
                        channel,
                        game: game.clone(),
                        event,
                    }));
                }
            }
        }
        events
    }

    fn channel_mut(&mut self, id: ChannelId) -> Result<&mut Channel, CommandError> {
        self.channels
            .get_mut(&id)
            .ok_or(CommandError::ChannelNotEnabled)
    }

    /// Split borrow: the channel and the RNG are disjoint fields, but both
    /// are needed at once wherever a fill can start a draft.
    fn channel_parts(&mut self, id: ChannelId) -> Result<(&mut Channel, &mut StdRng), CommandError> {
        let rng = &mut self.rng;
        let channel = self
            .channels
            .get_mut(&id)
            .ok_or(CommandError::ChannelNotEnabled)?;
        Ok((channel, rng))
    }

    fn enable(&mut self, ctx: &CommandContext) -> Result<CommandOutcome, CommandError> {
        self.channels.entry(ctx.channel).or_default();
        if let Err(e) = self.storage.save_channel(ctx.channel) {
            warn!(channel = %ctx.channel, error = %e, "failed to persist channel");
        }
        Ok(CommandOutcome::events(Vec::new()))
    }

    fn add_game(
        &mut self,
        ctx: &CommandContext,
        name: &str,
        size: usize,
        captains: usize,
    ) -> Result<CommandOutcome, CommandError> {
        let channel = self.channel_mut(ctx.channel)?;
        if channel.game(name).is_some() {
            return Err(CommandError::DuplicateGame(name.into()));
        }
        let config = GameConfig::new(name, size, captains)?;
        channel.games.push(Pickup::new(config.clone()));
        if let Err(e) = self.storage.save_game(ctx.channel, &config) {
            warn!(channel = %ctx.channel, game = name, error = %e, "failed to persist game");
        }
        Ok(CommandOutcome::events(Vec::new()))
    }

    fn set_option(
        &mut self,
        ctx: &CommandContext,
        game: &str,
        key: &str,
        value: &str,
    ) -> Result<CommandOutcome, CommandError> {
        let (channel, rng) = self.channel_parts(ctx.channel)?;
        let idx = channel
            .game(game)
            .ok_or_else(|| CommandError::UnknownGame(game.into()))?;
        let Channel { games, match_seq } = channel;
        games[idx].set_option(key, value)?;

        // Shrinking `players` down to the queued count fills immediately.
        let mut out = PickupOutput::default();
        games[idx].fill_if_ready(ctx.now, rng, match_seq, &mut out)?;
        let config = games[idx].config().clone();

        if let Err(e) = self.storage.save_game(ctx.channel, &config) {
            warn!(channel = %ctx.channel, game, error = %e, "failed to persist game");
        }
        let events = self.absorb(ctx.channel, game, out);
        Ok(CommandOutcome::events(events))
    }

    fn join(&mut self, ctx: &CommandContext, game: &str) -> Result<CommandOutcome, CommandError> {
        let (channel, rng) = self.channel_parts(ctx.channel)?;
        let idx = channel
            .game(game)
            .ok_or_else(|| CommandError::UnknownGame(game.into()))?;
        let Channel { games, match_seq } = channel;
        let out = games[idx].join(ctx.issuer.clone(), ctx.now, rng, match_seq)?;
        let events = self.absorb(ctx.channel, game, out);
        Ok(CommandOutcome::events(events))
    }

    fn leave(&mut self, ctx: &CommandContext, game: &str) -> Result<CommandOutcome, CommandError> {
        let channel = self.channel_mut(ctx.channel)?;
        let idx = channel
            .game(game)
            .ok_or_else(|| CommandError::UnknownGame(game.into()))?;
        let out = channel.games[idx].leave(ctx.issuer.id, ctx.now);
        let events = self.absorb(ctx.channel, game, out);
        Ok(CommandOutcome::events(events))
    }

    /// Route a pick to the draft the issuer is part of. A channel can run
    /// several games at once, so the issuer's membership disambiguates.
    fn pick(
        &mut self,
        ctx: &CommandContext,
        tokens: &[PickToken],
    ) -> Result<CommandOutcome, CommandError> {
        let channel = self.channel_mut(ctx.channel)?;
        let idx = channel
            .games
            .iter()
            .position(|p| p.phase_name() == "drafting" && p.contains(ctx.issuer.id))
            .ok_or(CommandError::NoActiveDraft)?;
        let game = channel.games[idx].config().name.clone();
        let out = channel.games[idx].pick(ctx.issuer.id, tokens, ctx.now)?;
        let events = self.absorb(ctx.channel, &game, out);
        Ok(CommandOutcome::events(events))
    }

    fn who(&mut self, ctx: &CommandContext) -> Result<CommandOutcome, CommandError> {
        let channel = self
            .channels
            .get(&ctx.channel)
            .ok_or(CommandError::ChannelNotEnabled)?;
        let statuses = channel
            .games
            .iter()
            .map(|p| GameStatus {
                game: p.config().name.clone(),
                phase: p.phase_name(),
                count: p.player_count(),
                total: p.config().size,
                players: p.roster(),
            })
            .collect();
        Ok(CommandOutcome::reply(CommandReply::Who(statuses)))
    }

    /// Stamp a pickup's output with its origin and fold any completed match
    /// into history and storage, appending the recorded event.
    fn absorb(&mut self, channel: ChannelId, game: &str, out: PickupOutput) -> Vec<ChannelEvent> {
        let mut events: Vec<ChannelEvent> = out
            .events
            .into_iter()
            .map(|event| ChannelEvent {
                channel,
                game: game.into(),
                event,
            })
            .collect();
        if let Some(record) = out.record {
            if let Err(e) = self.storage.append_match(channel, &record) {
                warn!(channel = %channel, game, error = %e, "failed to persist match");
            }
            let teams = record.teams.clone();
            self.history.record(channel, record);
            events.push(ChannelEvent {
                channel,
                game: game.into(),
                event: PickupEvent::MatchRecorded { index: 0, teams },
            });
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::PickToken;
    use crate::events::TeamRoster;
    use crate::pickup::ReadyReaction;
    use crate::player::{Player, PlayerId};
    use crate::storage::NullStorage;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use time::Duration;

    const CH: ChannelId = ChannelId(11);

    fn at(seconds: i64) -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH + Duration::seconds(seconds)
    }

    fn ctx_for(id: u64, admin: bool, now: OffsetDateTime) -> CommandContext {
        CommandContext {
            channel: CH,
            issuer: Player::new(id, format!("p{id}")),
            is_admin: admin,
            now,
        }
    }

    fn registry() -> ChannelPickupRegistry {
        let mut reg = ChannelPickupRegistry::with_rng(
            Box::new(NullStorage),
            StdRng::seed_from_u64(11),
        );
        reg.handle(&ctx_for(1, true, at(0)), Command::Enable).unwrap();
        reg
    }

    fn add_game(reg: &mut ChannelPickupRegistry, name: &str, size: usize, captains: usize) {
        reg.handle(
            &ctx_for(1, true, at(0)),
            Command::AddGame {
                name: name.into(),
                size,
                captains,
            },
        )
        .unwrap();
    }

    fn join(reg: &mut ChannelPickupRegistry, id: u64, game: &str, now: OffsetDateTime) -> Vec<ChannelEvent> {
        reg.handle(
            &ctx_for(id, false, now),
            Command::Join { game: game.into() },
        )
        .unwrap()
        .events
    }

    fn find_captains(events: &[ChannelEvent]) -> Vec<PlayerId> {
        events
            .iter()
            .find_map(|e| match &e.event {
                PickupEvent::DraftStarted { captains, .. } => {
                    Some(captains.iter().map(|c| c.id).collect())
                }
                _ => None,
            })
            .unwrap()
    }

    fn current_turn(events: &[ChannelEvent]) -> Option<(PlayerId, Vec<u32>)> {
        events.iter().rev().find_map(|e| match &e.event {
            PickupEvent::TurnAdvanced {
                captain, unpicked, ..
            } => Some((captain.id, unpicked.iter().map(|(n, _)| *n).collect())),
            _ => None,
        })
    }

    fn find_teams(events: &[ChannelEvent]) -> Option<Vec<TeamRoster>> {
        events.iter().find_map(|e| match &e.event {
            PickupEvent::TeamsReady { teams, .. } => Some(teams.clone()),
            _ => None,
        })
    }

    #[test]
    fn test_admin_gate() {
        let mut reg = ChannelPickupRegistry::with_rng(
            Box::new(NullStorage),
            StdRng::seed_from_u64(1),
        );
        assert_eq!(
            reg.handle(&ctx_for(1, false, at(0)), Command::Enable)
                .unwrap_err(),
            CommandError::NotAllowed
        );
        reg.handle(&ctx_for(1, true, at(0)), Command::Enable).unwrap();
    }

    #[test]
    fn test_commands_need_an_enabled_channel() {
        let mut reg = ChannelPickupRegistry::with_rng(
            Box::new(NullStorage),
            StdRng::seed_from_u64(1),
        );
        assert_eq!(
            reg.handle(
                &ctx_for(1, false, at(0)),
                Command::Join { game: "elim".into() }
            )
            .unwrap_err(),
            CommandError::ChannelNotEnabled
        );
    }

    #[test]
    fn test_duplicate_game_refused_case_insensitively() {
        let mut reg = registry();
        add_game(&mut reg, "elim", 8, 2);
        assert_eq!(
            reg.handle(
                &ctx_for(1, true, at(0)),
                Command::AddGame {
                    name: "ELIM".into(),
                    size: 4,
                    captains: 2
                }
            )
            .unwrap_err(),
            CommandError::DuplicateGame("ELIM".into())
        );
    }

    #[test]
    fn test_join_unknown_game() {
        let mut reg = registry();
        assert_eq!(
            reg.handle(
                &ctx_for(1, false, at(0)),
                Command::Join { game: "elim".into() }
            )
            .unwrap_err(),
            CommandError::UnknownGame("elim".into())
        );
    }

    // A full cycle under a client that issues one token per command: with
    // order "abbaab" and 8 players the draft takes exactly five single
    // picks and the last player settles onto beta.
    #[test]
    fn test_single_token_draft_cycle() {
        let mut reg = registry();
        add_game(&mut reg, "elim", 8, 2);
        reg.handle(
            &ctx_for(1, true, at(0)),
            Command::SetOption {
                game: "elim".into(),
                key: "pick_order".into(),
                value: "abbaab".into(),
            },
        )
        .unwrap();

        let mut events = Vec::new();
        for id in 1..=8 {
            events = join(&mut reg, id, "elim", at(0));
        }
        let captains = find_captains(&events);
        let pool: Vec<(u32, Player)> = events
            .iter()
            .find_map(|e| match &e.event {
                PickupEvent::DraftStarted { unpicked, .. } => Some(unpicked.clone()),
                _ => None,
            })
            .unwrap();

        let mut picks: i64 = 0;
        let mut taken: Vec<u32> = Vec::new();
        let teams = loop {
            if let Some(teams) = find_teams(&events) {
                break teams;
            }
            let (captain, unpicked) = current_turn(&events).unwrap();
            let target = unpicked[0];
            taken.push(target);
            events = reg
                .handle(
                    &ctx_for(captain.0, false, at(picks)),
                    Command::Pick {
                        tokens: vec![PickToken::Position(target)],
                    },
                )
                .unwrap()
                .events;
            picks += 1;
        };
        assert_eq!(picks, 5);
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].players.len(), 4);
        assert_eq!(teams[1].players.len(), 4);
        assert_eq!(teams[0].players[0].id, captains[0]);
        // The one position never picked by hand settled onto beta.
        let auto = (1..=6).find(|n| !taken.contains(n)).unwrap();
        let auto_player = pool.iter().find(|(n, _)| *n == auto).map(|(_, p)| p).unwrap();
        assert_eq!(teams[1].players.last().unwrap().id, auto_player.id);
    }

    // Minimal game: alpha picks one of two, the other settles onto beta,
    // and the match is immediately queryable at back index 0.
    #[test]
    fn test_small_draft_recorded_and_queryable() {
        let mut reg = registry();
        add_game(&mut reg, "duel", 4, 2);

        let mut events = Vec::new();
        for id in 1..=4 {
            events = join(&mut reg, id, "duel", at(0));
        }
        let (captain, unpicked) = current_turn(&events).unwrap();
        let events = reg
            .handle(
                &ctx_for(captain.0, false, at(1)),
                Command::Pick {
                    tokens: vec![PickToken::Position(unpicked[0])],
                },
            )
            .unwrap()
            .events;
        assert!(events.iter().any(|e| matches!(
            &e.event,
            PickupEvent::MatchRecorded { index: 0, .. }
        )));

        let outcome = reg
            .handle(
                &ctx_for(9, false, at(2)),
                Command::Last {
                    game: None,
                    back_index: 0,
                    player_name: None,
                },
            )
            .unwrap();
        match outcome.reply {
            CommandReply::Last(view) => {
                assert_eq!(view.back_index, 0);
                assert_eq!(view.record.game, "duel");
            }
            other => panic!("expected a match view, got {other:?}"),
        }
    }

    #[test]
    fn test_pick_without_a_draft() {
        let mut reg = registry();
        add_game(&mut reg, "elim", 8, 2);
        join(&mut reg, 1, "elim", at(0));
        assert_eq!(
            reg.handle(
                &ctx_for(1, false, at(1)),
                Command::Pick {
                    tokens: vec![PickToken::Position(1)]
                }
            )
            .unwrap_err(),
            CommandError::NoActiveDraft
        );
    }

    #[test]
    fn test_ready_reactions_route_by_membership() {
        let mut reg = registry();
        add_game(&mut reg, "elim", 4, 2);
        reg.handle(
            &ctx_for(1, true, at(0)),
            Command::SetOption {
                game: "elim".into(),
                key: "require_ready".into(),
                value: "30s".into(),
            },
        )
        .unwrap();
        for id in 1..=4 {
            join(&mut reg, id, "elim", at(0));
        }

        // A bystander's reaction is ignored, not an error.
        let outcome = reg
            .handle(
                &ctx_for(99, false, at(1)),
                Command::ReadyReact {
                    reaction: ReadyReaction::Confirm,
                },
            )
            .unwrap();
        assert!(outcome.events.is_empty());

        let mut events = Vec::new();
        for id in 1..=4 {
            events = reg
                .handle(
                    &ctx_for(id, false, at(2)),
                    Command::ReadyReact {
                        reaction: ReadyReaction::Confirm,
                    },
                )
                .unwrap()
                .events;
        }
        assert!(events.iter().any(|e| matches!(
            &e.event,
            PickupEvent::DraftStarted { .. }
        )));
    }

    #[test]
    fn test_expire_due_fires_once_per_deadline() {
        let mut reg = registry();
        add_game(&mut reg, "elim", 4, 2);
        reg.handle(
            &ctx_for(1, true, at(0)),
            Command::SetOption {
                game: "elim".into(),
                key: "require_ready".into(),
                value: "30s".into(),
            },
        )
        .unwrap();
        for id in 1..=4 {
            join(&mut reg, id, "elim", at(0));
        }

        assert!(reg.expire_due(at(10)).is_empty());
        let events = reg.expire_due(at(31));
        assert!(events.iter().any(|e| matches!(
            &e.event,
            PickupEvent::ReturnedToGathering { count: 0, total: 4 }
        )));
        assert!(reg.expire_due(at(32)).is_empty());
    }

    #[test]
    fn test_who_snapshot() {
        let mut reg = registry();
        add_game(&mut reg, "elim", 8, 2);
        add_game(&mut reg, "duel", 2, 1);
        join(&mut reg, 1, "elim", at(0));
        join(&mut reg, 2, "elim", at(0));

        let outcome = reg.handle(&ctx_for(9, false, at(1)), Command::Who).unwrap();
        match outcome.reply {
            CommandReply::Who(statuses) => {
                assert_eq!(statuses.len(), 2);
                assert_eq!(statuses[0].game, "elim");
                assert_eq!(statuses[0].count, 2);
                assert_eq!(statuses[0].total, 8);
                assert_eq!(statuses[1].count, 0);
            }
            other => panic!("expected a roster, got {other:?}"),
        }
    }

    #[test]
    fn test_set_option_can_trigger_a_fill() {
        let mut reg = registry();
        add_game(&mut reg, "elim", 8, 2);
        for id in 1..=6 {
            join(&mut reg, id, "elim", at(0));
        }
        let outcome = reg
            .handle(
                &ctx_for(1, true, at(1)),
                Command::SetOption {
                    game: "elim".into(),
                    key: "players".into(),
                    value: "6".into(),
                },
            )
            .unwrap();
        assert!(outcome.events.iter().any(|e| matches!(
            &e.event,
            PickupEvent::QueueFull { .. }
        )));
    }

    #[test]
    fn test_match_ids_are_per_channel_monotonic() {
        let mut reg = registry();
        add_game(&mut reg, "duel", 4, 2);
        let mut seen = Vec::new();
        for round in 0..2i64 {
            let mut events = Vec::new();
            for id in 1..=4 {
                events = join(&mut reg, id, "duel", at(round));
            }
            let match_id = events
                .iter()
                .find_map(|e| match &e.event {
                    PickupEvent::QueueFull { match_id } => Some(*match_id),
                    _ => None,
                })
                .unwrap();
            seen.push(match_id);
            let (captain, unpicked) = current_turn(&events).unwrap();
            reg.handle(
                &ctx_for(captain.0, false, at(round)),
                Command::Pick {
                    tokens: vec![PickToken::Position(unpicked[0])],
                },
            )
            .unwrap();
        }
        assert_eq!(seen, vec![1, 2]);
    }
}
