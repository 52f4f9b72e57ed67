//! Text rendering of engine output.
//!
//! Player names come from chat and may contain markdown control characters;
//! everything printed escapes them. Stats annotations are appended to names
//! from whatever snapshot is current at render time.

use pickup_core::command::{CommandReply, GameStatus, MatchView};
use pickup_core::events::{ChannelEvent, NotReadyReason, PickupEvent, TeamRoster, team_name};
use pickup_core::player::Player;
use pickup_core::stats::StatsSnapshot;
use time::format_description::well_known::Rfc3339;

/// Escape the markdown control characters a chat renderer would eat.
pub fn escape_markdown(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(c, '*' | '_' | '`' | '~') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn label(player: &Player, stats: &StatsSnapshot) -> String {
    let name = escape_markdown(&player.name);
    match stats.tag(player.id) {
        Some(tag) => format!("{name} ({tag})"),
        None => name,
    }
}

fn names(players: &[Player], stats: &StatsSnapshot) -> String {
    players
        .iter()
        .map(|p| label(p, stats))
        .collect::<Vec<_>>()
        .join(", ")
}

fn numbered(pool: &[(u32, Player)], stats: &StatsSnapshot) -> String {
    pool.iter()
        .map(|(n, p)| format!("{n}. {}", label(p, stats)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn teams_line(teams: &[TeamRoster], stats: &StatsSnapshot) -> String {
    teams
        .iter()
        .map(|t| format!("{} ({})", t.name, names(&t.players, stats)))
        .collect::<Vec<_>>()
        .join(" vs ")
}

fn timestamp(at: time::OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| at.to_string())
}

/// One broadcast line per event.
pub fn render_event(event: &ChannelEvent, stats: &StatsSnapshot) -> String {
    let prefix = format!("[{}/{}]", event.channel, event.game);
    let body = match &event.event {
        PickupEvent::PlayerJoined {
            player,
            count,
            total,
        } => format!("{} joined ({count}/{total})", label(player, stats)),
        PickupEvent::PlayerLeft {
            player,
            count,
            total,
        } => format!("{} left ({count}/{total})", label(player, stats)),
        PickupEvent::QueueFull { match_id } => format!("queue is full, match #{match_id}"),
        PickupEvent::ReadyCheckStarted {
            match_id,
            waiting,
            deadline,
        } => format!(
            "match #{match_id} ready check: waiting on {} until {}",
            names(waiting, stats),
            timestamp(*deadline),
        ),
        PickupEvent::ReadyCheckFailed { player, reason } => {
            let why = match reason {
                NotReadyReason::Aborted => "declined",
                NotReadyReason::Expired => "did not answer in time",
            };
            format!("{} {why} and was removed", label(player, stats))
        }
        PickupEvent::PlayerBackfilled {
            removed,
            replacement,
        } => format!(
            "{} fills in for {}",
            label(replacement, stats),
            label(removed, stats),
        ),
        PickupEvent::DraftStarted {
            match_id,
            captains,
            unpicked,
        } => format!(
            "match #{match_id} draft: captains {}; pool: {}",
            names(captains, stats),
            numbered(unpicked, stats),
        ),
        PickupEvent::TurnAdvanced {
            team,
            captain,
            quota,
            unpicked,
        } => format!(
            "{} picks for {} (up to {quota}): {}",
            label(captain, stats),
            team_name(*team),
            numbered(unpicked, stats),
        ),
        PickupEvent::PlayerLeftDraft { player } => {
            format!("{} abandoned the draft", label(player, stats))
        }
        PickupEvent::ReturnedToGathering { count, total } => {
            format!("back to gathering ({count}/{total})")
        }
        PickupEvent::TeamsReady { match_id, teams } => {
            format!("match #{match_id} teams: {}", teams_line(teams, stats))
        }
        PickupEvent::MatchRecorded { index, teams } => {
            format!("recorded at index {index}: {}", teams_line(teams, stats))
        }
    };
    format!("{prefix} {body}")
}

/// Render a direct query answer, one line per entry.
pub fn render_reply(reply: &CommandReply, stats: &StatsSnapshot) -> Vec<String> {
    match reply {
        CommandReply::None => Vec::new(),
        CommandReply::Who(statuses) => statuses.iter().map(|s| status_line(s, stats)).collect(),
        CommandReply::Last(view) => vec![last_line(view, stats)],
    }
}

fn status_line(status: &GameStatus, stats: &StatsSnapshot) -> String {
    let roster = if status.players.is_empty() {
        "empty".to_string()
    } else {
        names(&status.players, stats)
    };
    format!(
        "{} [{} {}/{}]: {roster}",
        status.game, status.phase, status.count, status.total,
    )
}

fn last_line(view: &MatchView, stats: &StatsSnapshot) -> String {
    format!(
        "{} ({} back): {}, finished {}",
        view.record.game,
        view.back_index,
        teams_line(&view.record.teams, stats),
        timestamp(view.record.finished_at),
    )
}
