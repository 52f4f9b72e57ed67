//! Pickup Draft & Readiness Server
//!
//! Runs the pickup engine behind a line-based console transport: stdin
//! lines become commands, broadcast events and query replies print to
//! stdout, and a tokio interval drives the readiness scheduler.

mod config;
mod console;
mod render;
mod stats_refresh;
mod storage;

use clap::Parser;
use config::{ConfigLoader, LoadedConfig};
use pickup_core::command::CommandContext;
use pickup_core::events::{ChannelEventSender, channel_event_channel};
use pickup_core::player::ChannelId;
use pickup_core::registry::ChannelPickupRegistry;
use pickup_core::scheduler::Scheduler;
use pickup_core::stats::{NullStatsProvider, StatsCache, StatsSnapshot};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use storage::JsonFileStorage;
use time::OffsetDateTime;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Pickup draft & readiness engine with a console transport
#[derive(Parser, Debug)]
#[command(name = "pickup-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./pickup-config.toml")]
    config: PathBuf,

    /// Override the scheduler tick interval in seconds
    #[arg(short, long)]
    tick: Option<u64>,

    /// Override the data file path
    #[arg(short, long)]
    data: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();
    tracing::info!("Starting pickup-server v{}", env!("CARGO_PKG_VERSION"));

    let loader = ConfigLoader::new(&args.config, args.tick);
    let loaded = loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let data_file = args.data.unwrap_or_else(|| loaded.server.data_file.clone());
    let store = JsonFileStorage::open(&data_file).map_err(|e| {
        tracing::error!("Failed to open data file {:?}: {}", data_file, e);
        e
    })?;
    tracing::info!("Data file opened at {:?}", data_file);

    let mut registry = restore_registry(store, &loaded);

    // Stats cache and its background refresh.
    let stats = StatsCache::new(StatsSnapshot::empty(OffsetDateTime::now_utc()));
    let (stats_task, stats_shutdown) = stats_refresh::spawn_stats_refresh(
        stats.clone(),
        Arc::new(NullStatsProvider),
        Duration::from_secs(loaded.server.stats_refresh_secs),
    );

    // Broadcast events flow through a queue to a dedicated render task, so
    // command handling never waits on output.
    let (event_tx, mut event_rx) = channel_event_channel();
    let render_stats = stats.clone();
    let render_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let snapshot = render_stats.snapshot();
            println!("{}", render::render_event(&event, &snapshot));
        }
    });

    let mut scheduler = Scheduler::new();
    let mut ticker = tokio::time::interval(Duration::from_secs(loaded.server.tick_secs));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    tracing::info!("Ready; reading commands from stdin");
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => {
                        handle_line(&line, &loaded, &mut registry, &event_tx, &stats).await;
                    }
                    None => {
                        tracing::info!("stdin closed, shutting down");
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                let events = scheduler.tick(OffsetDateTime::now_utc(), &mut registry);
                for event in events {
                    let _ = event_tx.send(event).await;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, shutting down");
                break;
            }
        }
    }

    // Drain the event queue, then stop the background tasks.
    drop(event_tx);
    let _ = render_task.await;
    stats_shutdown.notify_one();
    let _ = stats_task.await;
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Build the registry from the data file, then overlay any game the config
/// file declares that the data file does not know yet. Data-file entries
/// win because they carry option changes made at runtime.
fn restore_registry(store: JsonFileStorage, loaded: &LoadedConfig) -> ChannelPickupRegistry {
    let persisted: Vec<_> = store
        .channels()
        .map(|(id, games)| (id, games.to_vec()))
        .collect();
    let history = store.history();

    let mut registry = ChannelPickupRegistry::new(Box::new(store));
    registry.restore_history(history);
    for (id, games) in persisted {
        registry.restore_channel(id);
        for game in games {
            let name = game.name.clone();
            if let Err(e) = registry.restore_game(id, game) {
                tracing::warn!(channel = %id, game = %name, error = %e, "skipping persisted game");
            }
        }
    }
    for channel in &loaded.channels {
        registry.restore_channel(channel.id);
        for game in &channel.games {
            if registry.restore_game(channel.id, game.clone()).is_err() {
                tracing::debug!(
                    channel = %channel.id,
                    game = %game.name,
                    "declared game already restored from data file"
                );
            }
        }
    }
    registry
}

async fn handle_line(
    line: &str,
    loaded: &LoadedConfig,
    registry: &mut ChannelPickupRegistry,
    event_tx: &ChannelEventSender,
    stats: &StatsCache,
) {
    let input = match console::parse_line(line) {
        Ok(input) => input,
        Err(e) => {
            println!("error: {e}");
            return;
        }
    };
    let channel = ChannelId(input.channel);
    let ctx = CommandContext {
        channel,
        is_admin: loaded.is_admin(channel, input.issuer.id.0),
        issuer: input.issuer,
        now: OffsetDateTime::now_utc(),
    };
    match registry.handle(&ctx, input.command) {
        Ok(outcome) => {
            for event in outcome.events {
                let _ = event_tx.send(event).await;
            }
            let snapshot = stats.snapshot();
            for reply_line in render::render_reply(&outcome.reply, &snapshot) {
                println!("{reply_line}");
            }
        }
        Err(e) => println!("error: {e}"),
    }
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
