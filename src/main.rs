// Lifetracker - habit tracker with threads, chains and a Telegram bot
//
// Threads are habits with a cadence. Each day a thread gets a square (hit,
// miss or empty); consecutive hits within the cadence's tolerance form chains.
// A calendar keeps per-day context and a timestamped journal, and a board
// holds loose notes.
//
// Architecture:
// - Web (axum): JSON API for the dashboard and edits
// - Store (rusqlite + r2d2): SQLite persistence, chain rebuild on every write
// - Bot (reqwest, own thread): board notes, journal lines, backup and restore
// - Backup scheduler (own thread): daily export to admin chats

mod backup;
mod bot;
mod cli;
mod config;
mod logging;
mod startup;
mod store;
mod tracker;
mod util;
mod web;

use std::sync::Arc;

use anyhow::{Context, Result};
use backup::BackupScheduler;
use bot::BotService;
use config::Config;
use store::Store;
use web::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Subcommands (config, export, restore, hash-password) exit early
    if cli::handle_cli() {
        return Ok(());
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();
    let config = Config::from_env();

    // Guard flushes the file log on drop; keep it for the whole run
    let _log_guard = logging::init(&config.logging);

    startup::print_startup(&config);
    startup::log_startup(&config);

    let store = Store::open(&config.db_path)
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;

    let bot = if config.bot.is_enabled() {
        match BotService::start(&config.bot, store.clone()) {
            Ok(bot) => Some(bot),
            Err(e) => {
                tracing::error!("Telegram bot failed to start: {:#}", e);
                None
            }
        }
    } else {
        None
    };

    // Backups are delivered to admin chats, so they need the bot
    let scheduler = match &bot {
        Some(bot) if config.backup.enabled => {
            match BackupScheduler::new(store.clone(), config.backup.time, Arc::new(bot.broadcaster()))
            {
                Ok(scheduler) => Some(scheduler),
                Err(e) => {
                    tracing::error!("Backup scheduler failed to start: {:#}", e);
                    None
                }
            }
        }
        _ => None,
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let state = AppState::new(store, config.categories.clone());
    let mut server = tokio::spawn(web::serve(config.bind_addr, state, shutdown_rx));

    // Run until Ctrl+C, or until the server stops on its own (bind failure)
    let finished = tokio::select! {
        joined = &mut server => Some(joined),
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl+C")?;
            None
        }
    };

    tracing::info!("Shutting down...");

    if let Some(scheduler) = scheduler {
        scheduler.shutdown();
    }
    if let Some(bot) = bot {
        bot.shutdown();
    }

    // If the send fails, the server has already stopped
    let _ = shutdown_tx.send(());
    let joined = match finished {
        Some(joined) => joined,
        None => server.await,
    };
    joined.context("HTTP server task panicked")??;

    tracing::info!("Shutdown complete");
    Ok(())
}
