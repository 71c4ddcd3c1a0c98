//! Log keyword alert relay.
//!
//! Tails one or more log files and forwards the first words of every line
//! containing a configured keyword to a Telegram chat.
//!
//! # Architecture Overview
//!
//! ```text
//!   argv / ~/.config/tg_log.ini
//!            │
//!            ▼
//!   ┌─────────────────┐      ┌───────────────────────────────────────────┐
//!   │     config      │─────▶│                 monitor                   │
//!   │ resolve+validate│      │                                           │
//!   └─────────────────┘      │  inotify ──▶ watcher ──▶ tail loop        │
//!                            │                            │              │
//!                            │              target (cursor, reopen)      │
//!                            │                            │              │
//!                            │              matcher (keyword, excerpt)   │
//!                            └────────────────────────────┼──────────────┘
//!                                                         ▼
//!                                              ┌─────────────────────┐
//!                                              │ delivery (Telegram) │──▶ sendMessage
//!                                              └─────────────────────┘
//! ```
//!
//! Exits with status 1 on configuration or setup errors; otherwise runs
//! until killed.

use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;

use log_alert_relay::config::{cli::usage, loader::resolve_from_args, Cli};
use log_alert_relay::observability::logging;
use log_alert_relay::{TailMonitor, TelegramClient};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    let config = match resolve_from_args(cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!();
            eprintln!("{}", usage());
            return ExitCode::FAILURE;
        }
    };

    logging::init(config.debug);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        targets = config.targets.len(),
        excerpt_words = config.excerpt_words.get(),
        debug = config.debug,
        "log-alert-relay starting"
    );

    let client = match TelegramClient::new(&config.bot_id, &config.chat_id) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build Telegram client");
            return ExitCode::FAILURE;
        }
    };

    let monitor = match TailMonitor::new(&config, client) {
        Ok(monitor) => monitor,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start monitoring");
            return ExitCode::FAILURE;
        }
    };

    match monitor.run().await {
        Ok(never) => match never {},
        Err(e) => {
            tracing::error!(error = %e, "Monitoring stopped");
            ExitCode::FAILURE
        }
    }
}
