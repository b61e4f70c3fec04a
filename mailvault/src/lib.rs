//! mailvault - Gmail label archiver with retention cleanup
//!
//! Copies every message carrying a backup label into a local store (raw
//! `.eml` blobs, attachments, SQLite rows with a full-text index) and later
//! trashes remote messages older than the retention window unless they carry
//! a keep label.
//!
//! ## Module Organization
//!
//! - `commands/`: CLI command handlers (thin wrappers)
//! - `services/`: Business logic (backup and cleanup passes, search, stats)
//! - `adapters/`: Gmail REST, ntfy and SQLite access
//! - `state/`: Per-process state and job locks
//! - `config/`: Configuration management
//! - `types/`: Data structures and errors

pub mod adapters;
pub mod cli;
pub mod commands;
pub mod config;
pub mod services;
pub mod state;
pub mod types;

use std::process::ExitCode;
use tracing::{error, info};

use cli::Command;
use config::AppConfig;
use state::AppState;
use types::error::Result;

/// Run one CLI command and map its outcome to the process exit code.
///
/// Fatal errors (missing label or credentials, bad config) exit 1. A backup
/// stopped by a listing failure also exits 1; a cleanup stopped the same way
/// exits 0 because its run is still recorded.
pub async fn run(command: Command) -> ExitCode {
    match dispatch(command).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(command: Command) -> Result<ExitCode> {
    let config = AppConfig::load()?;
    let state = AppState::open(config)?;

    match command {
        Command::Backup => {
            let summary = commands::backup(&state).await?;
            if summary.aborted.is_some() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Cleanup { dry_run } => {
            commands::cleanup(&state, dry_run).await?;
        }
        Command::Search { query } => {
            commands::search(&state, &query.join(" "))?;
        }
        Command::Stats => {
            commands::stats(&state)?;
        }
    }

    info!("Done");
    Ok(ExitCode::SUCCESS)
}
