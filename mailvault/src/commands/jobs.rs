//! Backup and cleanup commands
//!
//! Each command takes its job lock, connects to Gmail, runs the pass and
//! prints the summary followed by the archive stats.

use tracing::info;

use super::display::{render_cleanup_summary, render_stats, render_sync_summary};
use crate::services::sync::tasks::{run_backup, run_cleanup, RetentionPolicy};
use crate::services::sync::JobContext;
use crate::services::archive_stats;
use crate::state::{AppState, JobKind};
use crate::types::error::Result;
use crate::types::{CleanupSummary, SyncSummary};

pub async fn backup(state: &AppState) -> Result<SyncSummary> {
    let _guard = state.locks.try_acquire(JobKind::Backup)?;
    let gmail = state.gmail()?;

    let ctx = JobContext {
        pool: &state.pool,
        mailbox: &gmail,
        notifier: state.notifier.as_ref(),
        layout: &state.layout,
    };
    let summary = run_backup(&ctx, &state.config.backup_label).await?;

    print!("{}", render_sync_summary(&summary));
    print!("{}", render_stats(&archive_stats(&state.pool)?));
    Ok(summary)
}

pub async fn cleanup(state: &AppState, dry_run: bool) -> Result<CleanupSummary> {
    let _guard = state.locks.try_acquire(JobKind::Cleanup)?;
    let gmail = state.gmail()?;

    let policy = RetentionPolicy {
        retention_days: state.config.retention_days,
        keep_label: state.config.keep_label.clone(),
        dry_run,
    };
    info!(
        retention_days = policy.retention_days,
        keep_label = %policy.keep_label,
        dry_run,
        "Starting cleanup"
    );

    let ctx = JobContext {
        pool: &state.pool,
        mailbox: &gmail,
        notifier: state.notifier.as_ref(),
        layout: &state.layout,
    };
    let summary = run_cleanup(&ctx, &policy).await?;

    print!("{}", render_cleanup_summary(&summary));
    print!("{}", render_stats(&archive_stats(&state.pool)?));
    Ok(summary)
}
