use chrono::{DateTime, Duration, Utc};
use std::time::Instant;
use tracing::{error, info, warn};

use crate::adapters::gmail::{ListFilter, MessageRef};
use crate::adapters::ntfy::{Notification, Priority};
use crate::adapters::sqlite::cleanup_runs::{append_cleanup_run, NewCleanupRun};
use crate::adapters::sqlite::messages;
use crate::services::logger::fmt_ms;
use crate::services::sync::JobContext;
use crate::types::error::{MailvaultError, Result};
use crate::types::CleanupSummary;

const METADATA_HEADERS: [&str; 3] = ["Subject", "From", "Date"];

/// Parameters of one retention pass
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    pub retention_days: u32,
    /// Messages carrying this label are never trashed
    pub keep_label: String,
    pub dry_run: bool,
}

enum Decision {
    Kept,
    Deleted,
}

/// Trash every remote message older than the retention window that lacks
/// the keep label.
///
/// Eligibility comes from the remote mailbox alone; the local
/// `deleted_from_gmail` flag is bookkeeping and is only set when the message
/// was archived. Non-dry runs append one audit row, even when a page listing
/// failure or a fatal per-message error stopped the pass early. A retention
/// window reaching past chrono's date range is a `Config` error.
pub async fn run_cleanup(ctx: &JobContext<'_>, policy: &RetentionPolicy) -> Result<CleanupSummary> {
    run_cleanup_at(ctx, policy, Utc::now()).await
}

pub async fn run_cleanup_at(
    ctx: &JobContext<'_>,
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> Result<CleanupSummary> {
    let started = Instant::now();

    let cutoff = now
        .checked_sub_signed(Duration::days(i64::from(policy.retention_days)))
        .ok_or_else(|| {
            MailvaultError::Config(format!(
                "retention of {} days reaches past the earliest representable date",
                policy.retention_days
            ))
        })?;

    // A missing keep label only means nothing is protected by label
    let keep_label_id = ctx.mailbox.label_id(&policy.keep_label).await?;
    if keep_label_id.is_none() {
        warn!("Keep label '{}' not found, no message is protected by label", policy.keep_label);
    }

    let mut summary = CleanupSummary {
        cutoff: cutoff.format("%Y-%m-%d").to_string(),
        retention_days: policy.retention_days,
        deleted: 0,
        kept: 0,
        failed: 0,
        dry_run: policy.dry_run,
        aborted: None,
    };

    info!(
        "Cleaning up ALL emails from Gmail older than {} ({} days){}",
        summary.cutoff,
        policy.retention_days,
        if policy.dry_run { " [DRY RUN]" } else { "" }
    );

    // Epoch seconds keep the cutoff exact instead of rounding to a day
    let filter = ListFilter::Query(format!("before:{}", cutoff.timestamp()));
    let mut page_token: Option<String> = None;

    'pages: loop {
        let page = match ctx.mailbox.list_messages(&filter, page_token.as_deref()).await {
            Ok(page) => page,
            Err(e) => {
                error!("Failed to list messages for cleanup: {}", e);
                summary.aborted = Some(e.to_string());
                break;
            }
        };

        for msg_ref in &page.messages {
            match process_candidate(ctx, msg_ref, keep_label_id.as_deref(), policy.dry_run).await {
                Ok(Decision::Kept) => summary.kept += 1,
                Ok(Decision::Deleted) => summary.deleted += 1,
                Err(e) if e.is_fatal() => {
                    error!(gmail_id = %msg_ref.id, "Stopping cleanup: {}", e);
                    summary.aborted = Some(e.to_string());
                    break 'pages;
                }
                Err(e) => {
                    error!(gmail_id = %msg_ref.id, "Failed to process message for cleanup: {}", e);
                    summary.failed += 1;
                }
            }
        }

        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    if !policy.dry_run {
        let run_id = append_cleanup_run(
            ctx.pool,
            &NewCleanupRun {
                run_at: now.to_rfc3339(),
                cutoff_date: summary.cutoff.clone(),
                retention_days: policy.retention_days,
                emails_deleted: summary.deleted,
                emails_kept: summary.kept,
            },
        )?;
        info!(run_id, "Recorded cleanup run");
    }

    info!(
        deleted = summary.deleted,
        kept = summary.kept,
        failed = summary.failed,
        "Cleanup complete: {} {} from Gmail, {} kept ({})",
        summary.deleted,
        if policy.dry_run { "would delete" } else { "deleted" },
        summary.kept,
        fmt_ms(started.elapsed())
    );

    notify_summary(ctx, &summary).await;
    Ok(summary)
}

async fn process_candidate(
    ctx: &JobContext<'_>,
    msg_ref: &MessageRef,
    keep_label_id: Option<&str>,
    dry_run: bool,
) -> Result<Decision> {
    let meta = ctx.mailbox.fetch_metadata(&msg_ref.id, &METADATA_HEADERS).await?;

    if let Some(keep) = keep_label_id {
        if meta.label_ids.iter().any(|l| l == keep) {
            return Ok(Decision::Kept);
        }
    }

    let subject = meta.header("Subject").unwrap_or("(no subject)");
    let sender = meta.header("From").unwrap_or("(unknown)");
    let date = meta.header("Date").unwrap_or("(no date)");

    if dry_run {
        info!(gmail_id = %msg_ref.id, "[DRY RUN] Would delete: {} - {} ({})", sender, subject, date);
        return Ok(Decision::Deleted);
    }

    ctx.mailbox.trash(&msg_ref.id).await?;

    // The remote trash already happened; the local flag is advisory
    match messages::mark_remotely_deleted(ctx.pool, &msg_ref.id) {
        Ok(true) => {}
        Ok(false) => info!(gmail_id = %msg_ref.id, "Deleted message was never archived locally"),
        Err(e) => warn!(gmail_id = %msg_ref.id, "Failed to flag archived message as deleted: {}", e),
    }

    info!(gmail_id = %msg_ref.id, "Deleted from Gmail: {} - {} ({})", sender, subject, date);
    Ok(Decision::Deleted)
}

async fn notify_summary(ctx: &JobContext<'_>, summary: &CleanupSummary) {
    if summary.dry_run {
        return;
    }

    if let Some(reason) = &summary.aborted {
        ctx.notifier
            .notify(
                Notification::new("Email Cleanup Failed", format!("Cleanup stopped early: {}", reason))
                    .priority(Priority::High)
                    .tag("x"),
            )
            .await;
    }

    ctx.notifier
        .notify(
            Notification::new(
                "Email Cleanup Complete",
                format!("Deleted {} emails from Gmail ({} kept)", summary.deleted, summary.kept),
            )
            .tag("wastebasket"),
        )
        .await;
}
