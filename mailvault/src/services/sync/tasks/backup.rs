use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::adapters::gmail::{ListFilter, MessageRef, RawMessage};
use crate::adapters::ntfy::{Notification, Priority};
use crate::adapters::sqlite::messages::{self, NewMessage};
use crate::adapters::sqlite::DbPool;
use crate::services::logger::fmt_ms;
use crate::services::sync::helpers::{archive_storage, content_extraction};
use crate::services::sync::JobContext;
use crate::types::error::{MailvaultError, Result};
use crate::types::SyncSummary;

enum Outcome {
    Archived,
    Skipped,
}

/// Archive every message carrying `label_name` that is not archived yet.
///
/// A missing label is fatal. Per-message failures are logged and counted; a
/// failed page listing or a fatal per-message error (see
/// [`MailvaultError::is_fatal`]) stops the pass with `aborted` set, keeping
/// whatever was committed before it.
pub async fn run_backup(ctx: &JobContext<'_>, label_name: &str) -> Result<SyncSummary> {
    let started = Instant::now();

    let label_id = ctx
        .mailbox
        .label_id(label_name)
        .await?
        .ok_or_else(|| MailvaultError::LabelNotFound(label_name.to_string()))?;
    info!(label = %label_name, %label_id, "Backing up emails with label '{}'", label_name);

    ctx.layout.ensure_dirs()?;

    let filter = ListFilter::Label(label_id);
    let mut summary = SyncSummary::default();
    let mut page_token: Option<String> = None;

    'pages: loop {
        let page = match ctx.mailbox.list_messages(&filter, page_token.as_deref()).await {
            Ok(page) => page,
            Err(e) => {
                error!("Failed to list messages for '{}': {}", label_name, e);
                summary.aborted = Some(e.to_string());
                break;
            }
        };

        for msg_ref in &page.messages {
            match back_up_message(ctx, msg_ref).await {
                Ok(Outcome::Archived) => summary.archived += 1,
                Ok(Outcome::Skipped) => summary.skipped += 1,
                Err(e) if e.is_fatal() => {
                    error!(gmail_id = %msg_ref.id, "Stopping backup: {}", e);
                    summary.aborted = Some(e.to_string());
                    break 'pages;
                }
                Err(e) => {
                    error!(gmail_id = %msg_ref.id, "Failed to back up message: {}", e);
                    summary.failed += 1;
                }
            }
        }

        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    info!(
        archived = summary.archived,
        skipped = summary.skipped,
        failed = summary.failed,
        "Backup complete: {} new, {} already existed ({})",
        summary.archived,
        summary.skipped,
        fmt_ms(started.elapsed())
    );

    notify_summary(ctx, &summary).await;
    Ok(summary)
}

async fn back_up_message(ctx: &JobContext<'_>, msg_ref: &MessageRef) -> Result<Outcome> {
    // Checked before any fetch so a re-run only re-lists
    if messages::exists(ctx.pool, &msg_ref.id)? {
        return Ok(Outcome::Skipped);
    }

    let raw = ctx.mailbox.fetch_raw(&msg_ref.id).await?;
    let parsed = content_extraction::parse(&raw.raw)?;

    let natural_key = resolve_natural_key(ctx.pool, parsed.message_id.as_deref(), &msg_ref.id)?;
    let message_key = archive_storage::message_key(&natural_key);

    let mut written: Vec<PathBuf> = Vec::new();
    let result = persist(ctx, &raw, &parsed, natural_key, &message_key, &mut written);
    if result.is_err() {
        archive_storage::remove_files(&written);
    }
    result?;

    info!(gmail_id = %msg_ref.id, %message_key, "Backed up: {} - {}", parsed.sender, parsed.subject);
    Ok(Outcome::Archived)
}

fn persist(
    ctx: &JobContext<'_>,
    raw: &RawMessage,
    parsed: &content_extraction::ParsedMessage,
    natural_key: String,
    message_key: &str,
    written: &mut Vec<PathBuf>,
) -> Result<()> {
    let raw_path = archive_storage::write_raw(ctx.layout, message_key, parsed.date_epoch, &raw.raw, written)?;
    let attachments = archive_storage::store_attachments(&parsed.attachments, message_key, ctx.layout, written)?;

    let record = NewMessage {
        message_id: natural_key,
        header_message_id: parsed.message_id.clone(),
        gmail_id: raw.id.clone(),
        message_key: message_key.to_string(),
        thread_id: raw.thread_id.clone(),
        subject: parsed.subject.clone(),
        sender: parsed.sender.clone(),
        recipients: parsed.recipients.clone(),
        date: parsed.date.clone(),
        date_epoch: parsed.date_epoch,
        labels: serde_json::to_string(&raw.label_ids)?,
        snippet: raw.snippet.clone(),
        body_text: parsed.body_text.clone(),
        raw_path: raw_path.to_string_lossy().into_owned(),
        backed_up_at: chrono::Utc::now().to_rfc3339(),
    };

    messages::insert_message(ctx.pool, &record, &attachments)
}

/// The Message-ID header, unless it is missing or already owned by another
/// archived message; the Gmail id otherwise
fn resolve_natural_key(pool: &DbPool, header_id: Option<&str>, gmail_id: &str) -> Result<String> {
    match header_id {
        Some(id) if !messages::natural_key_taken(pool, id)? => Ok(id.to_string()),
        Some(id) => {
            warn!(%gmail_id, "Message-ID {} already archived under another message, keying by Gmail id", id);
            Ok(gmail_id.to_string())
        }
        None => {
            debug!(%gmail_id, "No Message-ID header, keying by Gmail id");
            Ok(gmail_id.to_string())
        }
    }
}

async fn notify_summary(ctx: &JobContext<'_>, summary: &SyncSummary) {
    if let Some(reason) = &summary.aborted {
        ctx.notifier
            .notify(
                Notification::new("Email Backup Failed", format!("Backup stopped early: {}", reason))
                    .priority(Priority::High)
                    .tag("x"),
            )
            .await;
    }

    if summary.failed > 0 {
        ctx.notifier
            .notify(
                Notification::new(
                    "Email Backup Errors",
                    format!("{} emails failed to back up", summary.failed),
                )
                .priority(Priority::High)
                .tag("warning"),
            )
            .await;
    }

    if summary.archived > 0 {
        ctx.notifier
            .notify(
                Notification::new(
                    "Email Backup Complete",
                    format!(
                        "Backed up {} new emails ({} already archived)",
                        summary.archived, summary.skipped
                    ),
                )
                .tag("email"),
            )
            .await;
    }
}
