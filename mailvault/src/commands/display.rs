//! Plain-text rendering of command results for stdout

use std::fmt::Write;

use crate::types::{ArchiveStats, CleanupSummary, SearchResult, SyncSummary};

fn fmt_epoch(epoch: Option<i64>) -> String {
    epoch
        .and_then(|e| chrono::DateTime::from_timestamp(e, 0))
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "n/a".to_string())
}

pub fn render_stats(stats: &ArchiveStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nEmail Backup Statistics:");
    let _ = writeln!(out, "  Total emails backed up:  {}", stats.total);
    let _ = writeln!(out, "  Deleted from Gmail:      {}", stats.remotely_deleted);
    let _ = writeln!(out, "  Emails with attachments: {}", stats.with_attachments);
    let _ = writeln!(out, "  Total attachments:       {}", stats.total_attachments);
    let _ = writeln!(
        out,
        "  Date range:              {} -> {}",
        fmt_epoch(stats.earliest_epoch),
        fmt_epoch(stats.latest_epoch)
    );

    if !stats.recent_runs.is_empty() {
        let _ = writeln!(out, "\nRecent Cleanup Runs:");
        for run in &stats.recent_runs {
            let run_date = run.run_at.get(..10).unwrap_or("Unknown");
            let _ = writeln!(
                out,
                "  {} | Cutoff: {} ({}d) | Deleted: {} | Kept: {}",
                run_date, run.cutoff_date, run.retention_days, run.emails_deleted, run.emails_kept
            );
        }
    }
    out
}

pub fn render_search(query: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return format!("No results for: {}\n", query);
    }

    let rule = "=".repeat(80);
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", rule);
    let _ = writeln!(out, "Search results for: {} ({} found)", query, results.len());
    let _ = writeln!(out, "{}\n", rule);

    for r in results {
        let marker = if r.has_attachments { " [+att]" } else { "" };
        let _ = writeln!(out, "  Date:    {}", r.date);
        let _ = writeln!(out, "  From:    {}", r.sender);
        let _ = writeln!(out, "  Subject: {}{}", r.subject, marker);
        let _ = writeln!(out, "  Preview: {}", r.preview);
        let _ = writeln!(out);
    }
    out
}

pub fn render_sync_summary(summary: &SyncSummary) -> String {
    let mut out = format!(
        "Backup: {} archived, {} already archived, {} failed\n",
        summary.archived, summary.skipped, summary.failed
    );
    if let Some(reason) = &summary.aborted {
        let _ = writeln!(out, "Backup stopped early: {}", reason);
    }
    out
}

pub fn render_cleanup_summary(summary: &CleanupSummary) -> String {
    let verb = if summary.dry_run { "would delete" } else { "deleted" };
    let mut out = format!(
        "Cleanup{} (cutoff {}, {}d): {} {}, {} kept, {} failed\n",
        if summary.dry_run { " [DRY RUN]" } else { "" },
        summary.cutoff,
        summary.retention_days,
        verb,
        summary.deleted,
        summary.kept,
        summary.failed
    );
    if let Some(reason) = &summary.aborted {
        let _ = writeln!(out, "Cleanup stopped early: {}", reason);
    }
    out
}
