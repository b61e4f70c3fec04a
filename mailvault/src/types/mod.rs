pub mod error;

use serde::{Deserialize, Serialize};

/// Outcome of one backup (sync) pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    /// Messages fetched and archived for the first time
    pub archived: u32,
    /// Messages whose Gmail id was already archived
    pub skipped: u32,
    /// Messages that failed to fetch, parse or persist
    pub failed: u32,
    /// Set when a page listing failed and the pass stopped early
    pub aborted: Option<String>,
}

/// Outcome of one retention (cleanup) pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupSummary {
    /// Cutoff date as `YYYY-MM-DD` (UTC)
    pub cutoff: String,
    pub retention_days: u32,
    /// Messages trashed (or that would be trashed in dry-run mode)
    pub deleted: u32,
    /// Messages protected by the keep label
    pub kept: u32,
    pub failed: u32,
    pub dry_run: bool,
    pub aborted: Option<String>,
}

/// A single row of the cleanup audit log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupRun {
    pub id: i64,
    /// RFC 3339 timestamp of the run
    pub run_at: String,
    pub cutoff_date: String,
    pub retention_days: u32,
    pub emails_deleted: u32,
    pub emails_kept: u32,
}

/// Aggregate archive statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveStats {
    pub total: u64,
    pub remotely_deleted: u64,
    pub with_attachments: u64,
    pub total_attachments: u64,
    /// Earliest parsed date (unix seconds), ignoring unparsable dates
    pub earliest_epoch: Option<i64>,
    pub latest_epoch: Option<i64>,
    /// Most recent cleanup runs, newest first
    pub recent_runs: Vec<CleanupRun>,
}

/// A full-text search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub subject: String,
    pub sender: String,
    pub date: String,
    pub preview: String,
    pub has_attachments: bool,
}
