//! Read-only queries over the local archive

use crate::adapters::sqlite::search::search_messages;
use crate::adapters::sqlite::stats::query_stats;
use crate::adapters::sqlite::DbPool;
use crate::types::error::{MailvaultError, Result};
use crate::types::{ArchiveStats, SearchResult};

/// Maximum number of search hits returned
pub const SEARCH_LIMIT: u32 = 50;

/// Preview length in characters
pub const PREVIEW_CHARS: usize = 120;

/// Cleanup runs shown alongside the aggregate stats
pub const RECENT_RUNS: u32 = 10;

/// Full-text search, newest first, capped at [`SEARCH_LIMIT`]
pub fn search_archive(pool: &DbPool, query: &str) -> Result<Vec<SearchResult>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(MailvaultError::InvalidInput("search query must not be empty".into()));
    }

    let hits = search_messages(pool, query, SEARCH_LIMIT)?;
    Ok(hits
        .into_iter()
        .map(|hit| SearchResult {
            subject: hit.subject.unwrap_or_default(),
            sender: hit.sender.unwrap_or_default(),
            date: hit.date.unwrap_or_default(),
            preview: hit.snippet.unwrap_or_default().chars().take(PREVIEW_CHARS).collect(),
            has_attachments: hit.has_attachments,
        })
        .collect())
}

pub fn archive_stats(pool: &DbPool) -> Result<ArchiveStats> {
    query_stats(pool, RECENT_RUNS)
}
