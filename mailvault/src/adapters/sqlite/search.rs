use rusqlite::params;

use super::DbPool;
use crate::types::error::{MailvaultError, Result};

/// A raw full-text hit, before display shaping
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub subject: Option<String>,
    pub sender: Option<String>,
    pub date: Option<String>,
    pub snippet: Option<String>,
    pub has_attachments: bool,
}

/// Full-text query over subject, sender, recipients and body, newest first.
///
/// `query` uses FTS5 syntax; a malformed expression is reported as invalid input.
pub fn search_messages(pool: &DbPool, query: &str, limit: u32) -> Result<Vec<SearchHit>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT m.subject, m.sender, m.date, m.snippet, m.has_attachments
         FROM messages_fts fts
         JOIN messages m ON m.id = fts.rowid
         WHERE messages_fts MATCH ?1
         ORDER BY m.date_epoch DESC, m.id DESC
         LIMIT ?2",
    )?;

    let rows = stmt
        .query_map(params![query, limit], |row| {
            Ok(SearchHit {
                subject: row.get(0)?,
                sender: row.get(1)?,
                date: row.get(2)?,
                snippet: row.get(3)?,
                has_attachments: row.get::<_, i32>(4)? != 0,
            })
        })
        .map_err(|e| invalid_query(query, e))?;

    let mut hits = Vec::new();
    for row in rows {
        hits.push(row.map_err(|e| invalid_query(query, e))?);
    }
    Ok(hits)
}

fn invalid_query(query: &str, e: rusqlite::Error) -> MailvaultError {
    // FTS5 syntax errors surface as SqliteFailure on first step
    match e {
        rusqlite::Error::SqliteFailure(_, Some(msg))
            if msg.contains("fts5") || msg.contains("unterminated string") =>
        {
            MailvaultError::InvalidInput(format!("invalid search query '{}': {}", query, msg))
        }
        other => other.into(),
    }
}
