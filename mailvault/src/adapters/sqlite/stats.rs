use super::cleanup_runs::recent_cleanup_runs;
use super::DbPool;
use crate::types::error::Result;
use crate::types::ArchiveStats;

/// Aggregate counts over the archive plus the `recent_runs` newest cleanup runs
pub fn query_stats(pool: &DbPool, recent_runs: u32) -> Result<ArchiveStats> {
    let mut stats = {
        let conn = pool.get()?;
        conn.query_row(
            "SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN deleted_from_gmail = 1 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(has_attachments), 0),
                COALESCE(SUM(attachment_count), 0),
                MIN(CASE WHEN date_epoch > 0 THEN date_epoch END),
                MAX(CASE WHEN date_epoch > 0 THEN date_epoch END)
             FROM messages",
            [],
            |row| {
                Ok(ArchiveStats {
                    total: row.get::<_, i64>(0)? as u64,
                    remotely_deleted: row.get::<_, i64>(1)? as u64,
                    with_attachments: row.get::<_, i64>(2)? as u64,
                    total_attachments: row.get::<_, i64>(3)? as u64,
                    earliest_epoch: row.get(4)?,
                    latest_epoch: row.get(5)?,
                    recent_runs: Vec::new(),
                })
            },
        )?
    };

    // The connection above is released first; the test pool holds only one
    stats.recent_runs = recent_cleanup_runs(pool, recent_runs)?;
    Ok(stats)
}
