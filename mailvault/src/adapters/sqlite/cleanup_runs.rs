use rusqlite::params;

use super::DbPool;
use crate::types::error::Result;
use crate::types::CleanupRun;

/// A cleanup run about to be appended to the audit log
#[derive(Debug, Clone)]
pub struct NewCleanupRun {
    pub run_at: String,
    pub cutoff_date: String,
    pub retention_days: u32,
    pub emails_deleted: u32,
    pub emails_kept: u32,
}

pub fn append_cleanup_run(pool: &DbPool, run: &NewCleanupRun) -> Result<i64> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO cleanup_runs (run_at, cutoff_date, retention_days, emails_deleted, emails_kept)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            run.run_at,
            run.cutoff_date,
            run.retention_days,
            run.emails_deleted,
            run.emails_kept,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Most recent runs, newest first
pub fn recent_cleanup_runs(pool: &DbPool, limit: u32) -> Result<Vec<CleanupRun>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT id, run_at, cutoff_date, retention_days, emails_deleted, emails_kept
         FROM cleanup_runs
         ORDER BY run_at DESC, id DESC
         LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit], |row| {
        Ok(CleanupRun {
            id: row.get(0)?,
            run_at: row.get(1)?,
            cutoff_date: row.get(2)?,
            retention_days: row.get(3)?,
            emails_deleted: row.get(4)?,
            emails_kept: row.get(5)?,
        })
    })?;

    let mut runs = Vec::new();
    for row in rows {
        runs.push(row?);
    }
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::db;

    fn run(run_at: &str, deleted: u32) -> NewCleanupRun {
        NewCleanupRun {
            run_at: run_at.to_string(),
            cutoff_date: "2024-03-01".to_string(),
            retention_days: 730,
            emails_deleted: deleted,
            emails_kept: 2,
        }
    }

    #[test]
    fn test_recent_runs_newest_first() {
        let pool = db::in_memory().unwrap();
        append_cleanup_run(&pool, &run("2026-01-01T03:00:00+00:00", 1)).unwrap();
        append_cleanup_run(&pool, &run("2026-03-01T03:00:00+00:00", 3)).unwrap();
        append_cleanup_run(&pool, &run("2026-02-01T03:00:00+00:00", 2)).unwrap();

        let runs = recent_cleanup_runs(&pool, 2).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].emails_deleted, 3);
        assert_eq!(runs[1].emails_deleted, 2);
        assert_eq!(runs[0].emails_kept, 2);
        assert_eq!(runs[0].retention_days, 730);
    }
}
