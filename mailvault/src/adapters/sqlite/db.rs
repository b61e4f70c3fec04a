use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;
use tracing::info;

use crate::types::error::{MailvaultError, Result};

pub type DbPool = Pool<SqliteConnectionManager>;

// Applied to every pooled connection: WAL lets search readers run next to the
// single writer, busy_timeout makes a second writer wait instead of failing.
const CONNECTION_PRAGMAS: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = NORMAL;
    PRAGMA foreign_keys = ON;
    PRAGMA busy_timeout = 5000;
    PRAGMA temp_store = MEMORY;";

/// Creates the database directory, connection pool, and initializes the schema.
pub fn initialize(db_path: &Path) -> Result<DbPool> {
    if let Some(dir) = db_path.parent() {
        std::fs::create_dir_all(dir)
            .map_err(|e| MailvaultError::Database(format!("Failed to create db dir: {e}")))?;
    }

    info!("Opening archive database at {:?}", db_path);

    let manager = SqliteConnectionManager::file(db_path)
        .with_init(|conn| conn.execute_batch(CONNECTION_PRAGMAS));

    let pool = Pool::builder().max_size(4).build(manager)?;

    let conn = pool.get()?;
    super::schema::initialize_schema(&conn)?;

    Ok(pool)
}

/// Create an in-memory database (for testing)
#[cfg(test)]
pub fn in_memory() -> Result<DbPool> {
    let manager = SqliteConnectionManager::memory()
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));

    // A single connection: every pooled handle must see the same memory db
    let pool = Pool::builder().max_size(1).build(manager)?;

    let conn = pool.get()?;
    super::schema::initialize_schema(&conn)?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_creates_file_in_wal_mode() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("db").join("emails.db");

        let pool = initialize(&db_path).expect("Failed to initialize database");
        assert!(db_path.exists());

        let conn = pool.get().unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("emails.db");

        initialize(&db_path).expect("first open");
        initialize(&db_path).expect("second open should reuse the schema");
    }
}
