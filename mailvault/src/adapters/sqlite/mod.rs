pub mod cleanup_runs;
pub mod db;
pub mod messages;
pub mod schema;
pub mod search;
pub mod stats;

// Re-export the pool type so callers can do `use crate::adapters::sqlite::DbPool`
pub use db::DbPool;
