pub mod gmail;
pub mod ntfy;
pub mod sqlite;
