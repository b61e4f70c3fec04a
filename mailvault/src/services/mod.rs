//! Business logic services
//!
//! Everything here works against the adapter traits and the pool, so it runs
//! the same from the CLI and from tests.

mod archive_service;
pub mod logger;
pub mod sync;

pub use archive_service::*;
