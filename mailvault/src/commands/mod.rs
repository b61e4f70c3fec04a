//! CLI command handlers
//!
//! Commands are thin wrappers that delegate to services for business logic
//! and render results to stdout.
//!
//! - `jobs`: backup and cleanup passes against Gmail
//! - `archive`: search and stats over the local archive
//! - `display`: text rendering shared by both

pub mod archive;
pub mod display;
pub mod jobs;

pub use archive::*;
pub use jobs::*;
