pub mod archive_storage;
pub mod content_extraction;
