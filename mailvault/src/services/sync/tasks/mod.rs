mod backup;
mod cleanup;

pub use backup::run_backup;
pub use cleanup::{run_cleanup, RetentionPolicy};
