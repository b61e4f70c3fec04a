//! Process-wide state shared by the command layer

mod app_state;
mod job_locks;

pub use app_state::AppState;
pub use job_locks::{JobGuard, JobKind, JobLocks};
