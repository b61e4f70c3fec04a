//! Per-job mutual exclusion
//!
//! One lock per job kind: a second backup is refused while a backup runs,
//! but a backup and a cleanup may overlap.

use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::types::error::{MailvaultError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Backup,
    Cleanup,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Backup => write!(f, "backup"),
            JobKind::Cleanup => write!(f, "cleanup"),
        }
    }
}

/// Held for the duration of a job; dropping it releases the lock
pub struct JobGuard {
    kind: JobKind,
    _guard: OwnedMutexGuard<()>,
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        debug!("Released {} lock", self.kind);
    }
}

#[derive(Default)]
pub struct JobLocks {
    backup: Arc<Mutex<()>>,
    cleanup: Arc<Mutex<()>>,
}

impl JobLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock for `kind` without waiting; `JobBusy` if a run is in flight
    pub fn try_acquire(&self, kind: JobKind) -> Result<JobGuard> {
        let lock = match kind {
            JobKind::Backup => &self.backup,
            JobKind::Cleanup => &self.cleanup,
        };

        let guard = lock
            .clone()
            .try_lock_owned()
            .map_err(|_| MailvaultError::JobBusy(format!("a {} is already running", kind)))?;

        debug!("Acquired {} lock", kind);
        Ok(JobGuard { kind, _guard: guard })
    }
}
