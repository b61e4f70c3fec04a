//! Backup and cleanup passes against the remote mailbox
//!
//! Both passes are sequential: one page is listed, its messages are handled
//! one at a time, then the next page is requested.

pub mod helpers;
pub mod tasks;

use crate::adapters::gmail::RemoteMailbox;
use crate::adapters::ntfy::Notifier;
use crate::adapters::sqlite::DbPool;
use crate::config::StorageLayout;

/// Collaborators shared by the backup and cleanup passes
pub struct JobContext<'a> {
    pub pool: &'a DbPool,
    pub mailbox: &'a dyn RemoteMailbox,
    pub notifier: &'a dyn Notifier,
    pub layout: &'a StorageLayout,
}
