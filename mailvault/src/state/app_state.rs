use tracing::info;

use super::JobLocks;
use crate::adapters::gmail::{GmailClient, TokenStore};
use crate::adapters::ntfy::{self, Notifier};
use crate::adapters::sqlite::{db, DbPool};
use crate::config::{AppConfig, StorageLayout};
use crate::types::error::Result;

/// Everything a command needs, opened once per process
pub struct AppState {
    pub config: AppConfig,
    pub layout: StorageLayout,
    pub pool: DbPool,
    pub notifier: Box<dyn Notifier>,
    pub locks: JobLocks,
}

impl AppState {
    /// Create the storage directories and open the archive database
    pub fn open(config: AppConfig) -> Result<Self> {
        let layout = config.layout();
        layout.ensure_dirs()?;
        let pool = db::initialize(&layout.db_path)?;
        let notifier = ntfy::from_config(&config);

        info!("Archive storage at {:?}", config.storage_path);

        Ok(Self {
            config,
            layout,
            pool,
            notifier,
            locks: JobLocks::new(),
        })
    }

    /// Gmail client for this configuration; fails when credentials are missing
    pub fn gmail(&self) -> Result<GmailClient> {
        let tokens = TokenStore::load(&self.config.credentials_file, &self.config.token_file)?;
        GmailClient::new(tokens)
    }
}
