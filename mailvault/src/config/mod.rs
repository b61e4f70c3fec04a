use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::types::error::{MailvaultError, Result};

/// Environment variable pointing at an explicit TOML config file
pub const CONFIG_PATH_ENV: &str = "MAILVAULT_CONFIG";

/// Application configuration
///
/// Every field is optional in the TOML file; environment variables override
/// whatever the file provides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root directory for the database, raw messages and attachments
    pub storage_path: PathBuf,

    /// OAuth client secrets downloaded from the Google console
    pub credentials_file: PathBuf,

    /// Authorized-user token file (access + refresh token)
    pub token_file: PathBuf,

    /// Label whose messages get archived
    pub backup_label: String,

    /// Label that protects a message from cleanup
    pub keep_label: String,

    /// Messages older than this many days are trashed by cleanup
    pub retention_days: u32,

    /// Optional document-management drop directory for attachments
    pub export_dir: Option<PathBuf>,

    /// ntfy topic for run notifications
    pub ntfy_topic: Option<String>,

    /// ntfy server base URL
    pub ntfy_server: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("/data"),
            credentials_file: PathBuf::from("/config/credentials.json"),
            token_file: PathBuf::from("/config/token.json"),
            backup_label: "Backup".to_string(),
            keep_label: "Keep".to_string(),
            retention_days: 730,
            export_dir: None,
            ntfy_topic: None,
            ntfy_server: "https://ntfy.sh".to_string(),
        }
    }
}

/// On-disk layout under the storage root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    pub db_path: PathBuf,
    pub raw_dir: PathBuf,
    pub attachments_dir: PathBuf,
    pub export_dir: Option<PathBuf>,
}

impl StorageLayout {
    pub fn new(storage_path: &Path, export_dir: Option<PathBuf>) -> Self {
        Self {
            db_path: storage_path.join("db").join("emails.db"),
            raw_dir: storage_path.join("raw"),
            attachments_dir: storage_path.join("attachments"),
            export_dir,
        }
    }

    /// Create the raw and attachment directories
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.raw_dir)?;
        fs::create_dir_all(&self.attachments_dir)?;
        Ok(())
    }
}

impl AppConfig {
    /// Load defaults, then the optional TOML file, then environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match config_file_path() {
            Some(path) => Self::from_file(&path)?,
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        info!("Loading configuration from: {:?}", path);

        let content = fs::read_to_string(path)
            .map_err(|e| MailvaultError::Config(format!("Failed to read config: {}", e)))?;

        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| MailvaultError::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config.normalized())
    }

    /// Apply environment overrides through `lookup` (usually `std::env::var`)
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("BACKUP_STORAGE_PATH") {
            self.storage_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("GOOGLE_CREDENTIALS_FILE") {
            self.credentials_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("GOOGLE_TOKEN_FILE") {
            self.token_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("EMAIL_BACKUP_LABEL") {
            self.backup_label = v;
        }
        if let Some(v) = lookup("EMAIL_KEEP_LABEL") {
            self.keep_label = v;
        }
        if let Some(v) = lookup("RETENTION_DAYS") {
            self.retention_days = v.trim().parse().map_err(|_| {
                MailvaultError::Config(format!("RETENTION_DAYS must be a whole number of days, got '{}'", v))
            })?;
        }
        if let Some(v) = lookup("PAPERLESS_CONSUME_DIR") {
            self.export_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("NTFY_TOPIC") {
            self.ntfy_topic = Some(v);
        }
        if let Some(v) = lookup("NTFY_SERVER") {
            self.ntfy_server = v;
        }

        *self = std::mem::take(self).normalized();
        Ok(())
    }

    /// Derived storage layout
    pub fn layout(&self) -> StorageLayout {
        StorageLayout::new(&self.storage_path, self.export_dir.clone())
    }

    // Empty strings mean "unset" for the optional settings
    fn normalized(mut self) -> Self {
        if self.export_dir.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            self.export_dir = None;
        }
        if self.ntfy_topic.as_ref().is_some_and(|t| t.trim().is_empty()) {
            self.ntfy_topic = None;
        }
        self
    }
}

/// Resolve the config file: explicit env var first, then the XDG location
fn config_file_path() -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var(CONFIG_PATH_ENV) {
        if !explicit.is_empty() {
            return Some(PathBuf::from(explicit));
        }
    }

    dirs::config_dir()
        .map(|dir| dir.join("mailvault").join("config.toml"))
        .filter(|path| path.exists())
}
