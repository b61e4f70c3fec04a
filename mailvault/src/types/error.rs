//! Unified error types for the archiver
//!
//! Errors fall into two groups:
//! - fatal ones (configuration, credentials, missing label) stop the whole
//!   pass, even when raised while handling a single message
//! - everything else is recoverable per message and only gets logged and
//!   counted by the sync and cleanup passes

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailvaultError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Label not found: {0}")]
    LabelNotFound(String),

    #[error("Remote mailbox error: {0}")]
    Remote(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Job already running: {0}")]
    JobBusy(String),
}

impl MailvaultError {
    /// Whether this error must stop the whole pass rather than fail one item.
    /// An expired or revoked credential fails every later call the same way.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MailvaultError::Config(_)
                | MailvaultError::Credential(_)
                | MailvaultError::LabelNotFound(_)
        )
    }
}

impl From<std::io::Error> for MailvaultError {
    fn from(err: std::io::Error) -> Self {
        MailvaultError::Io(err.to_string())
    }
}

impl From<rusqlite::Error> for MailvaultError {
    fn from(err: rusqlite::Error) -> Self {
        MailvaultError::Database(err.to_string())
    }
}

impl From<r2d2::Error> for MailvaultError {
    fn from(err: r2d2::Error) -> Self {
        MailvaultError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for MailvaultError {
    fn from(err: serde_json::Error) -> Self {
        MailvaultError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for MailvaultError {
    fn from(err: toml::de::Error) -> Self {
        MailvaultError::Config(err.to_string())
    }
}

/// Result type alias using MailvaultError
pub type Result<T> = std::result::Result<T, MailvaultError>;
