//! Remote mailbox access
//!
//! The sync and cleanup passes only talk to the mailbox through
//! [`RemoteMailbox`]; [`GmailClient`] is the production implementation over
//! the Gmail REST API.

mod auth;
mod client;
#[cfg(test)]
pub mod fake;

pub use auth::TokenStore;
pub use client::GmailClient;

use async_trait::async_trait;

use crate::types::error::Result;

/// Page size used for every listing call
pub const PAGE_SIZE: u32 = 100;

/// Which messages a listing should return
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListFilter {
    /// Messages carrying this label id
    Label(String),
    /// Messages matching a Gmail search query, e.g. `before:1700000000`
    Query(String),
}

/// A listed message, before any content is fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    pub id: String,
    pub thread_id: String,
}

/// One page of a message listing
#[derive(Debug, Clone, Default)]
pub struct MessagePage {
    pub messages: Vec<MessageRef>,
    /// Opaque continuation token, absent on the last page
    pub next_page_token: Option<String>,
}

/// Full message content in RFC 5322 form
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub id: String,
    pub thread_id: String,
    pub raw: Vec<u8>,
    pub snippet: String,
    pub label_ids: Vec<String>,
}

/// Labels plus a handful of headers, without the body
#[derive(Debug, Clone, Default)]
pub struct MessageMetadata {
    pub id: String,
    pub label_ids: Vec<String>,
    pub headers: Vec<(String, String)>,
}

impl MessageMetadata {
    /// First header with this name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[async_trait]
pub trait RemoteMailbox: Send + Sync {
    /// Resolve a label name to its id; `None` when no such label exists
    async fn label_id(&self, name: &str) -> Result<Option<String>>;

    /// List one page of messages
    async fn list_messages(&self, filter: &ListFilter, page_token: Option<&str>) -> Result<MessagePage>;

    /// Fetch the raw message bytes together with snippet and labels
    async fn fetch_raw(&self, id: &str) -> Result<RawMessage>;

    /// Fetch labels and the requested headers only
    async fn fetch_metadata(&self, id: &str, headers: &[&str]) -> Result<MessageMetadata>;

    /// Move a message to the trash (recoverable, not a purge)
    async fn trash(&self, id: &str) -> Result<()>;
}
