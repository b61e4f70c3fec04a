//! Scripted in-memory mailbox for exercising the sync and cleanup passes

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

use super::{ListFilter, MessageMetadata, MessagePage, MessageRef, RawMessage, RemoteMailbox};
use crate::types::error::{MailvaultError, Result};

#[derive(Debug, Clone)]
pub struct FakeMessage {
    pub id: String,
    pub thread_id: String,
    pub raw: Vec<u8>,
    pub label_ids: Vec<String>,
    /// Internal date used to answer `before:<epoch>` queries
    pub date_epoch: i64,
}

impl FakeMessage {
    pub fn new(id: &str, raw: Vec<u8>, label_ids: &[&str], date_epoch: i64) -> Self {
        Self {
            id: id.to_string(),
            thread_id: format!("t-{}", id),
            raw,
            label_ids: label_ids.iter().map(|l| l.to_string()).collect(),
            date_epoch,
        }
    }
}

pub struct FakeMailbox {
    labels: Vec<(String, String)>,
    messages: Vec<FakeMessage>,
    page_size: usize,
    fail_list_on_page: Option<usize>,
    fail_fetch: HashSet<String>,
    revoke_at: Option<String>,
    pub trashed: Mutex<Vec<String>>,
    pub fetched: Mutex<Vec<String>>,
}

impl FakeMailbox {
    pub fn new() -> Self {
        Self {
            labels: Vec::new(),
            messages: Vec::new(),
            page_size: 100,
            fail_list_on_page: None,
            fail_fetch: HashSet::new(),
            revoke_at: None,
            trashed: Mutex::new(Vec::new()),
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn with_label(mut self, name: &str, id: &str) -> Self {
        self.labels.push((name.to_string(), id.to_string()));
        self
    }

    pub fn with_message(mut self, message: FakeMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Make the listing of the zero-based page `page` fail
    pub fn failing_list_on_page(mut self, page: usize) -> Self {
        self.fail_list_on_page = Some(page);
        self
    }

    pub fn failing_fetch(mut self, id: &str) -> Self {
        self.fail_fetch.insert(id.to_string());
        self
    }

    /// Answer every call for `id` with a credential error, as a revoked
    /// refresh token would
    pub fn revoking_credentials_at(mut self, id: &str) -> Self {
        self.revoke_at = Some(id.to_string());
        self
    }

    pub fn trashed_ids(&self) -> Vec<String> {
        self.trashed.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetched.lock().unwrap().len()
    }

    fn matches(message: &FakeMessage, filter: &ListFilter) -> bool {
        match filter {
            ListFilter::Label(id) => message.label_ids.iter().any(|l| l == id),
            ListFilter::Query(q) => match q.strip_prefix("before:").and_then(|e| e.parse::<i64>().ok()) {
                Some(before) => message.date_epoch < before,
                None => false,
            },
        }
    }

    fn find(&self, id: &str) -> Result<&FakeMessage> {
        if self.revoke_at.as_deref() == Some(id) {
            return Err(MailvaultError::Credential("scripted token revocation".into()));
        }
        if self.fail_fetch.contains(id) {
            return Err(MailvaultError::Remote(format!("scripted failure for {}", id)));
        }
        self.messages
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| MailvaultError::Remote(format!("Gmail API error (404) for {}", id)))
    }
}

#[async_trait]
impl RemoteMailbox for FakeMailbox {
    async fn label_id(&self, name: &str) -> Result<Option<String>> {
        Ok(self.labels.iter().find(|(n, _)| n == name).map(|(_, id)| id.clone()))
    }

    async fn list_messages(&self, filter: &ListFilter, page_token: Option<&str>) -> Result<MessagePage> {
        let offset: usize = page_token.and_then(|t| t.parse().ok()).unwrap_or(0);
        if self.fail_list_on_page == Some(offset / self.page_size) {
            return Err(MailvaultError::Network("scripted listing failure".into()));
        }

        let matching: Vec<&FakeMessage> = self.messages.iter().filter(|m| Self::matches(m, filter)).collect();
        let end = (offset + self.page_size).min(matching.len());

        Ok(MessagePage {
            messages: matching[offset.min(end)..end]
                .iter()
                .map(|m| MessageRef {
                    id: m.id.clone(),
                    thread_id: m.thread_id.clone(),
                })
                .collect(),
            next_page_token: (end < matching.len()).then(|| end.to_string()),
        })
    }

    async fn fetch_raw(&self, id: &str) -> Result<RawMessage> {
        self.fetched.lock().unwrap().push(id.to_string());
        let message = self.find(id)?;
        Ok(RawMessage {
            id: message.id.clone(),
            thread_id: message.thread_id.clone(),
            raw: message.raw.clone(),
            snippet: format!("snippet of {}", message.id),
            label_ids: message.label_ids.clone(),
        })
    }

    async fn fetch_metadata(&self, id: &str, _headers: &[&str]) -> Result<MessageMetadata> {
        let message = self.find(id)?;
        Ok(MessageMetadata {
            id: message.id.clone(),
            label_ids: message.label_ids.clone(),
            headers: vec![("Subject".to_string(), format!("Message {}", message.id))],
        })
    }

    async fn trash(&self, id: &str) -> Result<()> {
        self.find(id)?;
        self.trashed.lock().unwrap().push(id.to_string());
        Ok(())
    }
}

/// A minimal single-part RFC 5322 message
pub fn plain_email(message_id: Option<&str>, subject: &str, date: &str, body: &str) -> Vec<u8> {
    let mut raw = String::new();
    if let Some(id) = message_id {
        raw.push_str(&format!("Message-ID: {}\r\n", id));
    }
    raw.push_str(&format!(
        "From: Alice <alice@example.com>\r\nTo: bob@example.com\r\nSubject: {}\r\nDate: {}\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\r\n{}\r\n",
        subject, date, body
    ));
    raw.into_bytes()
}

/// A multipart message with a text body and one PDF attachment
pub fn email_with_pdf(message_id: &str, subject: &str, date: &str, body: &str, filename: &str) -> Vec<u8> {
    format!(
        "Message-ID: {id}\r\n\
         From: billing@example.com\r\n\
         To: bob@example.com\r\n\
         Subject: {subject}\r\n\
         Date: {date}\r\n\
         MIME-Version: 1.0\r\n\
         Content-Type: multipart/mixed; boundary=\"b1\"\r\n\
         \r\n\
         --b1\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\
         \r\n\
         {body}\r\n\
         --b1\r\n\
         Content-Type: application/pdf; name=\"{filename}\"\r\n\
         Content-Disposition: attachment; filename=\"{filename}\"\r\n\
         Content-Transfer-Encoding: base64\r\n\
         \r\n\
         JVBERi0xLjQKJcfsj6IKMSAwIG9iago8PD4+CmVuZG9iagp0cmFpbGVyCjw8Pj4KJSVFT0YK\r\n\
         --b1--\r\n",
        id = message_id,
        subject = subject,
        date = date,
        body = body,
        filename = filename,
    )
    .into_bytes()
}
