use async_trait::async_trait;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{
    auth::TokenStore, ListFilter, MessageMetadata, MessagePage, MessageRef, RawMessage, RemoteMailbox, PAGE_SIZE,
};
use crate::types::error::{MailvaultError, Result};

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Gmail hands out base64url with or without trailing padding
const RAW_ENGINE: GeneralPurpose =
    GeneralPurpose::new(&alphabet::URL_SAFE, PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent));

#[derive(Deserialize)]
struct LabelList {
    #[serde(default)]
    labels: Vec<LabelItem>,
}

#[derive(Deserialize)]
struct LabelItem {
    id: String,
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    messages: Vec<ListedMessage>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListedMessage {
    id: String,
    #[serde(default)]
    thread_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessage {
    id: String,
    #[serde(default)]
    thread_id: String,
    #[serde(default)]
    label_ids: Vec<String>,
    #[serde(default)]
    snippet: String,
    raw: Option<String>,
    payload: Option<Payload>,
}

#[derive(Deserialize)]
struct Payload {
    #[serde(default)]
    headers: Vec<Header>,
}

#[derive(Deserialize)]
struct Header {
    name: String,
    value: String,
}

/// [`RemoteMailbox`] over the Gmail REST API
pub struct GmailClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
}

impl GmailClient {
    pub fn new(tokens: TokenStore) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| MailvaultError::Network(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            http,
            base_url: GMAIL_API_BASE.to_string(),
            tokens,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let token = self.tokens.access_token().await?;

        let resp = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(|e| MailvaultError::Network(format!("Gmail request to {} failed: {}", path, e)))?;

        let resp = check_status(resp, path).await?;
        resp.json()
            .await
            .map_err(|e| MailvaultError::Parse(format!("Failed to parse Gmail response for {}: {}", path, e)))
    }
}

async fn check_status(resp: reqwest::Response, path: &str) -> Result<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    warn!("Gmail API returned {} for {}", status, path);
    Err(MailvaultError::Remote(format!("Gmail API error ({}) for {}: {}", status, path, body)))
}

#[async_trait]
impl RemoteMailbox for GmailClient {
    async fn label_id(&self, name: &str) -> Result<Option<String>> {
        let list: LabelList = self.get_json("/labels", &[]).await?;
        Ok(list.labels.into_iter().find(|l| l.name == name).map(|l| l.id))
    }

    async fn list_messages(&self, filter: &ListFilter, page_token: Option<&str>) -> Result<MessagePage> {
        let page_size = PAGE_SIZE.to_string();
        let mut query: Vec<(&str, &str)> = vec![("maxResults", page_size.as_str())];
        match filter {
            ListFilter::Label(id) => query.push(("labelIds", id.as_str())),
            ListFilter::Query(q) => query.push(("q", q.as_str())),
        }
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let resp: ListResponse = self.get_json("/messages", &query).await?;
        debug!(
            "Listed {} messages (more pages: {})",
            resp.messages.len(),
            resp.next_page_token.is_some()
        );

        Ok(MessagePage {
            messages: resp
                .messages
                .into_iter()
                .map(|m| MessageRef {
                    id: m.id,
                    thread_id: m.thread_id,
                })
                .collect(),
            next_page_token: resp.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn fetch_raw(&self, id: &str) -> Result<RawMessage> {
        let msg: GmailMessage = self
            .get_json(&format!("/messages/{}", id), &[("format", "raw")])
            .await?;

        let encoded = msg
            .raw
            .ok_or_else(|| MailvaultError::Parse(format!("Message {} has no raw content", id)))?;
        let raw = RAW_ENGINE
            .decode(encoded.trim())
            .map_err(|e| MailvaultError::Parse(format!("Invalid base64 for message {}: {}", id, e)))?;

        Ok(RawMessage {
            id: msg.id,
            thread_id: msg.thread_id,
            raw,
            snippet: msg.snippet,
            label_ids: msg.label_ids,
        })
    }

    async fn fetch_metadata(&self, id: &str, headers: &[&str]) -> Result<MessageMetadata> {
        let mut query = vec![("format", "metadata")];
        query.extend(headers.iter().map(|h| ("metadataHeaders", *h)));

        let msg: GmailMessage = self.get_json(&format!("/messages/{}", id), &query).await?;

        Ok(MessageMetadata {
            id: msg.id,
            label_ids: msg.label_ids,
            headers: msg
                .payload
                .map(|p| p.headers.into_iter().map(|h| (h.name, h.value)).collect())
                .unwrap_or_default(),
        })
    }

    async fn trash(&self, id: &str) -> Result<()> {
        let path = format!("/messages/{}/trash", id);
        let token = self.tokens.access_token().await?;

        let resp = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_LENGTH, 0)
            .send()
            .await
            .map_err(|e| MailvaultError::Network(format!("Gmail request to {} failed: {}", path, e)))?;

        check_status(resp, &path).await?;
        Ok(())
    }
}
