//! OAuth token handling for the Gmail API
//!
//! Reads the authorized-user token file written by Google's client
//! libraries, refreshes the access token with the refresh-token grant when it
//! is about to expire, and writes the refreshed token back. Interactive
//! consent is not handled here: the token file must already exist.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::types::error::{MailvaultError, Result};

const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Refresh when less than this many seconds remain
const REFRESH_SKEW_SECONDS: i64 = 300;

/// Authorized-user token file (`token.json`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AuthorizedUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expiry: Option<String>,
    /// Scopes, account and anything else we don't interpret
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

/// Client secrets file (`credentials.json`) as downloaded from the console
#[derive(Debug, Deserialize)]
struct ClientSecrets {
    installed: Option<ClientSecretEntry>,
    web: Option<ClientSecretEntry>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretEntry {
    client_id: String,
    client_secret: Option<String>,
    token_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
}

/// Access-token source shared by every Gmail request
pub struct TokenStore {
    token_path: PathBuf,
    http: reqwest::Client,
    state: Mutex<AuthorizedUser>,
}

impl TokenStore {
    /// Load the token file, borrowing client id/secret from the secrets file if needed.
    ///
    /// Missing credential material is a fatal [`MailvaultError::Credential`].
    pub fn load(credentials_file: &Path, token_file: &Path) -> Result<Self> {
        if !token_file.exists() {
            if !credentials_file.exists() {
                return Err(MailvaultError::Credential(format!(
                    "No credentials file found at {:?}",
                    credentials_file
                )));
            }
            return Err(MailvaultError::Credential(format!(
                "No token found at {:?}; authorize this client with Google and save the authorized-user token there",
                token_file
            )));
        }

        let content = std::fs::read_to_string(token_file)
            .map_err(|e| MailvaultError::Credential(format!("Failed to read token file: {}", e)))?;
        let mut user: AuthorizedUser = serde_json::from_str(&content)
            .map_err(|e| MailvaultError::Credential(format!("Failed to parse token file: {}", e)))?;

        if user.client_id.is_none() || user.client_secret.is_none() {
            if let Some(entry) = read_client_secrets(credentials_file)? {
                user.client_id.get_or_insert(entry.client_id);
                if let Some(secret) = entry.client_secret {
                    user.client_secret.get_or_insert(secret);
                }
                if let Some(uri) = entry.token_uri {
                    user.token_uri.get_or_insert(uri);
                }
            }
        }

        if user.token.is_none() && user.refresh_token.is_none() {
            return Err(MailvaultError::Credential(format!(
                "Token file {:?} holds neither an access token nor a refresh token",
                token_file
            )));
        }

        Ok(Self {
            token_path: token_file.to_path_buf(),
            http: reqwest::Client::new(),
            state: Mutex::new(user),
        })
    }

    /// A valid access token, refreshing it first when close to expiry
    pub async fn access_token(&self) -> Result<String> {
        let mut user = self.state.lock().await;

        if let Some(token) = &user.token {
            if is_fresh(user.expiry.as_deref(), Utc::now()) {
                return Ok(token.clone());
            }
        }

        info!("Refreshing expired Gmail access token");
        let response = self.refresh(&user).await?;

        let expiry = response
            .expires_in
            .map(|secs| (Utc::now() + Duration::seconds(secs)).to_rfc3339());

        user.token = Some(response.access_token.clone());
        user.expiry = expiry;
        // Google rarely rotates refresh tokens; keep the old one otherwise
        if let Some(rotated) = response.refresh_token {
            user.refresh_token = Some(rotated);
        }

        if let Err(e) = self.persist(&user) {
            warn!("Failed to save refreshed token to {:?}: {}", self.token_path, e);
        }

        Ok(response.access_token)
    }

    async fn refresh(&self, user: &AuthorizedUser) -> Result<TokenResponse> {
        let refresh_token = user.refresh_token.as_deref().ok_or_else(|| {
            MailvaultError::Credential("Access token expired and no refresh token is available".into())
        })?;
        let client_id = user.client_id.as_deref().ok_or_else(|| {
            MailvaultError::Credential("No OAuth client id in token or credentials file".into())
        })?;
        let token_url = user.token_uri.as_deref().unwrap_or(GOOGLE_TOKEN_URL);

        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
        ];
        if let Some(secret) = user.client_secret.as_deref() {
            params.push(("client_secret", secret));
        }

        debug!("Requesting access token from {}", token_url);

        let response = self
            .http
            .post(token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| MailvaultError::Network(format!("Token refresh request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(MailvaultError::Credential(format!(
                "Token refresh failed ({}): {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| MailvaultError::Credential(format!("Invalid token response: {}", e)))
    }

    fn persist(&self, user: &AuthorizedUser) -> Result<()> {
        if let Some(parent) = self.token_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.token_path, serde_json::to_string_pretty(user)?)?;
        debug!("Token saved to {:?}", self.token_path);
        Ok(())
    }
}

fn read_client_secrets(path: &Path) -> Result<Option<ClientSecretEntry>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let secrets: ClientSecrets = serde_json::from_str(&content)
        .map_err(|e| MailvaultError::Credential(format!("Failed to parse credentials file: {}", e)))?;
    Ok(secrets.installed.or(secrets.web))
}

/// Whether a token with this expiry can still be used at `now`.
/// Unknown or unparsable expiry counts as stale.
fn is_fresh(expiry: Option<&str>, now: DateTime<Utc>) -> bool {
    expiry
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|exp| exp.with_timezone(&Utc) - now > Duration::seconds(REFRESH_SKEW_SECONDS))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_credentials_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = TokenStore::load(&dir.path().join("credentials.json"), &dir.path().join("token.json"))
            .err()
            .expect("load must fail");

        assert!(err.is_fatal());
        assert!(err.to_string().contains("credentials"));
    }

    #[test]
    fn test_missing_token_with_credentials_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let creds = dir.path().join("credentials.json");
        fs::write(&creds, r#"{"installed": {"client_id": "id", "client_secret": "secret"}}"#).unwrap();

        let err = TokenStore::load(&creds, &dir.path().join("token.json"))
            .err()
            .expect("load must fail");
        assert!(matches!(err, MailvaultError::Credential(_)));
    }

    #[tokio::test]
    async fn test_fresh_token_is_used_without_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let token = dir.path().join("token.json");
        let expiry = (Utc::now() + Duration::hours(1)).to_rfc3339();
        fs::write(
            &token,
            format!(r#"{{"token": "ya29.abc", "refresh_token": "1//r", "expiry": "{}", "scopes": ["x"]}}"#, expiry),
        )
        .unwrap();

        let store = TokenStore::load(&dir.path().join("credentials.json"), &token).unwrap();
        assert_eq!(store.access_token().await.unwrap(), "ya29.abc");
    }

    #[test]
    fn test_client_id_falls_back_to_credentials_file() {
        let dir = tempfile::tempdir().unwrap();
        let creds = dir.path().join("credentials.json");
        let token = dir.path().join("token.json");
        fs::write(&creds, r#"{"web": {"client_id": "web-id", "client_secret": "s", "token_uri": "https://t"}}"#).unwrap();
        fs::write(&token, r#"{"refresh_token": "1//r"}"#).unwrap();

        let store = TokenStore::load(&creds, &token).unwrap();
        let user = store.state.try_lock().unwrap();
        assert_eq!(user.client_id.as_deref(), Some("web-id"));
        assert_eq!(user.token_uri.as_deref(), Some("https://t"));
    }

    #[test]
    fn test_is_fresh() {
        let now = Utc::now();
        let later = (now + Duration::minutes(30)).to_rfc3339();
        let soon = (now + Duration::minutes(2)).to_rfc3339();

        assert!(is_fresh(Some(&later), now));
        assert!(!is_fresh(Some(&soon), now));
        assert!(!is_fresh(Some("not a date"), now));
        assert!(!is_fresh(None, now));
        // Format written by Google's Python client
        assert!(is_fresh(Some("2999-01-01T00:00:00.123456Z"), now));
    }
}
