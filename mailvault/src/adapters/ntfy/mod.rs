//! Outbound push notifications through ntfy
//!
//! Notifications are advisory: a failed delivery is logged and dropped, it
//! never fails the job that triggered it.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::AppConfig;

/// ntfy priority levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    #[default]
    Default,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Default => "default",
            Priority::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub priority: Priority,
    /// Emoji shortcodes, e.g. `wastebasket`
    pub tags: Vec<String>,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            priority: Priority::Default,
            tags: Vec::new(),
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification);
}

/// Build the notifier for this configuration
pub fn from_config(config: &AppConfig) -> Box<dyn Notifier> {
    match &config.ntfy_topic {
        Some(topic) => match NtfyNotifier::new(&config.ntfy_server, topic) {
            Some(notifier) => Box::new(notifier),
            None => Box::new(NoopNotifier),
        },
        None => {
            debug!("NTFY_TOPIC not set, notifications disabled");
            Box::new(NoopNotifier)
        }
    }
}

pub struct NtfyNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl NtfyNotifier {
    /// `None` when the HTTP client cannot be built
    pub fn new(server: &str, topic: &str) -> Option<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| warn!("Failed to build ntfy HTTP client: {}", e))
            .ok()?;

        Some(Self {
            client,
            endpoint: format!("{}/{}", server.trim_end_matches('/'), topic),
        })
    }
}

#[async_trait]
impl Notifier for NtfyNotifier {
    async fn notify(&self, notification: Notification) {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Title", notification.title.as_str())
            .header("Priority", notification.priority.as_str());
        if !notification.tags.is_empty() {
            request = request.header("Tags", notification.tags.join(","));
        }

        match request.body(notification.message).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!("Sent ntfy notification: {}", notification.title);
            }
            Ok(resp) => warn!("ntfy returned {} for '{}'", resp.status(), notification.title),
            Err(e) => warn!("Failed to send ntfy notification: {}", e),
        }
    }
}

pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, notification: Notification) {
        debug!("Notification (not sent): {}", notification.title);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Keeps every notification for later assertions
    #[derive(Default)]
    pub(crate) struct RecordingNotifier {
        pub sent: Mutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        pub fn titles(&self) -> Vec<String> {
            self.sent.lock().unwrap().iter().map(|n| n.title.clone()).collect()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, notification: Notification) {
            self.sent.lock().unwrap().push(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_server_and_topic() {
        let notifier = NtfyNotifier::new("https://ntfy.example.com/", "mail").unwrap();
        assert_eq!(notifier.endpoint, "https://ntfy.example.com/mail");
    }

    #[test]
    fn test_builder() {
        let n = Notification::new("Email Backup", "2 archived")
            .priority(Priority::High)
            .tag("x");
        assert_eq!(n.priority.as_str(), "high");
        assert_eq!(n.tags, vec!["x"]);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_swallowed() {
        // Nothing listens on port 9 locally; the send fails and is only logged
        let notifier = NtfyNotifier::new("http://127.0.0.1:9", "topic").unwrap();
        notifier.notify(Notification::new("t", "m")).await;
    }
}
