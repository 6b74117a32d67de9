//! Transactional email through the platform's edge function.

use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Clone)]
pub struct Notifier {
    http_client: reqwest::Client,
    endpoint: Option<String>,
}

impl Notifier {
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Sends `email` and reports whether the edge function accepted it.
    /// Failures are logged and never reach the caller.
    pub async fn send(&self, email: Email) -> bool {
        let Some(endpoint) = &self.endpoint else {
            debug!(to = %email.to, subject = %email.subject, "no email endpoint configured, skipping");
            return false;
        };

        let response = self.http_client.post(endpoint).json(&email).send().await;
        match response.and_then(|r| r.error_for_status()) {
            Ok(_) => {
                info!(to = %email.to, "email sent");
                true
            }
            Err(e) => {
                warn!("email to {} failed: {e}", email.to);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_notifier_skips() {
        let notifier = Notifier::new(None);
        let sent = notifier
            .send(Email {
                to: "a@b.example".to_owned(),
                subject: "hi".to_owned(),
                body: "there".to_owned(),
            })
            .await;
        assert!(!sent);
    }
}
