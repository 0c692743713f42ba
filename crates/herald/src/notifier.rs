use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::env;
use std::time::Duration;

pub const SENDGRID_HOST: &str = "https://api.sendgrid.com";
pub const DEFAULT_EMAIL_FROM: &str = "noreply@example.com";
pub const DEFAULT_EMAIL_TO: &str = "daniel@example.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Sent,
    Error,
}

/// Outcome of a single delivery attempt, never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub status: NotificationStatus,
    pub message: String,
}

impl Notification {
    pub fn sent<S: Into<String>>(message: S) -> Self {
        Self {
            status: NotificationStatus::Sent,
            message: message.into(),
        }
    }

    pub fn error<S: Into<String>>(message: S) -> Self {
        Self {
            status: NotificationStatus::Error,
            message: message.into(),
        }
    }

    pub fn is_sent(&self) -> bool {
        self.status == NotificationStatus::Sent
    }
}

/// Delivers an HTML message to the represented person
///
/// Failures are reported in the returned [`Notification`], never raised.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, subject: &str, html_body: &str) -> Notification;
}

/// Sends mail through the SendGrid v3 API
///
/// Credentials and addresses are read from the environment on every send, so a key added
/// after start-up is picked up without a restart.
pub struct SendGridNotifier {
    client: Client,
    host: String,
}

impl SendGridNotifier {
    pub fn new() -> Self {
        Self::with_host(SENDGRID_HOST)
    }

    pub fn with_host<S: Into<String>>(host: S) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            host: host.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for SendGridNotifier {
    fn default() -> Self {
        Self::new()
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[async_trait]
impl Notifier for SendGridNotifier {
    async fn send(&self, subject: &str, html_body: &str) -> Notification {
        let Some(api_key) = env::var("SENDGRID_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
        else {
            return Notification::error("SENDGRID_API_KEY not set");
        };
        let from = env_or("EMAIL_FROM", DEFAULT_EMAIL_FROM);
        let to = env_or("EMAIL_TO", DEFAULT_EMAIL_TO);

        let payload = json!({
            "personalizations": [{"to": [{"email": to}]}],
            "from": {"email": from},
            "subject": subject,
            "content": [{"type": "text/html", "value": html_body}]
        });

        let response = self
            .client
            .post(format!("{}/v3/mail/send", self.host))
            .bearer_auth(api_key.trim())
            .json(&payload)
            .send()
            .await;

        match response {
            Ok(response) => match response.status() {
                StatusCode::OK | StatusCode::ACCEPTED => Notification::sent("Email delivered"),
                status => {
                    tracing::warn!(%status, "SendGrid rejected the notification");
                    Notification::error(format!("SendGrid returned {}", status.as_u16()))
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "could not reach SendGrid");
                Notification::error(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn clean_env() {
        for key in ["SENDGRID_API_KEY", "EMAIL_FROM", "EMAIL_TO"] {
            env::remove_var(key);
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_key_is_reported_not_raised() {
        clean_env();

        let notifier = SendGridNotifier::with_host("http://127.0.0.1:9");
        let result = notifier.send("subject", "<p>body</p>").await;

        assert_eq!(result, Notification::error("SENDGRID_API_KEY not set"));
    }

    #[tokio::test]
    #[serial]
    async fn test_accepted_is_sent() {
        clean_env();
        env::set_var("SENDGRID_API_KEY", "SG.test");
        env::set_var("EMAIL_TO", "owner@example.com");

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/mail/send"))
            .and(header("authorization", "Bearer SG.test"))
            .and(body_partial_json(json!({
                "personalizations": [{"to": [{"email": "owner@example.com"}]}],
                "from": {"email": DEFAULT_EMAIL_FROM},
                "subject": "[Lead] Jane",
                "content": [{"type": "text/html", "value": "<p>hi</p>"}]
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = SendGridNotifier::with_host(server.uri());
        let result = notifier.send("[Lead] Jane", "<p>hi</p>").await;

        assert_eq!(result, Notification::sent("Email delivered"));
        assert!(result.is_sent());
        clean_env();
    }

    #[tokio::test]
    #[serial]
    async fn test_rejected_status_is_error() {
        clean_env();
        env::set_var("SENDGRID_API_KEY", "SG.bad");

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/mail/send"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let notifier = SendGridNotifier::with_host(server.uri());
        let result = notifier.send("subject", "body").await;

        assert_eq!(result, Notification::error("SendGrid returned 401"));
        clean_env();
    }

    #[tokio::test]
    #[serial]
    async fn test_transport_failure_is_error() {
        clean_env();
        env::set_var("SENDGRID_API_KEY", "SG.test");

        let notifier = SendGridNotifier::with_host("http://127.0.0.1:9");
        let result = notifier.send("subject", "body").await;

        assert_eq!(result.status, NotificationStatus::Error);
        assert!(!result.message.is_empty());
        clean_env();
    }
}
