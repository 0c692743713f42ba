use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Failures talking to the hosted model, classified so callers can offer targeted help
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("DeploymentNotFound: {0}")]
    DeploymentNotFound(String),

    #[error("Context length exceeded. Message: {0}")]
    ContextLengthExceeded(String),

    #[error("Request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request error: {0}")]
    Request(String),

    #[error("Could not parse model response: {0}")]
    Parse(String),
}

impl ProviderError {
    /// Classify an error object returned by the API, using its structured `code` first
    /// and the HTTP status when no code is present
    pub fn from_api_error(status: StatusCode, error: &Value) -> Self {
        let code = error.get("code").and_then(|c| c.as_str()).unwrap_or_default();
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(String::from)
            .unwrap_or_else(|| {
                if error.is_null() {
                    status.to_string()
                } else {
                    error.to_string()
                }
            });

        match code {
            "DeploymentNotFound" => ProviderError::DeploymentNotFound(message),
            "context_length_exceeded" | "string_above_max_length" => {
                ProviderError::ContextLengthExceeded(message)
            }
            _ if status == StatusCode::NOT_FOUND => ProviderError::DeploymentNotFound(message),
            _ => ProviderError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Connection refused, DNS failures and timeouts
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ProviderError::Connection(_) | ProviderError::Timeout(_))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(err.to_string())
        } else if err.is_connect() {
            ProviderError::Connection(err.to_string())
        } else if err.is_decode() {
            ProviderError::Parse(err.to_string())
        } else {
            ProviderError::Request(err.to_string())
        }
    }
}
