use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::providers::errors::ProviderError;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum AgentError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid tool name: {0}")]
    InvalidToolName(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AgentResult<T> = Result<T, AgentError>;

/// Failures that end a conversation turn
#[derive(Error, Debug)]
pub enum ReplyError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("The model stream ended before a complete message was received")]
    IncompleteStream,

    #[error("Stopped after {0} tool rounds without a final answer")]
    TooManyToolRounds(usize),
}

/// Start-up configuration problems, fatal for the binaries
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing in environment: {}", names.join(", "))]
    MissingEnvVars { names: Vec<String> },

    #[error(transparent)]
    Other(#[from] config::ConfigError),
}

impl ConfigError {
    /// The environment variable names that are missing, empty for other kinds
    pub fn missing(&self) -> &[String] {
        match self {
            ConfigError::MissingEnvVars { names } => names,
            _ => &[],
        }
    }
}
