use config::{Config, Environment};
use serde::Deserialize;

use crate::errors::ConfigError;

pub const DEFAULT_API_VERSION: &str = "2024-12-01-preview";
pub const DEFAULT_DEPLOYMENT: &str = "gpt-4o-mini";

const ENV_PREFIX: &str = "AZURE_OPENAI";

/// Connection settings for an Azure OpenAI deployment
#[derive(Debug, Clone, PartialEq)]
pub struct AzureOpenAiProviderConfig {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    pub deployment: String,
}

#[derive(Debug, Deserialize)]
struct AzureSettings {
    api_key: Option<String>,
    endpoint: Option<String>,
    api_version: String,
    deployment_name: String,
}

impl AzureOpenAiProviderConfig {
    pub fn new<E, K>(endpoint: E, api_key: K) -> Self
    where
        E: Into<String>,
        K: Into<String>,
    {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            deployment: DEFAULT_DEPLOYMENT.to_string(),
        }
    }

    /// Read `AZURE_OPENAI_*` from the environment
    ///
    /// Every missing required variable is reported at once.
    pub fn from_env() -> Result<Self, ConfigError> {
        let settings: AzureSettings = Config::builder()
            .set_default("api_version", DEFAULT_API_VERSION)?
            .set_default("deployment_name", DEFAULT_DEPLOYMENT)?
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .ignore_empty(true),
            )
            .build()?
            .try_deserialize()?;

        let api_key = non_blank(settings.api_key);
        let endpoint = non_blank(settings.endpoint);

        let mut missing = Vec::new();
        if api_key.is_none() {
            missing.push(format!("{}_API_KEY", ENV_PREFIX));
        }
        if endpoint.is_none() {
            missing.push(format!("{}_ENDPOINT", ENV_PREFIX));
        }

        match (endpoint, api_key) {
            (Some(endpoint), Some(api_key)) => Ok(Self {
                endpoint: endpoint.trim_end_matches('/').to_string(),
                api_key,
                api_version: settings.api_version,
                deployment: settings.deployment_name,
            }),
            _ => Err(ConfigError::MissingEnvVars { names: missing }),
        }
    }

    pub fn chat_completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions",
            self.endpoint, self.deployment
        )
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const VARS: [&str; 4] = [
        "AZURE_OPENAI_API_KEY",
        "AZURE_OPENAI_ENDPOINT",
        "AZURE_OPENAI_API_VERSION",
        "AZURE_OPENAI_DEPLOYMENT_NAME",
    ];

    fn clean_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_missing_required_vars_are_all_listed() {
        clean_env();

        let err = AzureOpenAiProviderConfig::from_env().unwrap_err();
        assert_eq!(
            err.missing(),
            &["AZURE_OPENAI_API_KEY".to_string(), "AZURE_OPENAI_ENDPOINT".to_string()]
        );
        assert_eq!(
            err.to_string(),
            "Missing in environment: AZURE_OPENAI_API_KEY, AZURE_OPENAI_ENDPOINT"
        );
    }

    #[test]
    #[serial]
    fn test_empty_value_counts_as_missing() {
        clean_env();
        env::set_var("AZURE_OPENAI_API_KEY", "test-key");
        env::set_var("AZURE_OPENAI_ENDPOINT", "");

        let err = AzureOpenAiProviderConfig::from_env().unwrap_err();
        assert_eq!(err.missing(), &["AZURE_OPENAI_ENDPOINT".to_string()]);

        clean_env();
    }

    #[test]
    #[serial]
    fn test_defaults_and_trailing_slash() {
        clean_env();
        env::set_var("AZURE_OPENAI_API_KEY", "test-key");
        env::set_var("AZURE_OPENAI_ENDPOINT", "https://example.openai.azure.com/");

        let config = AzureOpenAiProviderConfig::from_env().unwrap();
        assert_eq!(config.endpoint, "https://example.openai.azure.com");
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.deployment, DEFAULT_DEPLOYMENT);
        assert_eq!(
            config.chat_completions_url(),
            "https://example.openai.azure.com/openai/deployments/gpt-4o-mini/chat/completions"
        );

        clean_env();
    }

    #[test]
    #[serial]
    fn test_environment_override() {
        clean_env();
        env::set_var("AZURE_OPENAI_API_KEY", "test-key");
        env::set_var("AZURE_OPENAI_ENDPOINT", "https://example.openai.azure.com");
        env::set_var("AZURE_OPENAI_API_VERSION", "2024-06-01");
        env::set_var("AZURE_OPENAI_DEPLOYMENT_NAME", "herald-4o");

        let config = AzureOpenAiProviderConfig::from_env().unwrap();
        assert_eq!(config.api_version, "2024-06-01");
        assert_eq!(config.deployment, "herald-4o");
        assert_eq!(config.api_key, "test-key");

        clean_env();
    }
}
