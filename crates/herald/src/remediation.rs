//! User-facing help for failed turns
use indoc::indoc;

use crate::errors::{ConfigError, ReplyError};
use crate::providers::errors::ProviderError;

pub const CONNECTION_HELP: &str = indoc! {"
    Connection error talking to Azure OpenAI (this app uses Azure, not the direct OpenAI API). Check:
      • .env uses Azure vars: AZURE_OPENAI_API_KEY and AZURE_OPENAI_ENDPOINT (not OPENAI_API_KEY)
      • AZURE_OPENAI_ENDPOINT looks like https://YOUR-RESOURCE.openai.azure.com
      • AZURE_OPENAI_API_KEY is the key from Azure portal for that resource
      • Network can reach Azure (no VPN/firewall blocking)
      • AZURE_OPENAI_DEPLOYMENT_NAME matches a deployment in your Azure resource (e.g. gpt-4o-mini)
"};

pub const DEPLOYMENT_HELP: &str = indoc! {"
    DeploymentNotFound (404): AZURE_OPENAI_DEPLOYMENT_NAME doesn't match any deployment in your Azure resource.
      • Open https://portal.azure.com, then your OpenAI resource, then \"Model deployments\".
      • Copy the exact deployment NAME (the one you gave when you created it, e.g. \"gpt-4o-mini\").
      • Set AZURE_OPENAI_DEPLOYMENT_NAME in .env to that exact name and run again.
"};

pub const CONFIG_HELP: &str =
    "Make sure .env uses Azure vars: AZURE_OPENAI_API_KEY, AZURE_OPENAI_ENDPOINT (not OPENAI_API_KEY).";

pub const AZURE_PORTAL_NOTE: &str = "\n(This app uses Azure OpenAI. Use https://portal.azure.com and your OpenAI resource for keys, deployments, and logs, not platform.openai.com.)";

/// Append the Azure portal note when `message` points at OpenAI's own platform
pub fn with_azure_note(message: String) -> String {
    if message.to_lowercase().contains("openai.com") {
        message + AZURE_PORTAL_NOTE
    } else {
        message
    }
}

/// Turn a failed turn into text that can be shown to the user as-is
pub fn describe(err: &ReplyError) -> String {
    match err {
        ReplyError::Provider(e) if e.is_connectivity() => {
            format!("{}\n{}", with_azure_note(e.to_string()), CONNECTION_HELP)
        }
        ReplyError::Provider(e @ ProviderError::DeploymentNotFound(_)) => {
            format!("Error: {}\n{}", with_azure_note(e.to_string()), DEPLOYMENT_HELP)
        }
        other => with_azure_note(format!("Sorry, an error occurred: {}", other)),
    }
}

/// Start-up failure text, printed before the binaries exit
pub fn describe_config(err: &ConfigError) -> String {
    format!("Config error: {}\n{}", err, CONFIG_HELP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AgentError;

    #[test]
    fn test_connection_errors_get_connection_help() {
        let text = describe(&ReplyError::Provider(ProviderError::Connection(
            "tcp connect error".into(),
        )));
        assert!(text.starts_with("Connection error: tcp connect error\n"));
        assert!(text.contains(CONNECTION_HELP));

        let text = describe(&ReplyError::Provider(ProviderError::Timeout("30s".into())));
        assert!(text.contains(CONNECTION_HELP));
    }

    #[test]
    fn test_deployment_not_found_gets_deployment_help() {
        let text = describe(&ReplyError::Provider(ProviderError::DeploymentNotFound(
            "no such deployment".into(),
        )));
        assert!(text.contains(DEPLOYMENT_HELP));
        assert!(!text.contains(CONNECTION_HELP));
    }

    #[test]
    fn test_other_errors_are_generic() {
        let text = describe(&ReplyError::Agent(AgentError::Internal("boom".into())));
        assert_eq!(text, "Sorry, an error occurred: Internal error: boom");
    }

    #[test]
    fn test_openai_mentions_get_portal_note() {
        let text = describe(&ReplyError::Provider(ProviderError::Api {
            status: 429,
            message: "See https://platform.openai.com/account/limits".into(),
        }));
        assert!(text.ends_with(AZURE_PORTAL_NOTE));
    }

    #[test]
    fn test_config_description_lists_missing_names() {
        let err = ConfigError::MissingEnvVars {
            names: vec!["AZURE_OPENAI_API_KEY".into(), "AZURE_OPENAI_ENDPOINT".into()],
        };
        let text = describe_config(&err);
        assert!(text.contains("AZURE_OPENAI_API_KEY, AZURE_OPENAI_ENDPOINT"));
        assert!(text.ends_with(CONFIG_HELP));
    }
}
