use config::{Config, Environment};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::agent::Agent;
use crate::errors::ConfigError;
use crate::knowledge::DEFAULT_KNOWLEDGE_DIR;
use crate::notifier::Notifier;
use crate::persona::{Persona, DEFAULT_PERSON};
use crate::providers::azure::AzureOpenAiProvider;
use crate::providers::configs::AzureOpenAiProviderConfig;
use crate::systems::contact::ContactSystem;

#[derive(Debug, Deserialize)]
struct HeraldSettings {
    #[serde(default = "default_knowledge_dir")]
    knowledge_dir: PathBuf,
    #[serde(default = "default_persona_name")]
    persona_name: String,
}

fn default_knowledge_dir() -> PathBuf {
    PathBuf::from(DEFAULT_KNOWLEDGE_DIR)
}

fn default_persona_name() -> String {
    DEFAULT_PERSON.to_string()
}

/// Everything needed to build an [`Agent`]
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub provider: AzureOpenAiProviderConfig,
    pub persona: Persona,
    pub knowledge_dir: PathBuf,
}

impl AgentConfig {
    /// Load the Azure connection and the `HERALD_*` agent settings from the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let provider = AzureOpenAiProviderConfig::from_env()?;

        let settings: HeraldSettings = Config::builder()
            .add_source(
                Environment::with_prefix("HERALD")
                    .prefix_separator("_")
                    .separator("__")
                    .ignore_empty(true),
            )
            .build()?
            .try_deserialize()?;

        let persona_name = settings.persona_name.trim();
        let persona = if persona_name.is_empty() {
            Persona::default()
        } else {
            Persona::new(persona_name)
        };

        Ok(Self {
            provider,
            persona,
            knowledge_dir: settings.knowledge_dir,
        })
    }

    pub fn with_knowledge_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.knowledge_dir = dir.into();
        self
    }
}

/// Build the representative: the Azure provider, persona instructions from the knowledge
/// directory and the contact system delivering through `notifier`
pub fn build_agent(config: &AgentConfig, notifier: Arc<dyn Notifier>) -> anyhow::Result<Agent> {
    let provider = AzureOpenAiProvider::new(config.provider.clone())?;
    let instructions = config
        .persona
        .build_from_dir(Some(config.knowledge_dir.as_path()))?;

    let mut agent = Agent::new(Box::new(provider), instructions);
    agent.add_system(Box::new(ContactSystem::new(
        config.persona.name(),
        notifier,
    )));

    tracing::info!(
        deployment = %config.provider.deployment,
        knowledge_dir = %config.knowledge_dir.display(),
        "agent initialized"
    );
    Ok(agent)
}
