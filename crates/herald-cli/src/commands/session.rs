use anyhow::Result;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use herald::config::{build_agent, AgentConfig};
use herald::knowledge::has_knowledge_files;
use herald::notifier::SendGridNotifier;
use herald::remediation;

use crate::prompt::rustyline::RustylinePrompt;
use crate::session::Session;

/// Load the configuration, exiting with the remediation text when it is incomplete
pub fn load_config(knowledge_dir: Option<PathBuf>) -> AgentConfig {
    let config = match AgentConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", remediation::describe_config(&e));
            process::exit(1);
        }
    };
    match knowledge_dir {
        Some(dir) => config.with_knowledge_dir(dir),
        None => config,
    }
}

pub fn build_session(knowledge_dir: Option<PathBuf>) -> Result<Session<'static>> {
    let config = load_config(knowledge_dir);
    let agent = build_agent(&config, Arc::new(SendGridNotifier::new()))?;

    Ok(Session::new(
        agent,
        Box::new(RustylinePrompt::new()?),
        config.persona.name(),
        has_knowledge_files(&config.knowledge_dir)
            .then(|| config.knowledge_dir.display().to_string()),
    ))
}

pub async fn execute(knowledge_dir: Option<PathBuf>) -> Result<()> {
    let mut session = build_session(knowledge_dir)?;
    session.start().await
}
