use serde::Serialize;
use std::path::Path;

use crate::errors::{AgentError, AgentResult};
use crate::knowledge::load_knowledge_dir;
use crate::prompt_template::load_prompt;
use crate::systems::contact;

pub const DEFAULT_PERSON: &str = "Daniel David";

/// Used when the knowledge directory has nothing to offer
pub const DEFAULT_BIO: &str = "Daniel David is a CS student at Columbia University (class of 2026) and an ML Engineer at Rhino HealthTech.
His work focuses on ML Security, Federated Learning, and NVFlare. He is professional, approachable, and witty.";

const PERSONA_TEMPLATE: &str = include_str!("prompts/persona.md");

#[derive(Serialize)]
struct PersonaContext<'a> {
    person: &'a str,
    persona_section: &'a str,
    tool_name: String,
}

/// The individual the agent represents
#[derive(Debug, Clone, PartialEq)]
pub struct Persona {
    name: String,
}

impl Default for Persona {
    fn default() -> Self {
        Self::new(DEFAULT_PERSON)
    }
}

impl Persona {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build the agent instructions around `knowledge`, or the default bio when it is blank
    pub fn build(&self, knowledge: &str) -> AgentResult<String> {
        let knowledge = knowledge.trim();
        let persona_section = if knowledge.is_empty() {
            DEFAULT_BIO
        } else {
            knowledge
        };

        let context = PersonaContext {
            person: &self.name,
            persona_section,
            tool_name: contact::lead_tool_wire_name(),
        };
        load_prompt(PERSONA_TEMPLATE, &context).map_err(|e| AgentError::Internal(e.to_string()))
    }

    /// Load the knowledge directory and build the instructions from it
    pub fn build_from_dir(&self, dir: Option<&Path>) -> AgentResult<String> {
        self.build(&load_knowledge_dir(dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_blank_knowledge_uses_default_bio_verbatim() {
        let instructions = Persona::default().build("  \n ").unwrap();

        assert!(instructions.contains(DEFAULT_BIO));
        assert!(instructions
            .starts_with("You are the professional representative and gatekeeper for Daniel David."));
    }

    #[test]
    fn test_knowledge_replaces_default_bio() {
        let instructions = Persona::new("Ada Lovelace")
            .build("  Ada writes notes on the Analytical Engine.  ")
            .unwrap();

        assert!(instructions.contains("\nAda writes notes on the Analytical Engine.\n"));
        assert!(!instructions.contains(DEFAULT_BIO));
        assert!(instructions.contains("Ada Lovelace will get back to them"));
    }

    #[test]
    fn test_sections_in_fixed_order() {
        let instructions = Persona::default().build("").unwrap();

        let framing = instructions.find("gatekeeper").unwrap();
        let persona = instructions.find(DEFAULT_BIO).unwrap();
        let grounding = instructions.find("## What you must NOT do").unwrap();
        let fallback = instructions.find("## When you cannot answer").unwrap();
        assert!(framing < persona && persona < grounding && grounding < fallback);
        assert!(instructions.contains("Use the contact__lead_capture tool"));
    }

    #[test]
    fn test_unsupported_only_dir_uses_default_bio() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("diagram.svg"), "<svg/>").unwrap();

        let instructions = Persona::default().build_from_dir(Some(dir.path())).unwrap();
        assert!(instructions.contains(DEFAULT_BIO));
    }

    #[test]
    fn test_readme_never_reaches_instructions() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "SECRET-README-MARKER").unwrap();
        fs::write(dir.path().join("bio.md"), "Daniel mentors new engineers.").unwrap();

        let instructions = Persona::default().build_from_dir(Some(dir.path())).unwrap();
        assert!(instructions.contains("--- From bio.md ---\nDaniel mentors new engineers."));
        assert!(!instructions.contains("SECRET-README-MARKER"));
    }
}
