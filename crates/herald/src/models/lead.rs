use serde::{Deserialize, Serialize};

use crate::errors::{AgentError, AgentResult};

/// Contact details and the unanswered question of a visitor, kept for a personal follow-up
///
/// A record only exists once its fields passed validation, and it is never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub name: String,
    pub email: String,
    pub question: String,
}

impl LeadRecord {
    /// Validate and build a lead. `name` and `question` must contain something other than
    /// whitespace. `email` only has to be present: its format is not checked.
    pub fn new<N, E, Q>(name: N, email: E, question: Q) -> AgentResult<Self>
    where
        N: Into<String>,
        E: Into<String>,
        Q: Into<String>,
    {
        let name = name.into().trim().to_string();
        let email = email.into().trim().to_string();
        let question = question.into().trim().to_string();

        let mut missing = Vec::new();
        if name.is_empty() {
            missing.push("name");
        }
        if email.is_empty() {
            missing.push("email");
        }
        if question.is_empty() {
            missing.push("question");
        }
        if !missing.is_empty() {
            return Err(AgentError::Validation(format!(
                "Missing required lead fields: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            name,
            email,
            question,
        })
    }
}

/// Append-only, ordered log of the leads captured during one session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadLog {
    records: Vec<LeadRecord>,
}

impl LeadLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: LeadRecord) {
        self.records.push(record);
    }

    pub fn extend<I: IntoIterator<Item = LeadRecord>>(&mut self, records: I) {
        self.records.extend(records);
    }

    pub fn records(&self) -> &[LeadRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
