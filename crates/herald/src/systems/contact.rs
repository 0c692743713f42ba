use async_trait::async_trait;
use indoc::formatdoc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use super::System;
use crate::errors::{AgentError, AgentResult};
use crate::models::content::Content;
use crate::models::lead::LeadRecord;
use crate::models::tool::{Tool, ToolCall};
use crate::notifier::Notifier;
use crate::prompt_template::load_html_prompt;

pub const SYSTEM_NAME: &str = "contact";
pub const TOOL_NAME: &str = "lead_capture";

const SUBJECT_QUESTION_CHARS: usize = 50;
const LEAD_EMAIL_TEMPLATE: &str = include_str!("../prompts/lead_email.html");

/// The name the model sees for the lead capture tool
pub fn lead_tool_wire_name() -> String {
    format!("{}__{}", SYSTEM_NAME, TOOL_NAME)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureStatus {
    Ok,
    Error,
}

/// What the model is told after a lead was validated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureOutcome {
    pub status: CaptureStatus,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
struct LeadCaptureArgs {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    question: String,
}

#[derive(Serialize)]
struct LeadEmailContext<'a> {
    person: &'a str,
    name: &'a str,
    email: &'a str,
    question: &'a str,
}

/// Records inquiries the agent cannot answer and forwards them to the represented person
pub struct ContactSystem {
    person: String,
    notifier: Arc<dyn Notifier>,
    tools: Vec<Tool>,
}

impl ContactSystem {
    pub fn new<S: Into<String>>(person: S, notifier: Arc<dyn Notifier>) -> Self {
        let person = person.into();
        let lead_capture = Tool::new(
            TOOL_NAME,
            formatdoc! {r#"
                Use this when you cannot answer the user's question from the persona content,
                for example salary, private project details, or anything not in {person}'s public bio.
                Records their full name, email and the specific question, then notifies {person} so
                they can follow up.
            "#,
                person = person
            },
            json!({
                "type": "object",
                "required": ["name", "email", "question"],
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Full name of the person making the inquiry."
                    },
                    "email": {
                        "type": "string",
                        "description": "Email address where they can be reached."
                    },
                    "question": {
                        "type": "string",
                        "description": "The specific question or topic they asked that could not be answered."
                    }
                }
            }),
        );

        Self {
            person,
            notifier,
            tools: vec![lead_capture],
        }
    }

    /// Validate the fields and forward the inquiry
    ///
    /// A delivery failure is reported in the outcome, only invalid fields are an error.
    pub async fn capture(
        &self,
        name: &str,
        email: &str,
        question: &str,
    ) -> AgentResult<CaptureOutcome> {
        let record = LeadRecord::new(name, email, question)?;
        self.notify(&record).await
    }

    async fn notify(&self, record: &LeadRecord) -> AgentResult<CaptureOutcome> {
        let subject = lead_subject(record);
        let body = load_html_prompt(
            LEAD_EMAIL_TEMPLATE,
            &LeadEmailContext {
                person: &self.person,
                name: &record.name,
                email: &record.email,
                question: &record.question,
            },
        )
        .map_err(|e| AgentError::Internal(e.to_string()))?;

        let notification = self.notifier.send(&subject, &body).await;
        if notification.is_sent() {
            tracing::info!(name = %record.name, "lead captured and forwarded");
            Ok(CaptureOutcome {
                status: CaptureStatus::Ok,
                message: format!("Inquiry recorded; {} will be notified.", self.person),
            })
        } else {
            tracing::warn!(name = %record.name, reason = %notification.message, "lead captured but not forwarded");
            Ok(CaptureOutcome {
                status: CaptureStatus::Error,
                message: notification.message,
            })
        }
    }

    async fn lead_capture(&self, arguments: serde_json::Value) -> AgentResult<Vec<Content>> {
        let args: LeadCaptureArgs = serde_json::from_value(arguments)
            .map_err(|e| AgentError::InvalidParameters(e.to_string()))?;
        let record = LeadRecord::new(args.name, args.email, args.question)?;
        let outcome = self.notify(&record).await?;

        let outcome =
            serde_json::to_string(&outcome).map_err(|e| AgentError::Internal(e.to_string()))?;
        Ok(vec![Content::text(outcome), Content::lead(record)])
    }
}

fn lead_subject(record: &LeadRecord) -> String {
    let excerpt: String = record.question.chars().take(SUBJECT_QUESTION_CHARS).collect();
    format!("[Lead] {} – {}...", record.name, excerpt)
}

#[async_trait]
impl System for ContactSystem {
    fn name(&self) -> &str {
        SYSTEM_NAME
    }

    fn tools(&self) -> &[Tool] {
        &self.tools
    }

    async fn call(&self, tool_call: ToolCall) -> AgentResult<Vec<Content>> {
        match tool_call.name.as_str() {
            TOOL_NAME => self.lead_capture(tool_call.arguments).await,
            _ => Err(AgentError::ToolNotFound(tool_call.name)),
        }
    }
}
