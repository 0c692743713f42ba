use serde::{Deserialize, Serialize};

use super::lead::LeadRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
/// Content returned by a system from a tool call
///
/// Only text is forwarded to the LLM. Leads are structured data for the session
/// that owns the conversation and never leave this process through the provider.
pub enum Content {
    Text(TextContent),
    Lead(LeadRecord),
}

impl Content {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Content::Text(TextContent { text: text.into() })
    }

    pub fn lead(record: LeadRecord) -> Self {
        Content::Lead(record)
    }

    /// Get the text content if this is a TextContent variant
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(text) => Some(&text.text),
            _ => None,
        }
    }

    /// Get the captured lead if this is a Lead variant
    pub fn as_lead(&self) -> Option<&LeadRecord> {
        match self {
            Content::Lead(record) => Some(record),
            _ => None,
        }
    }

    /// Whether this content should be shown to the model
    pub fn is_model_visible(&self) -> bool {
        matches!(self, Content::Text(_))
    }
}
