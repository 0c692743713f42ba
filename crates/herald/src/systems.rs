use async_trait::async_trait;

use crate::errors::AgentResult;
use crate::models::content::Content;
use crate::models::tool::{Tool, ToolCall};

pub mod contact;

/// Core trait that defines a system that can be operated by an AI agent
#[async_trait]
pub trait System: Send + Sync {
    /// Get the name of the system, used to prefix its tools
    fn name(&self) -> &str;

    /// Get available tools
    fn tools(&self) -> &[Tool];

    /// Call a tool with the given parameters
    ///
    /// Validation errors are returned as [`crate::errors::AgentError`] so the agent can hand
    /// them back to the model.
    async fn call(&self, tool_call: ToolCall) -> AgentResult<Vec<Content>>;
}
