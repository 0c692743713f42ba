use futures::stream::BoxStream;
use futures::StreamExt;

use crate::errors::{AgentError, AgentResult, ReplyError};
use crate::models::content::Content;
use crate::models::message::{Message, ToolRequest};
use crate::models::tool::{Tool, ToolCall};
use crate::providers::base::{Provider, StreamChunk};
use crate::systems::System;

/// Upper bound on model/tool exchanges within a single turn
pub const MAX_TOOL_ROUNDS: usize = 10;

/// One item of a streamed reply
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyEvent {
    /// A fragment of assistant text
    Delta(String),
    /// A complete message to append to the history
    Message(Message),
    /// The turn is finished, emitted exactly once
    Done,
}

/// Agent integrates a foundational LLM with the systems it needs to pilot
pub struct Agent {
    systems: Vec<Box<dyn System>>,
    provider: Box<dyn Provider>,
    instructions: String,
}

impl Agent {
    /// Create a new Agent with the specified provider and fixed instructions
    pub fn new<S: Into<String>>(provider: Box<dyn Provider>, instructions: S) -> Self {
        Self {
            systems: Vec::new(),
            provider,
            instructions: instructions.into(),
        }
    }

    /// Add a system to the agent
    pub fn add_system(&mut self, system: Box<dyn System>) {
        self.systems.push(system);
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Get all tools from all systems with proper system prefixing
    fn get_prefixed_tools(&self) -> Vec<Tool> {
        let mut tools = Vec::new();
        for system in &self.systems {
            for tool in system.tools() {
                tools.push(Tool::new(
                    format!("{}__{}", system.name(), tool.name),
                    &tool.description,
                    tool.parameters.clone(),
                ));
            }
        }
        tools
    }

    /// Find the appropriate system for a tool call based on the prefixed name
    fn get_system_for_tool(&self, prefixed_name: &str) -> Option<&dyn System> {
        let parts: Vec<&str> = prefixed_name.split("__").collect();
        if parts.len() != 2 {
            return None;
        }
        let system_name = parts[0];
        self.systems
            .iter()
            .find(|sys| sys.name() == system_name)
            .map(|v| &**v)
    }

    /// Dispatch a single tool call to the appropriate system
    async fn dispatch_tool_call(
        &self,
        tool_call: AgentResult<ToolCall>,
    ) -> AgentResult<Vec<Content>> {
        let call = tool_call?;
        let system = self
            .get_system_for_tool(&call.name)
            .ok_or_else(|| AgentError::ToolNotFound(call.name.clone()))?;

        let tool_name = call
            .name
            .split("__")
            .nth(1)
            .ok_or_else(|| AgentError::InvalidToolName(call.name.clone()))?;
        let system_tool_call = ToolCall::new(tool_name, call.arguments);

        tracing::debug!(tool = %call.name, "dispatching tool call");
        let result = system.call(system_tool_call).await;
        if let Err(e) = &result {
            tracing::debug!(tool = %call.name, error = %e, "tool call failed");
        }
        result
    }

    /// Run every tool request in `response`, returning the message that answers them
    ///
    /// `None` means the model asked for nothing and the turn is complete.
    async fn respond_to_tools(&self, response: &Message) -> Option<Message> {
        let tool_requests: Vec<&ToolRequest> = response
            .content
            .iter()
            .filter_map(|content| content.as_tool_request())
            .collect();

        if tool_requests.is_empty() {
            return None;
        }

        // Process all the futures in parallel but wait until all are finished
        let futures: Vec<_> = tool_requests
            .iter()
            .map(|request| self.dispatch_tool_call(request.tool_call.clone()))
            .collect();
        let outputs = futures::future::join_all(futures).await;

        // Combine the results into one message, keeping the original request ids
        let mut message_tool_response = Message::user();
        for (request, output) in tool_requests.iter().zip(outputs.into_iter()) {
            message_tool_response =
                message_tool_response.with_tool_response(request.id.clone(), output);
        }
        Some(message_tool_response)
    }

    /// Create a stream that yields each message as it's generated by the agent.
    /// This includes both the assistant's responses and any tool responses.
    pub fn reply(&self, messages: &[Message]) -> BoxStream<'_, Result<Message, ReplyError>> {
        let mut messages = messages.to_vec();
        let tools = self.get_prefixed_tools();

        Box::pin(async_stream::try_stream! {
            let mut rounds = 0;
            loop {
                let (response, _) = self.provider.complete(
                    &self.instructions,
                    &messages,
                    &tools,
                ).await?;

                yield response.clone();

                // Ensures the message above reaches the caller before tools start running
                tokio::task::yield_now().await;

                let Some(tool_response) = self.respond_to_tools(&response).await else {
                    break;
                };
                yield tool_response.clone();

                messages.push(response);
                messages.push(tool_response);

                rounds += 1;
                if rounds >= MAX_TOOL_ROUNDS {
                    Err::<(), _>(ReplyError::TooManyToolRounds(MAX_TOOL_ROUNDS))?;
                }
            }
        })
    }

    /// Like [`Agent::reply`], but also yields the assistant text as it arrives
    ///
    /// Concatenating the deltas in order gives the text of the assistant messages. A successful
    /// stream always ends with a single [`ReplyEvent::Done`].
    pub fn reply_streaming(
        &self,
        messages: &[Message],
    ) -> BoxStream<'_, Result<ReplyEvent, ReplyError>> {
        let mut messages = messages.to_vec();
        let tools = self.get_prefixed_tools();

        Box::pin(async_stream::try_stream! {
            let mut rounds = 0;
            loop {
                let mut chunks = self.provider.stream(
                    &self.instructions,
                    &messages,
                    &tools,
                ).await?;

                let mut response = None;
                while let Some(chunk) = chunks.next().await {
                    match chunk? {
                        StreamChunk::Text(delta) => {
                            yield ReplyEvent::Delta(delta);
                        }
                        StreamChunk::Complete(message) => {
                            response = Some(message);
                        }
                    }
                }
                let response = response.ok_or(ReplyError::IncompleteStream)?;
                yield ReplyEvent::Message(response.clone());

                let Some(tool_response) = self.respond_to_tools(&response).await else {
                    break;
                };
                yield ReplyEvent::Message(tool_response.clone());

                messages.push(response);
                messages.push(tool_response);

                rounds += 1;
                if rounds >= MAX_TOOL_ROUNDS {
                    Err::<(), _>(ReplyError::TooManyToolRounds(MAX_TOOL_ROUNDS))?;
                }
            }
            yield ReplyEvent::Done;
        })
    }
}
