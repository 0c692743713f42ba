use regex::Regex;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};

use super::errors::ProviderError;
use crate::errors::AgentError;
use crate::models::content::Content;
use crate::models::message::{Message, MessageContent};
use crate::models::role::Role;
use crate::models::tool::{Tool, ToolCall};

/// Placeholder used on the wire for tool requests that could not be parsed, so the matching
/// tool response still pairs with a declared call
const INVALID_TOOL_NAME: &str = "invalid_tool_call";

/// Convert internal Message format to OpenAI's API message specification
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    let mut messages_spec = Vec::new();

    for message in messages {
        let mut converted = json!({
            "role": message.role
        });
        let mut tool_calls = Vec::new();
        let mut output = Vec::new();

        for content in &message.content {
            match content {
                MessageContent::Text(text) => {
                    if !text.text.is_empty() {
                        converted["content"] = json!(text.text);
                    }
                }
                MessageContent::ToolRequest(request) => {
                    let (name, arguments) = match &request.tool_call {
                        Ok(tool_call) => (
                            sanitize_function_name(&tool_call.name),
                            tool_call.arguments.to_string(),
                        ),
                        Err(_) => (INVALID_TOOL_NAME.to_string(), "{}".to_string()),
                    };
                    tool_calls.push(json!({
                        "id": request.id,
                        "type": "function",
                        "function": {
                            "name": name,
                            "arguments": arguments,
                        }
                    }));
                }
                MessageContent::ToolResponse(response) => {
                    let content = match &response.tool_result {
                        // Leads stay with the session; the model only sees the text outcome
                        Ok(contents) => contents
                            .iter()
                            .filter(|content| content.is_model_visible())
                            .filter_map(Content::as_text)
                            .collect::<Vec<_>>()
                            .join("\n"),
                        // A tool result error is shown as output so the model can interpret the error message
                        Err(e) => format!("The tool call returned the following error:\n{}", e),
                    };
                    output.push(json!({
                        "role": "tool",
                        "content": content,
                        "tool_call_id": response.id
                    }));
                }
            }
        }

        if !tool_calls.is_empty() {
            converted["tool_calls"] = json!(tool_calls);
        }
        if converted.get("content").is_some() || converted.get("tool_calls").is_some() {
            output.insert(0, converted);
        }
        messages_spec.extend(output);
    }

    messages_spec
}

/// Convert internal Tool format to OpenAI's API tool specification
pub fn tools_to_openai_spec(tools: &[Tool]) -> Result<Vec<Value>, ProviderError> {
    let mut tool_names = HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(ProviderError::Request(format!(
                "Duplicate tool name: {}",
                tool.name
            )));
        }

        result.push(json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters,
            }
        }));
    }

    Ok(result)
}

/// Build the chat completions body with the instructions as the single leading system message
pub fn create_request_payload(
    system: &str,
    messages: &[Message],
    tools: &[Tool],
) -> Result<Value, ProviderError> {
    let mut messages_array = vec![json!({
        "role": "system",
        "content": system
    })];
    messages_array.extend(messages_to_openai_spec(messages));

    let mut payload = json!({
        "messages": messages_array
    });

    let tools_spec = tools_to_openai_spec(tools)?;
    if !tools_spec.is_empty() {
        payload["tools"] = json!(tools_spec);
    }

    Ok(payload)
}

/// Convert OpenAI's API response to internal Message format
pub fn openai_response_to_message(response: &Value) -> Result<Message, ProviderError> {
    let original = response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| ProviderError::Parse(format!("No message in response: {}", response)))?;
    let mut content = Vec::new();

    if let Some(text) = original.get("content").and_then(|t| t.as_str()) {
        if !text.is_empty() {
            content.push(MessageContent::text(text));
        }
    }

    if let Some(tool_calls) = original.get("tool_calls").and_then(|t| t.as_array()) {
        for tool_call in tool_calls {
            let id = tool_call["id"].as_str().unwrap_or_default().to_string();
            let function_name = tool_call["function"]["name"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            let arguments = tool_call["function"]["arguments"]
                .as_str()
                .unwrap_or_default();

            if !is_valid_function_name(&function_name) {
                let error = AgentError::ToolNotFound(format!(
                    "The provided function name '{}' had invalid characters, it must match this regex [a-zA-Z0-9_-]+",
                    function_name
                ));
                content.push(MessageContent::tool_request(id, Err(error)));
                continue;
            }

            // Some deployments send an empty string for tools without parameters
            let arguments = if arguments.trim().is_empty() { "{}" } else { arguments };
            match serde_json::from_str::<Value>(arguments) {
                Ok(params) => {
                    content.push(MessageContent::tool_request(
                        id,
                        Ok(ToolCall::new(&function_name, params)),
                    ));
                }
                Err(e) => {
                    let error = AgentError::InvalidParameters(format!(
                        "Could not interpret tool use parameters for id {}: {}",
                        id, e
                    ));
                    content.push(MessageContent::tool_request(id, Err(error)));
                }
            }
        }
    }

    Ok(Message {
        role: Role::Assistant,
        created: chrono::Utc::now().timestamp(),
        content,
    })
}

fn sanitize_function_name(name: &str) -> String {
    let re = Regex::new(r"[^a-zA-Z0-9_-]").unwrap();
    re.replace_all(name, "_").to_string()
}

fn is_valid_function_name(name: &str) -> bool {
    let re = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
    re.is_match(name)
}

/// One decoded `data:` line of a server-sent event stream
#[derive(Debug, PartialEq)]
pub enum SseData {
    Json(Value),
    Done,
    Ignore,
}

pub fn parse_sse_line(line: &str) -> Result<SseData, ProviderError> {
    let Some(data) = line.trim().strip_prefix("data:") else {
        return Ok(SseData::Ignore);
    };
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(SseData::Done);
    }
    if data.is_empty() {
        return Ok(SseData::Ignore);
    }
    serde_json::from_str(data)
        .map(SseData::Json)
        .map_err(|e| ProviderError::Parse(format!("Invalid stream event {}: {}", data, e)))
}

/// Splits a byte stream into complete lines, holding back any partial line
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);
            if !line.is_empty() {
                lines.push(line.to_string());
            }
        }
        lines
    }

    /// Whatever is left once the stream has ended
    pub fn finish(&mut self) -> Option<String> {
        let rest = String::from_utf8_lossy(&std::mem::take(&mut self.pending))
            .trim()
            .to_string();
        (!rest.is_empty()).then_some(rest)
    }
}

#[derive(Debug, Default)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

/// Rebuilds a complete chat completion from streamed deltas
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    text: String,
    tool_calls: BTreeMap<u64, PartialToolCall>,
}

impl StreamAccumulator {
    /// Fold one chunk in, returning its text delta if it carried one
    pub fn push(&mut self, chunk: &Value) -> Option<String> {
        let delta = chunk.get("choices")?.get(0)?.get("delta")?;

        if let Some(calls) = delta.get("tool_calls").and_then(|c| c.as_array()) {
            for call in calls {
                let index = call["index"].as_u64().unwrap_or_default();
                let entry = self.tool_calls.entry(index).or_default();
                if let Some(id) = call["id"].as_str() {
                    entry.id.push_str(id);
                }
                if let Some(name) = call["function"]["name"].as_str() {
                    entry.name.push_str(name);
                }
                if let Some(arguments) = call["function"]["arguments"].as_str() {
                    entry.arguments.push_str(arguments);
                }
            }
        }

        let text = delta.get("content")?.as_str()?;
        if text.is_empty() {
            return None;
        }
        self.text.push_str(text);
        Some(text.to_string())
    }

    pub fn finish(self) -> Result<Message, ProviderError> {
        let tool_calls: Vec<Value> = self
            .tool_calls
            .into_values()
            .map(|call| {
                json!({
                    "id": call.id,
                    "type": "function",
                    "function": {
                        "name": call.name,
                        "arguments": call.arguments,
                    }
                })
            })
            .collect();

        let mut message = json!({
            "role": "assistant",
            "content": self.text,
        });
        if !tool_calls.is_empty() {
            message["tool_calls"] = json!(tool_calls);
        }

        openai_response_to_message(&json!({ "choices": [{ "message": message }] }))
    }
}
