use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

use super::base::{ChunkStream, Provider, StreamChunk, Usage};
use super::configs::AzureOpenAiProviderConfig;
use super::errors::ProviderError;
use super::utils::{
    create_request_payload, openai_response_to_message, parse_sse_line, SseData, SseLineBuffer,
    StreamAccumulator,
};
use crate::models::message::Message;
use crate::models::tool::Tool;

pub struct AzureOpenAiProvider {
    client: Client,
    config: AzureOpenAiProviderConfig,
}

impl AzureOpenAiProvider {
    pub fn new(config: AzureOpenAiProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    fn get_usage(data: &Value) -> Usage {
        let Some(usage) = data.get("usage") else {
            return Usage::default();
        };

        let input_tokens = usage
            .get("prompt_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);

        let output_tokens = usage
            .get("completion_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);

        let total_tokens = usage
            .get("total_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32)
            .or_else(|| match (input_tokens, output_tokens) {
                (Some(input), Some(output)) => Some(input + output),
                _ => None,
            });

        Usage::new(input_tokens, output_tokens, total_tokens)
    }

    async fn post(&self, payload: &Value) -> Result<Response, ProviderError> {
        let response = self
            .client
            .post(self.config.chat_completions_url())
            .query(&[("api-version", self.config.api_version.as_str())])
            .header("api-key", &self.config.api_key)
            .json(payload)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response),
            status => {
                let body: Value = response.json().await.unwrap_or(Value::Null);
                tracing::debug!(%status, %body, "chat completions request failed");
                Err(ProviderError::from_api_error(status, &body["error"]))
            }
        }
    }
}

#[async_trait]
impl Provider for AzureOpenAiProvider {
    async fn complete(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<(Message, Usage), ProviderError> {
        let payload = create_request_payload(system, messages, tools)?;
        let response: Value = self.post(&payload).await?.json().await?;

        // Errors can also arrive in a 200 body
        if let Some(error) = response.get("error") {
            return Err(ProviderError::from_api_error(StatusCode::OK, error));
        }

        let message = openai_response_to_message(&response)?;
        let usage = Self::get_usage(&response);

        Ok((message, usage))
    }

    async fn stream(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<ChunkStream, ProviderError> {
        let mut payload = create_request_payload(system, messages, tools)?;
        payload["stream"] = json!(true);

        let mut bytes = self.post(&payload).await?.bytes_stream();

        Ok(Box::pin(async_stream::try_stream! {
            let mut lines = SseLineBuffer::default();
            let mut accumulator = StreamAccumulator::default();
            let mut done = false;

            while let Some(chunk) = bytes.next().await {
                let chunk = chunk?;
                for line in lines.push(&chunk) {
                    match parse_sse_line(&line)? {
                        SseData::Done => done = true,
                        SseData::Json(event) => {
                            if let Some(error) = event.get("error") {
                                Err(ProviderError::from_api_error(StatusCode::OK, error))?;
                            }
                            if let Some(delta) = accumulator.push(&event) {
                                yield StreamChunk::Text(delta);
                            }
                        }
                        SseData::Ignore => {}
                    }
                }
                if done {
                    break;
                }
            }

            if !done {
                if let Some(line) = lines.finish() {
                    if let SseData::Json(event) = parse_sse_line(&line)? {
                        if let Some(delta) = accumulator.push(&event) {
                            yield StreamChunk::Text(delta);
                        }
                    }
                }
            }

            yield StreamChunk::Complete(accumulator.finish()?);
        }))
    }
}
