use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;

use super::base::{ChunkStream, Provider, StreamChunk, Usage};
use super::errors::ProviderError;
use crate::models::message::Message;
use crate::models::tool::Tool;

/// A mock provider that returns pre-configured responses for testing
pub struct MockProvider {
    responses: Mutex<VecDeque<Result<Message, ProviderError>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of responses
    pub fn new(responses: Vec<Message>) -> Self {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    /// Create a mock provider whose turns may also fail
    pub fn with_results(results: Vec<Result<Message, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(results.into()),
        }
    }

    async fn next(&self) -> Result<Message, ProviderError> {
        // Return empty response if no more pre-configured responses
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(Message::assistant().with_text("")))
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(
        &self,
        _system_prompt: &str,
        _messages: &[Message],
        _tools: &[Tool],
    ) -> Result<(Message, Usage), ProviderError> {
        Ok((self.next().await?, Usage::default()))
    }

    /// Streams the text one word at a time, keeping the separating whitespace
    async fn stream(
        &self,
        _system_prompt: &str,
        _messages: &[Message],
        _tools: &[Tool],
    ) -> Result<ChunkStream, ProviderError> {
        let message = self.next().await?;
        let text = message.text();

        let mut chunks: Vec<Result<StreamChunk, ProviderError>> = text
            .split_inclusive(' ')
            .map(|word| Ok(StreamChunk::Text(word.to_string())))
            .collect();
        chunks.push(Ok(StreamChunk::Complete(message)));
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}
