use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use super::errors::ProviderError;
use crate::models::message::Message;
use crate::models::tool::Tool;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// One item of an incremental completion
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    /// A fragment of assistant text, in arrival order
    Text(String),
    /// The fully assembled message, always the last item of a successful stream
    Complete(Message),
}

pub type ChunkStream = BoxStream<'static, Result<StreamChunk, ProviderError>>;

/// Base trait for AI providers
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate the next message given the system instructions, the history and the tools
    async fn complete(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<(Message, Usage), ProviderError>;

    /// Generate the next message incrementally
    ///
    /// Providers without native streaming deliver the whole text as a single fragment.
    async fn stream(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<ChunkStream, ProviderError> {
        let (message, _) = self.complete(system, messages, tools).await?;
        let text = message.text();

        let mut chunks = Vec::new();
        if !text.is_empty() {
            chunks.push(Ok(StreamChunk::Text(text)));
        }
        chunks.push(Ok(StreamChunk::Complete(message)));
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}
