//! Completion backend contract
//!
//! A backend turns an ordered list of role-tagged messages into generated
//! text, either as one whole response or as an ordered stream of chunks
//! terminated by an explicit end-of-stream chunk.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Author of a message in a completion request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Options for a single completion call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Backend default model when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Tag recorded with the cost entry, usually the role id
    pub purpose: String,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 4096,
            model: None,
            purpose: "general".to_string(),
        }
    }
}

/// Whole-response completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub cost: f64,
    pub model: String,
}

/// Partial text delivered by a streaming completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    pub content: String,
    /// Set on the end-of-stream chunk
    pub is_complete: bool,
    /// Cost the backend charged for the whole stream, on the end-of-stream chunk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}

impl StreamChunk {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_complete: false,
            cost: None,
        }
    }

    pub fn done() -> Self {
        Self {
            content: String::new(),
            is_complete: true,
            cost: None,
        }
    }

    /// End-of-stream chunk reporting what the stream was charged
    pub fn finished(cost: f64) -> Self {
        Self {
            cost: Some(cost),
            ..Self::done()
        }
    }
}

pub type ChunkStream = BoxStream<'static, Result<StreamChunk>>;

/// Language-model completion backend
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Provider name recorded in cost entries
    fn name(&self) -> &str;

    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<Completion>;

    /// Chunks are yielded in delivery order; the last one has `is_complete` set
    async fn stream(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<ChunkStream>;

    fn estimate_cost(&self, prompt_tokens: u64, completion_tokens: u64, model: &str) -> f64;

    /// Rough token count (about four characters per token)
    fn count_tokens(&self, text: &str) -> u64 {
        (text.chars().count() as u64).div_ceil(4)
    }
}

/// Accumulates streamed chunks into one logical response
///
/// Chunks are concatenated strictly in the order they are pushed.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    text: String,
    chunks: usize,
    complete: bool,
    cost: Option<f64>,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk; returns true once the end-of-stream chunk was seen
    pub fn push(&mut self, chunk: &StreamChunk) -> bool {
        if !chunk.content.is_empty() {
            self.text.push_str(&chunk.content);
            self.chunks += 1;
        }
        if let Some(cost) = chunk.cost {
            self.cost = Some(self.cost.unwrap_or(0.0) + cost);
        }
        if chunk.is_complete {
            self.complete = true;
        }
        self.complete
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Cost reported by the backend, if it reported one
    pub fn cost(&self) -> Option<f64> {
        self.cost
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulator_preserves_delivery_order() {
        let mut acc = StreamAccumulator::new();
        assert!(!acc.push(&StreamChunk::text("Hello ")));
        assert!(!acc.push(&StreamChunk::text("streaming ")));
        assert!(!acc.push(&StreamChunk::text("world")));
        assert!(acc.push(&StreamChunk::done()));

        assert_eq!(acc.chunk_count(), 3);
        assert_eq!(acc.cost(), None);
        assert_eq!(acc.into_text(), "Hello streaming world");
    }

    #[test]
    fn test_accumulator_keeps_reported_cost() {
        let mut acc = StreamAccumulator::new();
        acc.push(&StreamChunk::text("a"));
        assert!(acc.push(&StreamChunk::finished(0.25)));

        assert_eq!(acc.cost(), Some(0.25));
        assert_eq!(acc.text(), "a");
    }

    #[test]
    fn test_accumulator_ignores_empty_chunks() {
        let mut acc = StreamAccumulator::new();
        acc.push(&StreamChunk::text(""));
        acc.push(&StreamChunk::text("x"));

        assert_eq!(acc.chunk_count(), 1);
        assert!(!acc.is_complete());
        assert_eq!(acc.text(), "x");
    }

    #[test]
    fn test_chat_message_roles_serialize_lowercase() {
        let msg = ChatMessage::system("prompt");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "system");
    }
}
