//! Model service interfaces.
//!
//! Stages and tools depend only on these traits. [`OllamaClient`] is the
//! concrete implementation for a local Ollama server.

#[cfg(feature = "ollama")]
mod ollama;
mod types;

#[cfg(feature = "ollama")]
pub use ollama::OllamaClient;
pub use types::{ChatMessage, ChatRole, ChatTurn, ToolCall};

use crate::errors::ModelError;
use async_trait::async_trait;

/// A text-in, text-out model.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Returns the model name.
    fn model_name(&self) -> &str;

    /// Generates a completion for a single user prompt.
    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}

/// A model that reads an image alongside a prompt.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Returns the model name.
    fn model_name(&self) -> &str;

    /// Generates a completion for `prompt` about the raw image bytes.
    async fn generate_with_image(&self, prompt: &str, image: &[u8]) -> Result<String, ModelError>;
}

/// A model that holds a multi-message conversation and may call tools.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Returns the model name.
    fn model_name(&self) -> &str;

    /// Sends the conversation and the available tool definitions, returning
    /// the model's next turn.
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[serde_json::Value],
    ) -> Result<ChatTurn, ModelError>;
}
