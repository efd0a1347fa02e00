//! The tool-using reasoning session behind the debug and optimize paths.

use crate::errors::{CodeflowError, ModelError};
use crate::providers::{ChatMessage, ChatModel, ChatTurn};
use crate::tools::ToolSet;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs an instruction to completion with access to a set of tools.
#[async_trait]
pub trait ReasoningSession: Send + Sync {
    /// Returns the final message of the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the model fails or no answer is produced.
    async fn run(&self, instruction: &str, tools: &ToolSet) -> Result<String, CodeflowError>;
}

/// A bounded chat loop: the model may call tools until it answers in text.
///
/// Tool failures are reported back to the model as text; they do not end
/// the session.
pub struct ToolLoopSession {
    model: Arc<dyn ChatModel>,
    max_rounds: usize,
}

impl std::fmt::Debug for ToolLoopSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolLoopSession")
            .field("model", &self.model.model_name())
            .field("max_rounds", &self.max_rounds)
            .finish()
    }
}

impl ToolLoopSession {
    /// Creates a session over `model` allowing at most `max_rounds` model
    /// turns.
    #[must_use]
    pub fn new(model: Arc<dyn ChatModel>, max_rounds: usize) -> Self {
        Self { model, max_rounds }
    }

    /// Returns the round limit.
    #[must_use]
    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }
}

#[async_trait]
impl ReasoningSession for ToolLoopSession {
    async fn run(&self, instruction: &str, tools: &ToolSet) -> Result<String, CodeflowError> {
        let definitions = tools.to_function_json();
        let mut messages = vec![ChatMessage::user(instruction)];

        for round in 1..=self.max_rounds {
            let turn = self.model.chat(&messages, &definitions).await?;

            let (content, calls) = match turn {
                ChatTurn::Text(text) => {
                    info!(round, model = self.model.model_name(), "session finished");
                    return Ok(text);
                }
                ChatTurn::ToolCalls { content, calls } => (content, calls),
            };

            debug!(round, calls = calls.len(), "model requested tools");
            messages.push(ChatMessage::assistant_with_calls(content, calls.clone()));

            for call in &calls {
                let result = match tools.invoke(call).await {
                    Ok(output) => output,
                    Err(err) => {
                        warn!(tool = %call.name, error = %err, "tool call failed");
                        format!("error: {err}")
                    }
                };
                messages.push(ChatMessage::tool(&call.name, result));
            }
        }

        Err(ModelError::RoundLimitExceeded {
            max_rounds: self.max_rounds,
        }
        .into())
    }
}
