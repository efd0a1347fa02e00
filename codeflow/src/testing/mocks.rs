//! Scripted models, resolvers, sessions and stages.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::context::{ImageRef, PipelineState, StateUpdate};
use crate::core::StageOutput;
use crate::errors::{CodeflowError, ModelError, ResourceError, ValidationError};
use crate::providers::{ChatMessage, ChatModel, ChatTurn, TextModel, VisionModel};
use crate::resources::ImageResolver;
use crate::session::ReasoningSession;
use crate::stages::Stage;
use crate::tools::ToolSet;

/// Pops the next scripted reply, falling back to a fixed answer once the
/// script runs out.
#[derive(Debug)]
struct Script<T: Clone> {
    name: String,
    queue: Mutex<VecDeque<Result<T, ModelError>>>,
    fallback: Option<T>,
}

impl<T: Clone> Script<T> {
    fn new(name: &str, replies: Vec<Result<T, ModelError>>, fallback: Option<T>) -> Self {
        Self {
            name: name.to_string(),
            queue: Mutex::new(replies.into()),
            fallback,
        }
    }

    fn next(&self) -> Result<T, ModelError> {
        if let Some(reply) = self.queue.lock().pop_front() {
            return reply;
        }
        self.fallback
            .clone()
            .ok_or_else(|| ModelError::malformed(&self.name, "no scripted reply left"))
    }
}

/// A text model that replays scripted replies and records prompts.
#[derive(Debug)]
pub struct MockTextModel {
    script: Script<String>,
    prompts: Mutex<Vec<String>>,
}

impl MockTextModel {
    /// Replays `replies` in order, then fails.
    #[must_use]
    pub fn new(replies: Vec<Result<String, ModelError>>) -> Self {
        Self {
            script: Script::new("mock-code", replies, None),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answers every prompt with `reply`.
    #[must_use]
    pub fn always(reply: impl Into<String>) -> Self {
        Self {
            script: Script::new("mock-code", Vec::new(), Some(reply.into())),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Fails every prompt with `error`.
    #[must_use]
    pub fn failing(error: ModelError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Returns every prompt received.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// Returns the number of calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl TextModel for MockTextModel {
    fn model_name(&self) -> &str {
        &self.script.name
    }

    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        self.prompts.lock().push(prompt.to_string());
        self.script.next()
    }
}

/// A vision model that replays scripted replies and records each call.
#[derive(Debug)]
pub struct MockVisionModel {
    script: Script<String>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl MockVisionModel {
    /// Replays `replies` in order, then fails.
    #[must_use]
    pub fn new(replies: Vec<Result<String, ModelError>>) -> Self {
        Self {
            script: Script::new("mock-vision", replies, None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answers every call with `reply`.
    #[must_use]
    pub fn always(reply: impl Into<String>) -> Self {
        Self {
            script: Script::new("mock-vision", Vec::new(), Some(reply.into())),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns `(prompt, image length)` for every call.
    #[must_use]
    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl VisionModel for MockVisionModel {
    fn model_name(&self) -> &str {
        &self.script.name
    }

    async fn generate_with_image(&self, prompt: &str, image: &[u8]) -> Result<String, ModelError> {
        self.calls.lock().push((prompt.to_string(), image.len()));
        self.script.next()
    }
}

/// A chat model that replays scripted turns and records each request.
#[derive(Debug)]
pub struct MockChatModel {
    script: Script<ChatTurn>,
    requests: Mutex<Vec<(Vec<ChatMessage>, Vec<Value>)>>,
}

impl MockChatModel {
    /// Replays `turns` in order, then fails.
    #[must_use]
    pub fn new(turns: Vec<Result<ChatTurn, ModelError>>) -> Self {
        Self {
            script: Script::new("mock-brain", turns, None),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Returns `(messages, tool definitions)` for every request.
    #[must_use]
    pub fn requests(&self) -> Vec<(Vec<ChatMessage>, Vec<Value>)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    fn model_name(&self) -> &str {
        &self.script.name
    }

    async fn chat(&self, messages: &[ChatMessage], tools: &[Value]) -> Result<ChatTurn, ModelError> {
        self.requests.lock().push((messages.to_vec(), tools.to_vec()));
        self.script.next()
    }
}

/// An image resolver returning fixed bytes or a fixed failure.
#[derive(Debug)]
pub struct MockImageResolver {
    outcome: Result<Vec<u8>, ResourceError>,
    resolved: Mutex<Vec<String>>,
}

impl MockImageResolver {
    /// Resolves every reference to `bytes`.
    #[must_use]
    pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            outcome: Ok(bytes.into()),
            resolved: Mutex::new(Vec::new()),
        }
    }

    /// Fails every resolution with `reason`.
    #[must_use]
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            outcome: Err(ResourceError::new("mock", reason)),
            resolved: Mutex::new(Vec::new()),
        }
    }

    /// Returns every reference resolved.
    #[must_use]
    pub fn resolved(&self) -> Vec<String> {
        self.resolved.lock().clone()
    }
}

#[async_trait]
impl ImageResolver for MockImageResolver {
    async fn resolve(&self, image: &ImageRef) -> Result<Vec<u8>, ResourceError> {
        self.resolved.lock().push(image.to_string());
        match &self.outcome {
            Ok(bytes) => Ok(bytes.clone()),
            Err(err) => Err(ResourceError::new(image.as_str(), err.reason.clone())),
        }
    }
}

/// A reasoning session with a fixed answer or failure.
#[derive(Debug)]
pub struct MockSession {
    outcome: Result<String, ModelError>,
    echo: bool,
    runs: Mutex<Vec<(String, Vec<String>)>>,
}

impl MockSession {
    /// Answers every run with `answer`.
    #[must_use]
    pub fn answering(answer: impl Into<String>) -> Self {
        Self {
            outcome: Ok(answer.into()),
            echo: false,
            runs: Mutex::new(Vec::new()),
        }
    }

    /// Answers every run with the instruction it was given.
    #[must_use]
    pub fn echoing() -> Self {
        Self {
            outcome: Ok(String::new()),
            echo: true,
            runs: Mutex::new(Vec::new()),
        }
    }

    /// Fails every run with `error`.
    #[must_use]
    pub fn failing(error: ModelError) -> Self {
        Self {
            outcome: Err(error),
            echo: false,
            runs: Mutex::new(Vec::new()),
        }
    }

    /// Returns `(instruction, tool names)` for every run.
    #[must_use]
    pub fn runs(&self) -> Vec<(String, Vec<String>)> {
        self.runs.lock().clone()
    }

    /// Returns the number of runs.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.lock().len()
    }
}

#[async_trait]
impl ReasoningSession for MockSession {
    async fn run(&self, instruction: &str, tools: &ToolSet) -> Result<String, CodeflowError> {
        let names = tools.names().into_iter().map(String::from).collect();
        self.runs.lock().push((instruction.to_string(), names));
        if self.echo {
            return Ok(instruction.to_string());
        }
        self.outcome.clone().map_err(CodeflowError::from)
    }
}

/// A stage that returns a fixed update and counts its calls.
#[derive(Debug)]
pub struct RecordingStage {
    name: String,
    update: StateUpdate,
    calls: AtomicUsize,
    seen: Mutex<Vec<PipelineState>>,
}

impl RecordingStage {
    /// Creates a stage returning `update`.
    #[must_use]
    pub fn new(name: impl Into<String>, update: StateUpdate) -> Self {
        Self {
            name: name.into(),
            update,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Returns the number of calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Returns the input state of every call.
    #[must_use]
    pub fn seen(&self) -> Vec<PipelineState> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl Stage for RecordingStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, state: &PipelineState) -> Result<StageOutput, CodeflowError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(state.clone());
        Ok(StageOutput::ok(self.update.clone()))
    }
}

/// A stage that always returns an uncaught error.
#[derive(Debug)]
pub struct FailingStage {
    name: String,
    message: String,
    calls: AtomicUsize,
}

impl FailingStage {
    /// Creates a stage failing with a validation error carrying `message`.
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns the number of calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Stage for FailingStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _state: &PipelineState) -> Result<StageOutput, CodeflowError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ValidationError::new(&self.name, &self.message).into())
    }
}
