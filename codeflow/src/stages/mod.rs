//! Stage trait and the three stages of the standard pipeline.
//!
//! A stage reads the current [`PipelineState`] and returns the fields it
//! produced. It never mutates its input; merging is the wrapper's job.

mod classifier;
mod classify_input;
mod ports;
mod route_intent;
mod solve;

pub use classifier::{IntentClassifier, KeywordClassifier};
pub use classify_input::{ClassifyInputStage, VISION_PROMPT};
pub use ports::StagePorts;
pub use route_intent::RouteIntentStage;
pub use solve::{generate_prompt, SolveStage, AGENT_ERROR_PREFIX};

use crate::context::PipelineState;
use crate::core::{StageKind, StageOutput};
use crate::errors::CodeflowError;
use async_trait::async_trait;
use std::fmt::Debug;

/// Trait for pipeline stages.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns the name of the stage. Unique within a pipeline.
    fn name(&self) -> &str;

    /// Returns the kind of work the stage performs.
    fn kind(&self) -> StageKind {
        StageKind::Work
    }

    /// Executes the stage against a read-only view of the state.
    ///
    /// # Errors
    ///
    /// Returns an error that aborts the run. Errors the stage chooses to
    /// contain are reported through [`StageOutput::contained`] instead.
    async fn execute(&self, state: &PipelineState) -> Result<StageOutput, CodeflowError>;
}

/// A stage backed by a synchronous closure.
pub struct FnStage<F>
where
    F: Fn(&PipelineState) -> Result<StageOutput, CodeflowError> + Send + Sync,
{
    name: String,
    kind: StageKind,
    func: F,
}

impl<F> FnStage<F>
where
    F: Fn(&PipelineState) -> Result<StageOutput, CodeflowError> + Send + Sync,
{
    /// Creates a new function-based stage.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            kind: StageKind::Work,
            func,
        }
    }

    /// Sets the stage kind.
    #[must_use]
    pub fn with_kind(mut self, kind: StageKind) -> Self {
        self.kind = kind;
        self
    }
}

impl<F> Debug for FnStage<F>
where
    F: Fn(&PipelineState) -> Result<StageOutput, CodeflowError> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

#[async_trait]
impl<F> Stage for FnStage<F>
where
    F: Fn(&PipelineState) -> Result<StageOutput, CodeflowError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        self.kind
    }

    async fn execute(&self, state: &PipelineState) -> Result<StageOutput, CodeflowError> {
        (self.func)(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StateUpdate;
    use crate::errors::ValidationError;

    #[tokio::test]
    async fn test_fn_stage() {
        let stage = FnStage::new("echo", |state: &PipelineState| {
            Ok(StageOutput::ok(
                StateUpdate::new().with_problem_text(state.query.clone()),
            ))
        })
        .with_kind(StageKind::Transform);

        assert_eq!(stage.name(), "echo");
        assert_eq!(stage.kind(), StageKind::Transform);

        let output = stage.execute(&PipelineState::new("hi", "t")).await.unwrap();
        assert_eq!(output.update.problem_text.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn test_fn_stage_error() {
        let stage = FnStage::new("broken", |_: &PipelineState| {
            Err(ValidationError::missing("intent").into())
        });

        let err = stage.execute(&PipelineState::new("", "t")).await.unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
    }
}
