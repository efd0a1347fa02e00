//! Ready-made pipelines over mock collaborators.

use std::sync::Arc;

use super::{MockImageResolver, MockSession, MockTextModel, MockVisionModel};
use crate::config::CodeflowConfig;
use crate::context::PipelineState;
use crate::errors::CodeflowError;
use crate::events::CollectingEventSink;
use crate::pipeline::Pipeline;
use crate::stages::StagePorts;

/// Trace id used by [`seed_state`].
pub const TEST_TRACE_ID: &str = "test-trace";

/// Creates a seed state with a fixed trace id.
#[must_use]
pub fn seed_state(query: &str) -> PipelineState {
    PipelineState::new(query, TEST_TRACE_ID)
}

/// The standard pipeline wired to mocks, with every collaborator kept
/// around for assertions.
#[derive(Debug)]
pub struct TestHarness {
    /// The code model.
    pub code_model: Arc<MockTextModel>,
    /// The vision model.
    pub vision_model: Arc<MockVisionModel>,
    /// The image resolver.
    pub images: Arc<MockImageResolver>,
    /// The reasoning session.
    pub session: Arc<MockSession>,
    /// Collected events.
    pub events: Arc<CollectingEventSink>,
    /// Configuration passed to the pipeline.
    pub config: CodeflowConfig,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    /// Creates a harness where every collaborator succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            code_model: Arc::new(MockTextModel::always("def solve():\n    return 42")),
            vision_model: Arc::new(MockVisionModel::always("def f(x):\n    return x[0]")),
            images: Arc::new(MockImageResolver::with_bytes(b"\x89PNG".to_vec())),
            session: Arc::new(MockSession::answering("def fixed():\n    return 1")),
            events: Arc::new(CollectingEventSink::new()),
            config: CodeflowConfig::default(),
        }
    }

    /// Replaces the code model.
    #[must_use]
    pub fn with_code_model(mut self, model: MockTextModel) -> Self {
        self.code_model = Arc::new(model);
        self
    }

    /// Replaces the vision model.
    #[must_use]
    pub fn with_vision_model(mut self, model: MockVisionModel) -> Self {
        self.vision_model = Arc::new(model);
        self
    }

    /// Replaces the image resolver.
    #[must_use]
    pub fn with_images(mut self, images: MockImageResolver) -> Self {
        self.images = Arc::new(images);
        self
    }

    /// Replaces the reasoning session.
    #[must_use]
    pub fn with_session(mut self, session: MockSession) -> Self {
        self.session = Arc::new(session);
        self
    }

    /// Returns ports backed by the harness mocks.
    #[must_use]
    pub fn ports(&self) -> StagePorts {
        StagePorts::new(
            self.code_model.clone(),
            self.vision_model.clone(),
            self.images.clone(),
            self.session.clone(),
        )
    }

    /// Builds the standard pipeline reporting to the harness event sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is rejected.
    pub fn pipeline(&self) -> Result<Pipeline, CodeflowError> {
        Ok(Pipeline::standard(self.ports(), &self.config)?.with_event_sink(self.events.clone()))
    }
}
