//! Pipeline builder with validation.

use super::Pipeline;
use crate::config::InstrumentationConfig;
use crate::errors::ValidationError;
use crate::events::{EventSink, LoggingEventSink};
use crate::interceptors::{InstrumentedStage, Interceptor, InterceptorChain, StateLoggingInterceptor};
use crate::stages::Stage;
use std::sync::Arc;

/// Builder for creating validated pipelines.
///
/// Stages run in the order they were added. Every stage is wrapped with the
/// same interceptor chain, ordered by `Interceptor::priority`. The state
/// logging interceptor has priority -100, so extra interceptors with a lower
/// priority run their `before` hooks ahead of it. Equal priorities keep
/// insertion order, with state logging inserted first.
pub struct PipelineBuilder {
    name: String,
    stages: Vec<Arc<dyn Stage>>,
    instrumentation: InstrumentationConfig,
    interceptors: Vec<Arc<dyn Interceptor>>,
    events: Arc<dyn EventSink>,
}

impl std::fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("name", &self.name)
            .field("stages", &self.stage_names())
            .field("instrumentation", &self.instrumentation)
            .field("interceptors", &self.interceptors.len())
            .finish_non_exhaustive()
    }
}

impl PipelineBuilder {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            instrumentation: InstrumentationConfig::default(),
            interceptors: Vec::new(),
            events: Arc::new(LoggingEventSink::default()),
        }
    }

    /// Appends a stage.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if a stage with the same name was
    /// already added.
    pub fn stage(mut self, stage: Arc<dyn Stage>) -> Result<Self, ValidationError> {
        if self.stages.iter().any(|s| s.name() == stage.name()) {
            return Err(ValidationError::new(
                "stages",
                format!("duplicate stage name '{}'", stage.name()),
            ));
        }
        self.stages.push(stage);
        Ok(self)
    }

    /// Sets the truncation thresholds of the state logging interceptor.
    #[must_use]
    pub fn instrumentation(mut self, config: &InstrumentationConfig) -> Self {
        self.instrumentation = config.clone();
        self
    }

    /// Adds an interceptor to the chain shared by every stage.
    #[must_use]
    pub fn interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the names of the stages added so far.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the builder has no stages.
    pub fn build(self) -> Result<Pipeline, ValidationError> {
        if self.stages.is_empty() {
            return Err(ValidationError::new("stages", "pipeline has no stages"));
        }

        let mut chain = InterceptorChain::new()
            .with(Arc::new(StateLoggingInterceptor::from_config(&self.instrumentation)));
        for interceptor in self.interceptors {
            chain.add(interceptor);
        }
        let chain = Arc::new(chain);

        let stages = self
            .stages
            .into_iter()
            .map(|stage| InstrumentedStage::new(stage, Arc::clone(&chain)))
            .collect();

        Ok(Pipeline::new(self.name, stages, self.events))
    }
}
