//! Sequential execution of instrumented stages.

use super::{PipelineReply, PipelineRequest};
use crate::context::PipelineState;
use crate::errors::{CodeflowError, ValidationError};
use crate::events::{self, EventSink};
use crate::interceptors::InstrumentedStage;
use crate::observability::{PipelineSpanAttributes, SpanTimer};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};

/// An ordered list of instrumented stages.
///
/// Stages run one at a time; each sees the state merged from all earlier
/// stages. The first uncaught error aborts the run.
#[derive(Clone)]
pub struct Pipeline {
    name: String,
    stages: Vec<InstrumentedStage>,
    events: Arc<dyn EventSink>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("stages", &self.stage_names())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub(super) fn new(
        name: String,
        stages: Vec<InstrumentedStage>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            name,
            stages,
            events,
        }
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(InstrumentedStage::name).collect()
    }

    /// Returns the interceptor names in `before` hook order.
    ///
    /// Every stage shares one chain, so the first stage's chain is reported.
    #[must_use]
    pub fn interceptor_names(&self) -> Vec<String> {
        self.stages
            .first()
            .map(|stage| stage.chain().names())
            .unwrap_or_default()
    }

    /// Replaces the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Runs every stage against `state` and returns the terminal state.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if `trace_id` is blank, or the first
    /// uncaught stage error.
    pub async fn run(&self, state: PipelineState) -> Result<PipelineState, CodeflowError> {
        if state.trace_id.trim().is_empty() {
            return Err(ValidationError::new("trace_id", "must not be empty").into());
        }

        let span = info_span!("pipeline", pipeline = %self.name, trace_id = %state.trace_id);
        self.run_stages(state).instrument(span).await
    }

    async fn run_stages(&self, mut state: PipelineState) -> Result<PipelineState, CodeflowError> {
        let timer = SpanTimer::start(&self.name);
        self.events.try_emit(
            events::PIPELINE_STARTED,
            Some(json!({
                "pipeline": self.name,
                "trace_id": state.trace_id,
                "stages": self.stage_names(),
            })),
        );
        info!(stages = self.stages.len(), "pipeline started");

        for stage in &self.stages {
            let result = stage.run(&state, Arc::clone(&self.events)).await;
            match result {
                Ok(next) => state = next,
                Err(err) => {
                    let duration_ms = timer.finish();
                    error!(stage = stage.name(), error = %err, "pipeline aborted");
                    self.events.try_emit(
                        events::PIPELINE_FAILED,
                        Some(json!({
                            "pipeline": self.name,
                            "trace_id": state.trace_id,
                            "stage": stage.name(),
                            "error": err.to_dict(),
                            "duration_ms": duration_ms,
                        })),
                    );
                    return Err(err);
                }
            }
        }

        let duration_ms = timer.finish();
        let attrs = PipelineSpanAttributes::new()
            .with_pipeline_name(&self.name)
            .with_trace_id(&state.trace_id)
            .with_intent(state.intent)
            .with_stage_count(self.stages.len());
        info!(
            duration_ms,
            intent = ?state.intent,
            "pipeline completed"
        );
        self.events.try_emit(
            events::PIPELINE_COMPLETED,
            Some(json!({
                "pipeline": self.name,
                "trace_id": state.trace_id,
                "duration_ms": duration_ms,
                "attributes": attrs.to_attributes(),
            })),
        );

        Ok(state)
    }

    /// Runs one request end to end.
    ///
    /// # Errors
    ///
    /// Returns the first uncaught stage error.
    pub async fn handle(&self, request: PipelineRequest) -> Result<PipelineReply, CodeflowError> {
        let terminal = self.run(request.into_state()).await?;
        Ok(PipelineReply::from_state(&terminal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StateUpdate;
    use crate::events::CollectingEventSink;
    use crate::pipeline::PipelineBuilder;
    use crate::testing::{FailingStage, RecordingStage};

    #[tokio::test]
    async fn test_blank_trace_id_is_rejected() {
        let stage = Arc::new(RecordingStage::new("only", StateUpdate::new()));
        let pipeline = PipelineBuilder::new("p").stage(stage.clone()).unwrap().build().unwrap();

        let err = pipeline.run(PipelineState::new("q", "  ")).await.unwrap_err();

        assert_eq!(err.kind(), "ValidationError");
        assert!(err.to_string().contains("trace_id"));
        assert_eq!(stage.call_count(), 0);
    }

    #[tokio::test]
    async fn test_events_bracket_the_run() {
        let sink = Arc::new(CollectingEventSink::new());
        let pipeline = PipelineBuilder::new("p")
            .stage(Arc::new(RecordingStage::new("a", StateUpdate::new())))
            .unwrap()
            .event_sink(sink.clone())
            .build()
            .unwrap();

        pipeline.run(PipelineState::new("q", "t")).await.unwrap();

        let types = sink.event_types();
        assert_eq!(types.first().map(String::as_str), Some("pipeline.started"));
        assert_eq!(types.last().map(String::as_str), Some("pipeline.completed"));
    }

    #[tokio::test]
    async fn test_failure_emits_pipeline_failed() {
        let sink = Arc::new(CollectingEventSink::new());
        let pipeline = PipelineBuilder::new("p")
            .stage(Arc::new(FailingStage::new("boom", "bad input")))
            .unwrap()
            .build()
            .unwrap()
            .with_event_sink(sink.clone());

        assert!(pipeline.run(PipelineState::new("q", "t")).await.is_err());

        let failed = sink.events_of_type("pipeline.failed");
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].1.as_ref().unwrap()["stage"], "boom");
    }
}
