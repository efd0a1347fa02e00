//! Wraps a stage with interceptors, merging and trace propagation.

use super::InterceptorChain;
use crate::context::{PipelineState, StageContext, StateField};
use crate::errors::CodeflowError;
use crate::events::{self, EventSink};
use crate::observability::{SpanTimer, StageSpanAttributes};
use crate::stages::Stage;
use serde_json::json;
use std::sync::Arc;
use tracing::{info_span, warn, Instrument};

/// A stage composed with an interceptor chain.
///
/// Running it invokes the stage, merges its update into a copy of the input
/// state and guarantees the input `trace_id` survives the merge.
#[derive(Debug, Clone)]
pub struct InstrumentedStage {
    stage: Arc<dyn Stage>,
    chain: Arc<InterceptorChain>,
}

impl InstrumentedStage {
    /// Wraps `stage` with `chain`.
    #[must_use]
    pub fn new(stage: Arc<dyn Stage>, chain: Arc<InterceptorChain>) -> Self {
        Self { stage, chain }
    }

    /// Returns the wrapped stage's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.stage.name()
    }

    /// Returns the wrapped stage.
    #[must_use]
    pub fn stage(&self) -> &Arc<dyn Stage> {
        &self.stage
    }

    /// Returns the interceptor chain around the stage.
    #[must_use]
    pub fn chain(&self) -> &InterceptorChain {
        &self.chain
    }

    /// Runs the stage and returns the merged state.
    ///
    /// # Errors
    ///
    /// Returns the stage's error unchanged after the `on_error` hooks ran.
    pub async fn run(
        &self,
        state: &PipelineState,
        events: Arc<dyn EventSink>,
    ) -> Result<PipelineState, CodeflowError> {
        let ctx = StageContext::new(
            self.stage.name(),
            self.stage.kind(),
            state.trace_id.clone(),
            events,
        );

        self.chain.run_before(&ctx, state).await;
        ctx.try_emit_event(events::STAGE_STARTED, Some(json!({"kind": self.stage.kind()})));

        let timer = SpanTimer::start(self.stage.name());
        let span = info_span!("stage", stage = self.stage.name(), trace_id = ctx.trace_id());
        let result = self.stage.execute(state).instrument(span).await;
        let duration_ms = timer.finish();

        let output = match result {
            Ok(output) => output,
            Err(err) => {
                self.chain.handle_error(&ctx, state, &err).await;
                let attrs = StageSpanAttributes::new(self.stage.name())
                    .with_kind(self.stage.kind())
                    .with_duration_ms(duration_ms)
                    .with_error(err.to_string());
                ctx.try_emit_event(
                    events::STAGE_FAILED,
                    Some(json!({
                        "error": err.to_dict(),
                        "duration_ms": duration_ms,
                        "attributes": attrs.to_attributes(),
                    })),
                );
                return Err(err);
            }
        };

        let mut merged = state.merged(output.update.clone());
        if merged.trace_id != state.trace_id {
            warn!(
                stage = self.stage.name(),
                trace_id = ctx.trace_id(),
                "stage update replaced trace_id; restoring"
            );
            merged.trace_id.clone_from(&state.trace_id);
        }

        self.chain.run_after(&ctx, state, &merged, &output).await;

        let mut written = Vec::new();
        for field in StateField::ALL {
            if field == StateField::TraceId {
                continue;
            }
            let before = state.value_of(field);
            let after = merged.value_of(field);
            match (before, after) {
                (None, Some(_)) => {
                    written.push(field);
                    ctx.try_emit_event(events::FIELD_WRITTEN, Some(json!({"field": field})));
                }
                (Some(old), Some(new)) if old != new => {
                    written.push(field);
                    ctx.try_emit_event(
                        events::FIELD_OVERWRITTEN,
                        Some(json!({"field": field})),
                    );
                }
                _ => {}
            }
        }

        let mut attrs = StageSpanAttributes::new(self.stage.name())
            .with_kind(self.stage.kind())
            .with_status(output.status)
            .with_duration_ms(duration_ms)
            .with_written_fields(written);
        if let Some(ref contained) = output.contained_error {
            attrs = attrs.with_error(contained.clone());
        }
        ctx.try_emit_event(
            events::STAGE_COMPLETED,
            Some(json!({
                "status": output.status,
                "duration_ms": duration_ms,
                "attributes": attrs.to_attributes(),
            })),
        );

        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StateUpdate;
    use crate::core::{Intent, StageOutput};
    use crate::errors::ModelError;
    use crate::events::CollectingEventSink;
    use crate::interceptors::StateLoggingInterceptor;
    use crate::stages::FnStage;

    fn chain() -> Arc<InterceptorChain> {
        Arc::new(InterceptorChain::new().with(Arc::new(StateLoggingInterceptor::default())))
    }

    #[tokio::test]
    async fn test_run_merges_update() {
        let stage = FnStage::new("route", |_: &PipelineState| {
            Ok(StageOutput::ok(StateUpdate::new().with_intent(Intent::Debug)))
        });
        let wrapped = InstrumentedStage::new(Arc::new(stage), chain());
        let sink = Arc::new(CollectingEventSink::new());

        let input = PipelineState::new("q", "trace-1");
        let output = wrapped.run(&input, sink.clone()).await.unwrap();

        assert_eq!(output.intent, Some(Intent::Debug));
        assert_eq!(output.query, "q");
        assert_eq!(input.intent, None);
        assert_eq!(
            sink.event_types(),
            vec!["stage.started", "state.field_written", "stage.completed"]
        );
        assert_eq!(sink.count_of("state.field_written", "field", "intent"), 1);
    }

    #[tokio::test]
    async fn test_run_restores_cleared_trace_id() {
        let stage = FnStage::new("rogue", |_: &PipelineState| {
            Ok(StageOutput::ok(StateUpdate::new().with_trace_id("")))
        });
        let wrapped = InstrumentedStage::new(Arc::new(stage), chain());

        let output = wrapped
            .run(&PipelineState::new("q", "trace-1"), Arc::new(CollectingEventSink::new()))
            .await
            .unwrap();

        assert_eq!(output.trace_id, "trace-1");
    }

    #[tokio::test]
    async fn test_run_restores_replaced_trace_id() {
        let stage = FnStage::new("rogue", |_: &PipelineState| {
            Ok(StageOutput::ok(StateUpdate::new().with_trace_id("other")))
        });
        let wrapped = InstrumentedStage::new(Arc::new(stage), chain());

        let output = wrapped
            .run(&PipelineState::new("q", "trace-1"), Arc::new(CollectingEventSink::new()))
            .await
            .unwrap();

        assert_eq!(output.trace_id, "trace-1");
    }

    #[tokio::test]
    async fn test_run_returns_error_unchanged() {
        let stage = FnStage::new("solve", |_: &PipelineState| {
            Err(ModelError::transport("qwen", "connection refused").into())
        });
        let wrapped = InstrumentedStage::new(Arc::new(stage), chain());
        let sink = Arc::new(CollectingEventSink::new());

        let err = wrapped
            .run(&PipelineState::new("q", "t"), sink.clone())
            .await
            .unwrap_err();

        assert!(matches!(err, CodeflowError::Model(ModelError::Transport { .. })));
        assert_eq!(sink.event_types(), vec!["stage.started", "stage.failed"]);
    }

    #[tokio::test]
    async fn test_run_reports_overwrites() {
        let stage = FnStage::new("rewrite", |_: &PipelineState| {
            Ok(StageOutput::ok(StateUpdate::new().with_intent(Intent::Optimize)))
        });
        let wrapped = InstrumentedStage::new(Arc::new(stage), chain());
        let sink = Arc::new(CollectingEventSink::new());

        let input = PipelineState::new("q", "t").merged(StateUpdate::new().with_intent(Intent::Debug));
        wrapped.run(&input, sink.clone()).await.unwrap();

        assert_eq!(sink.count_of("state.field_overwritten", "field", "intent"), 1);
        assert_eq!(sink.count_of("state.field_written", "field", "intent"), 0);
    }

    #[tokio::test]
    async fn test_contained_output_is_merged() {
        let stage = FnStage::new("solve", |_: &PipelineState| {
            Ok(StageOutput::contained(
                StateUpdate::new().with_final_artifact("# AGENT ERROR: boom"),
                "boom",
            ))
        });
        let wrapped = InstrumentedStage::new(Arc::new(stage), chain());
        let sink = Arc::new(CollectingEventSink::new());

        let output = wrapped.run(&PipelineState::new("q", "t"), sink.clone()).await.unwrap();

        assert_eq!(output.final_artifact.as_deref(), Some("# AGENT ERROR: boom"));
        let completed = sink.events_of_type("stage.completed");
        assert_eq!(completed[0].1.as_ref().unwrap()["status"], "contained");
    }
}
