//! Span attributes and timing for pipeline and stage execution.

use crate::context::{StateField, TraceContext};
use crate::core::{Intent, StageKind, StageStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

/// Span attributes for one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineSpanAttributes {
    /// Pipeline name.
    pub pipeline_name: Option<String>,
    /// Trace id of the run.
    pub trace_id: Option<String>,
    /// Intent reached by the run, once known.
    pub intent: Option<Intent>,
    /// Number of stages executed.
    pub stage_count: Option<usize>,
}

impl PipelineSpanAttributes {
    /// Creates empty pipeline span attributes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pipeline name.
    #[must_use]
    pub fn with_pipeline_name(mut self, name: impl Into<String>) -> Self {
        self.pipeline_name = Some(name.into());
        self
    }

    /// Sets the trace id.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Sets the intent.
    #[must_use]
    pub fn with_intent(mut self, intent: Option<Intent>) -> Self {
        self.intent = intent;
        self
    }

    /// Sets the number of stages executed.
    #[must_use]
    pub fn with_stage_count(mut self, count: usize) -> Self {
        self.stage_count = Some(count);
        self
    }

    /// Flattens into dotted attribute names.
    #[must_use]
    pub fn to_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();

        if let Some(ref v) = self.pipeline_name {
            attrs.insert("pipeline.name".to_string(), v.clone());
        }
        if let Some(ref v) = self.trace_id {
            attrs.insert(
                "pipeline.trace_id".to_string(),
                TraceContext::display_id(v).to_string(),
            );
        }
        if let Some(v) = self.intent {
            attrs.insert("pipeline.intent".to_string(), v.to_string());
        }
        if let Some(v) = self.stage_count {
            attrs.insert("pipeline.stage_count".to_string(), v.to_string());
        }

        attrs
    }
}

/// Span attributes for one stage invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageSpanAttributes {
    /// Stage name.
    pub stage_name: String,
    /// Stage kind.
    pub stage_kind: Option<StageKind>,
    /// How the stage finished.
    pub status: Option<StageStatus>,
    /// Duration in milliseconds.
    pub duration_ms: Option<f64>,
    /// Error message if the stage failed or contained an error.
    pub error: Option<String>,
    /// Fields the stage wrote.
    pub written_fields: Vec<StateField>,
}

impl StageSpanAttributes {
    /// Creates attributes for the named stage.
    #[must_use]
    pub fn new(stage_name: impl Into<String>) -> Self {
        Self {
            stage_name: stage_name.into(),
            ..Default::default()
        }
    }

    /// Sets the stage kind.
    #[must_use]
    pub fn with_kind(mut self, kind: StageKind) -> Self {
        self.stage_kind = Some(kind);
        self
    }

    /// Sets the stage status.
    #[must_use]
    pub fn with_status(mut self, status: StageStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the duration.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Sets the error.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Sets the written fields.
    #[must_use]
    pub fn with_written_fields(mut self, fields: Vec<StateField>) -> Self {
        self.written_fields = fields;
        self
    }

    /// Flattens into dotted attribute names.
    #[must_use]
    pub fn to_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();

        attrs.insert("stage.name".to_string(), self.stage_name.clone());

        if let Some(v) = self.stage_kind {
            attrs.insert("stage.kind".to_string(), v.to_string());
        }
        if let Some(v) = self.status {
            attrs.insert("stage.status".to_string(), v.to_string());
        }
        if let Some(v) = self.duration_ms {
            attrs.insert("stage.duration_ms".to_string(), format!("{v:.2}"));
        }
        if let Some(ref v) = self.error {
            attrs.insert("stage.error".to_string(), v.clone());
        }
        if !self.written_fields.is_empty() {
            let names: Vec<&str> = self.written_fields.iter().map(StateField::as_str).collect();
            attrs.insert("stage.written_fields".to_string(), names.join(","));
        }

        attrs
    }
}

/// Wall-clock timer for a span.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new span timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stops the timer and returns the duration in milliseconds.
    #[must_use]
    pub fn finish(self) -> f64 {
        self.elapsed_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_span_attributes() {
        let attrs = PipelineSpanAttributes::new()
            .with_pipeline_name("codeflow")
            .with_trace_id("")
            .with_intent(Some(Intent::Optimize))
            .with_stage_count(3);

        let attrs = attrs.to_attributes();
        assert_eq!(attrs.get("pipeline.name"), Some(&"codeflow".to_string()));
        assert_eq!(attrs.get("pipeline.trace_id"), Some(&"NO-TRACE".to_string()));
        assert_eq!(attrs.get("pipeline.intent"), Some(&"optimize".to_string()));
        assert_eq!(attrs.get("pipeline.stage_count"), Some(&"3".to_string()));
    }

    #[test]
    fn test_stage_span_attributes() {
        let attrs = StageSpanAttributes::new("solve")
            .with_kind(StageKind::Agent)
            .with_status(StageStatus::Contained)
            .with_duration_ms(12.5)
            .with_written_fields(vec![StateField::FinalArtifact]);

        let attrs = attrs.to_attributes();
        assert_eq!(attrs.get("stage.name"), Some(&"solve".to_string()));
        assert_eq!(attrs.get("stage.kind"), Some(&"agent".to_string()));
        assert_eq!(attrs.get("stage.status"), Some(&"contained".to_string()));
        assert_eq!(attrs.get("stage.duration_ms"), Some(&"12.50".to_string()));
        assert_eq!(
            attrs.get("stage.written_fields"),
            Some(&"final_artifact".to_string())
        );
        assert!(!attrs.contains_key("stage.error"));
    }

    #[test]
    fn test_span_timer() {
        let timer = SpanTimer::start("classify-input");
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert_eq!(timer.name(), "classify-input");
        assert!(timer.finish() >= 10.0);
    }
}
