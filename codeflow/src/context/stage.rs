//! Per-invocation context handed to interceptors.

use super::TraceContext;
use crate::core::StageKind;
use crate::events::EventSink;
use std::sync::Arc;

/// Describes one stage invocation within one run.
#[derive(Clone)]
pub struct StageContext {
    stage_name: String,
    kind: StageKind,
    trace_id: String,
    events: Arc<dyn EventSink>,
}

impl std::fmt::Debug for StageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageContext")
            .field("stage_name", &self.stage_name)
            .field("kind", &self.kind)
            .field("trace_id", &self.trace_id)
            .finish_non_exhaustive()
    }
}

impl StageContext {
    /// Creates a new stage context.
    #[must_use]
    pub fn new(
        stage_name: impl Into<String>,
        kind: StageKind,
        trace_id: impl Into<String>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            stage_name: stage_name.into(),
            kind,
            trace_id: trace_id.into(),
            events,
        }
    }

    /// Returns the stage name.
    #[must_use]
    pub fn stage_name(&self) -> &str {
        &self.stage_name
    }

    /// Returns the stage kind.
    #[must_use]
    pub fn kind(&self) -> StageKind {
        self.kind
    }

    /// Returns the trace id for display.
    #[must_use]
    pub fn trace_id(&self) -> &str {
        TraceContext::display_id(&self.trace_id)
    }

    /// Emits an event tagged with this stage and trace, without blocking.
    pub fn try_emit_event(&self, event_type: &str, data: Option<serde_json::Value>) {
        let mut payload = serde_json::json!({
            "stage": self.stage_name,
            "trace_id": self.trace_id(),
        });
        if let (Some(serde_json::Value::Object(extra)), Some(target)) =
            (data, payload.as_object_mut())
        {
            target.extend(extra);
        }
        self.events.try_emit(event_type, Some(payload));
    }
}
