//! Trace identity for correlating the log lines of one pipeline run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder rendered in logs when a state carries no trace id.
pub const NO_TRACE: &str = "NO-TRACE";

/// Correlation identifier assigned once per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    /// The trace id, propagated unchanged through every stage.
    pub trace_id: String,
    /// When the trace was created.
    pub started_at: DateTime<Utc>,
}

impl TraceContext {
    /// Creates a trace context with a fresh UUID v4 trace id.
    #[must_use]
    pub fn new() -> Self {
        Self::with_trace_id(Uuid::new_v4().to_string())
    }

    /// Creates a trace context around an existing trace id.
    #[must_use]
    pub fn with_trace_id(trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            started_at: Utc::now(),
        }
    }

    /// Uses `trace_id` if it is non-blank, otherwise generates one.
    #[must_use]
    pub fn from_optional(trace_id: Option<&str>) -> Self {
        match trace_id.map(str::trim) {
            Some(id) if !id.is_empty() => Self::with_trace_id(id),
            _ => Self::new(),
        }
    }

    /// Returns the trace id for display, substituting [`NO_TRACE`] when blank.
    #[must_use]
    pub fn display_id(trace_id: &str) -> &str {
        if trace_id.trim().is_empty() {
            NO_TRACE
        } else {
            trace_id
        }
    }
}

impl Default for TraceContext {
    fn default() -> Self {
        Self::new()
    }
}
