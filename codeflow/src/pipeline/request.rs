//! The entry and exit boundary of a run.

use crate::context::{ImageRef, PipelineState, TraceContext};
use crate::core::Intent;
use serde::{Deserialize, Serialize};

/// A request to solve one coding task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRequest {
    /// Raw user text.
    #[serde(default)]
    pub query: String,

    /// Optional input image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<ImageRef>,

    /// Correlation id. Generated when absent or blank.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl PipelineRequest {
    /// Creates a text-only request.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Attaches an image.
    #[must_use]
    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(ImageRef::new(image_ref));
        self
    }

    /// Sets the trace id.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Builds the seed state of the run.
    #[must_use]
    pub fn into_state(self) -> PipelineState {
        let trace = TraceContext::from_optional(self.trace_id.as_deref());
        let state = PipelineState::from_trace(self.query, &trace);
        match self.image_ref {
            Some(image) => state.with_image(image),
            None => state,
        }
    }
}

/// What the caller gets back from a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReply {
    /// The produced code or analysis. Empty if never written.
    #[serde(default)]
    pub final_artifact: String,

    /// The routed intent, if routing ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,

    /// The trace id of the run.
    pub trace_id: String,
}

impl PipelineReply {
    /// Extracts the reply from a terminal state.
    #[must_use]
    pub fn from_state(state: &PipelineState) -> Self {
        Self {
            final_artifact: state.final_artifact.clone().unwrap_or_default(),
            intent: state.intent,
            trace_id: state.trace_id.clone(),
        }
    }
}
