//! The shared state record and the partial updates merged into it.

use crate::context::TraceContext;
use crate::core::Intent;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Opaque handle to an input image.
///
/// The filesystem resolver interprets it as a path; other resolvers may use
/// any addressing scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Creates a new image reference.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Returns the raw reference.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interprets the reference as a filesystem path.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Names of the fields of [`PipelineState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateField {
    /// Raw user text.
    Query,
    /// Optional input image.
    ImageRef,
    /// Correlation id.
    TraceId,
    /// Combined task description, written by classify-input.
    ProblemText,
    /// Classification, written by route-intent.
    Intent,
    /// Terminal output, written by solve.
    FinalArtifact,
}

impl StateField {
    /// All fields in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Query,
        Self::ImageRef,
        Self::TraceId,
        Self::ProblemText,
        Self::Intent,
        Self::FinalArtifact,
    ];

    /// Fields written by stages rather than seeded at start.
    pub const DERIVED: [Self; 3] = [Self::ProblemText, Self::Intent, Self::FinalArtifact];

    /// Returns the snake_case field name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::ImageRef => "image_ref",
            Self::TraceId => "trace_id",
            Self::ProblemText => "problem_text",
            Self::Intent => "intent",
            Self::FinalArtifact => "final_artifact",
        }
    }
}

impl fmt::Display for StateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State threaded through every stage of one run.
///
/// `query`, `image_ref` and `trace_id` are seeded at start. Each derived
/// field has exactly one designated writer stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineState {
    /// Raw user text (may be empty).
    pub query: String,

    /// Optional input image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<ImageRef>,

    /// Correlation id.
    pub trace_id: String,

    /// Combined task description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_text: Option<String>,

    /// Classified intent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,

    /// Terminal output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_artifact: Option<String>,
}

impl PipelineState {
    /// Creates the seed state of a run.
    #[must_use]
    pub fn new(query: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            trace_id: trace_id.into(),
            ..Default::default()
        }
    }

    /// Creates the seed state of a run from a trace context.
    #[must_use]
    pub fn from_trace(query: impl Into<String>, trace: &TraceContext) -> Self {
        Self::new(query, trace.trace_id.clone())
    }

    /// Attaches an input image.
    #[must_use]
    pub fn with_image(mut self, image_ref: ImageRef) -> Self {
        self.image_ref = Some(image_ref);
        self
    }

    /// Applies an update in place: every field present in the update
    /// overwrites (or inserts) the corresponding state field.
    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(trace_id) = update.trace_id {
            self.trace_id = trace_id;
        }
        if let Some(problem_text) = update.problem_text {
            self.problem_text = Some(problem_text);
        }
        if let Some(intent) = update.intent {
            self.intent = Some(intent);
        }
        if let Some(final_artifact) = update.final_artifact {
            self.final_artifact = Some(final_artifact);
        }
    }

    /// Returns a copy of this state with `update` merged in.
    #[must_use]
    pub fn merged(&self, update: StateUpdate) -> Self {
        let mut next = self.clone();
        next.apply(update);
        next
    }

    /// Returns true if the field holds a value.
    #[must_use]
    pub fn has(&self, field: StateField) -> bool {
        self.value_of(field).is_some()
    }

    /// Renders a field's value as text, or `None` if it is unset.
    ///
    /// `trace_id` counts as unset while blank.
    #[must_use]
    pub fn value_of(&self, field: StateField) -> Option<String> {
        match field {
            StateField::Query => Some(self.query.clone()),
            StateField::ImageRef => self.image_ref.as_ref().map(ToString::to_string),
            StateField::TraceId => {
                (!self.trace_id.trim().is_empty()).then(|| self.trace_id.clone())
            }
            StateField::ProblemText => self.problem_text.clone(),
            StateField::Intent => self.intent.map(|intent| intent.to_string()),
            StateField::FinalArtifact => self.final_artifact.clone(),
        }
    }

    /// Returns the derived fields that currently hold a value.
    #[must_use]
    pub fn written_fields(&self) -> Vec<StateField> {
        StateField::DERIVED
            .into_iter()
            .filter(|field| self.has(*field))
            .collect()
    }
}

/// The fields a single stage produces.
///
/// Absent fields leave the state untouched on merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateUpdate {
    /// Replacement trace id. Stages should never set this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,

    /// Combined task description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_text: Option<String>,

    /// Classified intent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,

    /// Terminal output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_artifact: Option<String>,
}

impl StateUpdate {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the problem text.
    #[must_use]
    pub fn with_problem_text(mut self, problem_text: impl Into<String>) -> Self {
        self.problem_text = Some(problem_text.into());
        self
    }

    /// Sets the intent.
    #[must_use]
    pub fn with_intent(mut self, intent: Intent) -> Self {
        self.intent = Some(intent);
        self
    }

    /// Sets the final artifact.
    #[must_use]
    pub fn with_final_artifact(mut self, final_artifact: impl Into<String>) -> Self {
        self.final_artifact = Some(final_artifact.into());
        self
    }

    /// Sets the trace id.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Returns the fields this update writes.
    #[must_use]
    pub fn fields(&self) -> Vec<StateField> {
        let mut fields = Vec::new();
        if self.trace_id.is_some() {
            fields.push(StateField::TraceId);
        }
        if self.problem_text.is_some() {
            fields.push(StateField::ProblemText);
        }
        if self.intent.is_some() {
            fields.push(StateField::Intent);
        }
        if self.final_artifact.is_some() {
            fields.push(StateField::FinalArtifact);
        }
        fields
    }

    /// Returns true if the update writes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_seed_state() {
        let state = PipelineState::new("sort a list", "trace-1")
            .with_image(ImageRef::new("/tmp/shot.png"));

        assert_eq!(state.query, "sort a list");
        assert_eq!(state.trace_id, "trace-1");
        assert_eq!(state.image_ref.as_ref().unwrap().as_str(), "/tmp/shot.png");
        assert!(state.written_fields().is_empty());
    }

    #[test]
    fn test_merge_inserts_only_present_fields() {
        let state = PipelineState::new("q", "t");
        let merged = state.merged(StateUpdate::new().with_problem_text("q"));

        assert_eq!(merged.problem_text.as_deref(), Some("q"));
        assert_eq!(merged.intent, None);
        assert_eq!(merged.trace_id, "t");
        assert_eq!(merged.written_fields(), vec![StateField::ProblemText]);
    }

    #[test]
    fn test_merge_is_last_writer_wins() {
        let state = PipelineState::new("q", "t")
            .merged(StateUpdate::new().with_intent(Intent::Debug))
            .merged(StateUpdate::new().with_intent(Intent::Generate));

        assert_eq!(state.intent, Some(Intent::Generate));
    }

    #[test]
    fn test_merged_leaves_input_untouched() {
        let state = PipelineState::new("q", "t");
        let _ = state.merged(StateUpdate::new().with_final_artifact("code"));

        assert_eq!(state.final_artifact, None);
    }

    #[test]
    fn test_value_of_renders_fields() {
        let state = PipelineState::new("q", "")
            .merged(StateUpdate::new().with_intent(Intent::Optimize));

        assert_eq!(state.value_of(StateField::Intent).as_deref(), Some("optimize"));
        assert_eq!(state.value_of(StateField::TraceId), None);
        assert_eq!(state.value_of(StateField::ImageRef), None);
    }

    #[test]
    fn test_update_fields() {
        let update = StateUpdate::new()
            .with_problem_text("p")
            .with_final_artifact("a");

        assert_eq!(
            update.fields(),
            vec![StateField::ProblemText, StateField::FinalArtifact]
        );
        assert!(!update.is_empty());
        assert!(StateUpdate::new().is_empty());
    }

    #[test]
    fn test_state_serialization() {
        let state = PipelineState::new("q", "t")
            .merged(StateUpdate::new().with_intent(Intent::Debug));
        let json = serde_json::to_value(&state).unwrap();

        assert_eq!(json["intent"], "debug");
        assert!(json.get("final_artifact").is_none());

        let back: PipelineState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
