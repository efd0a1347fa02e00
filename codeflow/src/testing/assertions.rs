//! Assertions over pipeline results and collected events.

use crate::context::{PipelineState, StateField};
use crate::events::{CollectingEventSink, FIELD_WRITTEN};
use crate::stages::AGENT_ERROR_PREFIX;

/// Asserts each field went from absent to present exactly once.
pub fn assert_written_once(events: &CollectingEventSink, fields: &[StateField]) {
    for field in fields {
        let writes = events.count_of(FIELD_WRITTEN, "field", field.as_str());
        assert_eq!(
            writes, 1,
            "expected '{field}' to be written exactly once, saw {writes} writes"
        );
    }
}

/// Asserts the terminal state kept the initial trace id.
pub fn assert_trace_preserved(initial: &PipelineState, terminal: &PipelineState) {
    assert_eq!(
        terminal.trace_id, initial.trace_id,
        "trace id changed during the run"
    );
}

/// Asserts the artifact is a contained session error.
pub fn assert_contained_artifact(state: &PipelineState) {
    let artifact = state.final_artifact.as_deref().unwrap_or_default();
    assert!(
        artifact.starts_with(AGENT_ERROR_PREFIX),
        "expected artifact starting with '{AGENT_ERROR_PREFIX}', got {artifact:?}"
    );
}
