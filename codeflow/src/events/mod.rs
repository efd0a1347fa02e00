//! Event emission for pipeline observability.
//!
//! Sinks are passed explicitly to the pipeline and to each stage context;
//! there is no process-wide sink.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// A stage began executing.
pub const STAGE_STARTED: &str = "stage.started";
/// A stage returned an update.
pub const STAGE_COMPLETED: &str = "stage.completed";
/// A stage returned an error.
pub const STAGE_FAILED: &str = "stage.failed";
/// A state field went from absent to present.
pub const FIELD_WRITTEN: &str = "state.field_written";
/// A state field that already held a value was replaced.
pub const FIELD_OVERWRITTEN: &str = "state.field_overwritten";
/// A run began.
pub const PIPELINE_STARTED: &str = "pipeline.started";
/// A run produced a terminal state.
pub const PIPELINE_COMPLETED: &str = "pipeline.completed";
/// A run aborted.
pub const PIPELINE_FAILED: &str = "pipeline.failed";
