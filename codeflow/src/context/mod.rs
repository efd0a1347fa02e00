//! Per-request state threaded through the pipeline.
//!
//! This module provides:
//! - The trace context carrying the correlation id of one run
//! - The shared state record and the partial updates stages return
//! - Field-wise deltas between two states, for logging
//! - The per-invocation stage context handed to interceptors

mod delta;
mod identity;
mod stage;
mod state;

pub use delta::{truncate_display, truncate_preview, FieldChange, StateDelta};
pub use identity::{TraceContext, NO_TRACE};
pub use stage::StageContext;
pub use state::{ImageRef, PipelineState, StateField, StateUpdate};
