//! Observability utilities: span attributes, timing and subscriber setup.

mod logging;
mod tracing;

pub use logging::{build_env_filter, init_logging};
pub use tracing::{PipelineSpanAttributes, SpanTimer, StageSpanAttributes};
