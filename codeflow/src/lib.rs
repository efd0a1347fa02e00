//! # Codeflow
//!
//! A three-stage pipeline that turns a coding request (text, optionally with
//! an image) into Python code or an analysis of existing code.
//!
//! - **classify-input**: folds an optional image into the problem text via a
//!   vision model
//! - **route-intent**: classifies the request as debug, optimize or generate
//! - **solve**: generates code directly, or runs a tool-using reasoning
//!   session for debug and optimize requests
//!
//! Every stage runs inside an [`InstrumentedStage`](interceptors::InstrumentedStage)
//! that logs its input and output, merges its update and keeps the trace id
//! intact.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use codeflow::prelude::*;
//!
//! let config = CodeflowConfig::load(None)?;
//! let pipeline = Pipeline::standard(StagePorts::ollama(&config)?, &config)?;
//!
//! let reply = pipeline
//!     .handle(PipelineRequest::new("why does this raise KeyError?"))
//!     .await?;
//! println!("{}", reply.final_artifact);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod context;
pub mod core;
pub mod errors;
pub mod events;
pub mod interceptors;
pub mod observability;
pub mod pipeline;
pub mod providers;
pub mod resources;
pub mod session;
pub mod stages;
pub mod testing;
pub mod tools;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::CodeflowConfig;
    pub use crate::context::{ImageRef, PipelineState, StateField, StateUpdate, TraceContext};
    pub use crate::core::{Intent, StageKind, StageOutput, StageStatus};
    pub use crate::errors::{CodeflowError, ModelError, ResourceError, ToolError, ValidationError};
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::interceptors::{InstrumentedStage, Interceptor, InterceptorChain};
    pub use crate::observability::init_logging;
    pub use crate::pipeline::{Pipeline, PipelineBuilder, PipelineReply, PipelineRequest};
    #[cfg(feature = "ollama")]
    pub use crate::providers::OllamaClient;
    pub use crate::providers::{ChatModel, TextModel, VisionModel};
    pub use crate::resources::{FileImageResolver, ImageResolver};
    pub use crate::session::{ReasoningSession, ToolLoopSession};
    pub use crate::stages::{IntentClassifier, KeywordClassifier, Stage, StagePorts};
    pub use crate::tools::{ToolCatalog, ToolSet, ToolSpec};
}
