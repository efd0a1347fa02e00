//! Pipeline building and execution.
//!
//! This module provides:
//! - A builder composing stages in insertion order
//! - The sequential engine that runs instrumented stages
//! - The request/reply boundary types
//! - The standard classify-input, route-intent, solve pipeline

mod builder;
mod engine;
mod integration_tests;
mod request;
mod standard;

pub use builder::PipelineBuilder;
pub use engine::Pipeline;
pub use request::{PipelineReply, PipelineRequest};
pub use standard::{STANDARD_PIPELINE, STANDARD_STAGES};
