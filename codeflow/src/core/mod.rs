//! Core domain model types for codeflow.
//!
//! This module contains the fundamental types used throughout the pipeline:
//! - The closed intent classification
//! - Stage status and kind enums
//! - Stage output type with factory methods

mod intent;
mod output;
mod status;

pub use intent::Intent;
pub use output::StageOutput;
pub use status::{StageKind, StageStatus};
