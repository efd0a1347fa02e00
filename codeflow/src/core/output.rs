//! Stage output type with factory methods.

use super::StageStatus;
use crate::context::StateUpdate;
use serde::{Deserialize, Serialize};

/// The result of a stage that did not abort the run.
///
/// A stage returns `Ok(StageOutput)` when it produced an update, including
/// when it swallowed an error and surfaced it as text inside that update
/// (`StageStatus::Contained`). Errors that must abort the run are returned as
/// `Err` instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageOutput {
    /// How the stage finished.
    pub status: StageStatus,

    /// The fields this stage produced.
    pub update: StateUpdate,

    /// The swallowed error, for contained outputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contained_error: Option<String>,
}

impl StageOutput {
    /// Creates a successful output.
    #[must_use]
    pub fn ok(update: StateUpdate) -> Self {
        Self {
            status: StageStatus::Ok,
            update,
            contained_error: None,
        }
    }

    /// Creates an output that carries a swallowed error.
    #[must_use]
    pub fn contained(update: StateUpdate, error: impl Into<String>) -> Self {
        Self {
            status: StageStatus::Contained,
            update,
            contained_error: Some(error.into()),
        }
    }

    /// Returns true if the stage swallowed an error.
    #[must_use]
    pub fn is_contained(&self) -> bool {
        self.status.is_contained()
    }
}
