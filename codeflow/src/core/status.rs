//! Stage status and kind enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of work a stage performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// A stage that changes the form of the input (e.g. image to text).
    Transform,
    /// A stage that decides between paths without side effects.
    Route,
    /// A stage that drives a model, possibly with tools.
    Agent,
    /// Any other unit of work.
    #[default]
    Work,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transform => write!(f, "transform"),
            Self::Route => write!(f, "route"),
            Self::Agent => write!(f, "agent"),
            Self::Work => write!(f, "work"),
        }
    }
}

/// How a stage finished.
///
/// Uncaught failures are not a status: they travel as `Err` and abort the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage completed normally.
    #[default]
    Ok,
    /// Stage hit an error, reported it as text inside its update and carried on.
    Contained,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Contained => write!(f, "contained"),
        }
    }
}

impl StageStatus {
    /// Returns true if the stage swallowed an error.
    #[must_use]
    pub fn is_contained(&self) -> bool {
        matches!(self, Self::Contained)
    }
}
