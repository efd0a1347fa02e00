//! The closed classification of a user request.

use crate::errors::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the user wants done with their code.
///
/// Written exactly once by the route-intent stage and read by the solve
/// stage to pick its tool set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    /// Find and explain what is wrong with existing code.
    Debug,
    /// Improve existing code without changing its behavior.
    Optimize,
    /// Write new code from a problem description.
    Generate,
}

impl Intent {
    /// All intents, in classification priority order.
    pub const ALL: [Self; 3] = [Self::Debug, Self::Optimize, Self::Generate];

    /// Returns the lowercase wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Optimize => "optimize",
            Self::Generate => "generate",
        }
    }

    /// Returns true if this intent is served by a tool-augmented session.
    #[must_use]
    pub fn uses_tools(&self) -> bool {
        matches!(self, Self::Debug | Self::Optimize)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "optimize" => Ok(Self::Optimize),
            "generate" => Ok(Self::Generate),
            other => Err(ValidationError::new(
                "intent",
                format!("unknown intent '{other}'"),
            )),
        }
    }
}
