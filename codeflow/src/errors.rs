//! Error types for the codeflow pipeline.
//!
//! Every failure surface of the pipeline maps onto one of four families:
//! unreadable input artifacts, failed model calls, malformed input fields and
//! failed tool invocations. Whether a family aborts a run or is contained as
//! text is decided per stage, never here.

use serde_json::json;
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for codeflow operations.
#[derive(Debug, Error)]
pub enum CodeflowError {
    /// An input artifact (e.g. an image) could not be read.
    #[error("{0}")]
    Resource(#[from] ResourceError),

    /// An external inference call failed or returned malformed content.
    #[error("{0}")]
    Model(#[from] ModelError),

    /// A required input field was missing or malformed.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// A tool invocation failed.
    #[error("{0}")]
    Tool(#[from] ToolError),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodeflowError {
    /// Returns a stable name for the error family, used in logs and events.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Resource(_) => "ResourceError",
            Self::Model(_) => "ModelError",
            Self::Validation(_) => "ValidationError",
            Self::Tool(_) => "ToolError",
            Self::Config(_) => "ConfigError",
            Self::Serialization(_) => "SerializationError",
            Self::Io(_) => "IoError",
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = match self {
            Self::Tool(err) => err.to_dict(),
            _ => HashMap::new(),
        };
        map.insert("kind".to_string(), json!(self.kind()));
        map.insert("message".to_string(), json!(self.to_string()));
        map
    }
}

impl From<serde_json::Error> for CodeflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Error raised when an input artifact cannot be resolved to bytes.
#[derive(Debug, Clone, Error)]
#[error("Resource '{resource}' unavailable: {reason}")]
pub struct ResourceError {
    /// The reference that failed to resolve.
    pub resource: String,
    /// Why it failed.
    pub reason: String,
}

impl ResourceError {
    /// Creates a new resource error.
    #[must_use]
    pub fn new(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    /// Creates an error for a reference that does not exist.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(resource, "not found")
    }

    /// Creates an error for a reference that resolved to zero bytes.
    #[must_use]
    pub fn empty(resource: impl Into<String>) -> Self {
        Self::new(resource, "resolved to an empty payload")
    }

    /// Creates an error for a payload that is not a supported image format.
    #[must_use]
    pub fn unrecognized(resource: impl Into<String>) -> Self {
        Self::new(resource, "not a recognized image format")
    }
}

/// Errors raised by model services.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// The request never produced a response.
    #[error("Model request to '{model}' failed: {message}")]
    Transport {
        /// The model name.
        model: String,
        /// The transport error.
        message: String,
    },

    /// The service answered with a non-success status.
    #[error("Model '{model}' returned status {status}: {body}")]
    Status {
        /// The model name.
        model: String,
        /// The HTTP status code.
        status: u16,
        /// The response body, as text.
        body: String,
    },

    /// The response could not be interpreted.
    #[error("Model '{model}' returned malformed content: {message}")]
    Malformed {
        /// The model name.
        model: String,
        /// What was wrong with the content.
        message: String,
    },

    /// A reasoning session did not produce a final answer in time.
    #[error("Reasoning session exceeded {max_rounds} rounds without a final answer")]
    RoundLimitExceeded {
        /// The configured round limit.
        max_rounds: usize,
    },
}

impl ModelError {
    /// Creates a transport error.
    #[must_use]
    pub fn transport(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            model: model.into(),
            message: message.into(),
        }
    }

    /// Creates a status error.
    #[must_use]
    pub fn status(model: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            model: model.into(),
            status,
            body: body.into(),
        }
    }

    /// Creates a malformed-content error.
    #[must_use]
    pub fn malformed(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            model: model.into(),
            message: message.into(),
        }
    }
}

/// Error raised when a required input field is missing or malformed.
#[derive(Debug, Clone, Error)]
#[error("Invalid field '{field}': {message}")]
pub struct ValidationError {
    /// The offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    /// Creates a new validation error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an error for a field that has not been written yet.
    #[must_use]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, "required field has not been written")
    }
}

/// Errors related to tool execution.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    /// Tool was not found in the tool set.
    #[error("Tool not found: {name}")]
    NotFound {
        /// The tool name.
        name: String,
    },

    /// The tool arguments did not match its input schema.
    #[error("Invalid input for tool {name}: {reason}")]
    InvalidInput {
        /// The tool name.
        name: String,
        /// The reason the input was rejected.
        reason: String,
    },

    /// Tool execution failed.
    #[error("Tool execution failed: {name} - {reason}")]
    ExecutionFailed {
        /// The tool name.
        name: String,
        /// The reason for failure.
        reason: String,
    },
}

impl ToolError {
    /// Creates a tool not found error.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates an execution failed error.
    #[must_use]
    pub fn execution_failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Returns the name of the tool involved.
    #[must_use]
    pub fn tool_name(&self) -> &str {
        match self {
            Self::NotFound { name }
            | Self::InvalidInput { name, .. }
            | Self::ExecutionFailed { name, .. } => name,
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();

        match self {
            Self::NotFound { name } => {
                map.insert("type".to_string(), json!("ToolNotFound"));
                map.insert("name".to_string(), json!(name));
            }
            Self::InvalidInput { name, reason } => {
                map.insert("type".to_string(), json!("ToolInvalidInput"));
                map.insert("name".to_string(), json!(name));
                map.insert("reason".to_string(), json!(reason));
            }
            Self::ExecutionFailed { name, reason } => {
                map.insert("type".to_string(), json!("ToolExecutionError"));
                map.insert("name".to_string(), json!(name));
                map.insert("reason".to_string(), json!(reason));
            }
        }

        map.insert("message".to_string(), json!(self.to_string()));
        map
    }
}
