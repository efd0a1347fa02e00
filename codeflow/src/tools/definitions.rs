//! Tool definitions and I/O types.

use crate::errors::ToolError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Describes a tool to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    /// The tool name.
    pub name: String,
    /// Description of what the tool does.
    pub description: String,
    /// JSON Schema for the arguments object.
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Creates a definition with an empty object schema.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: json!({"type": "object", "properties": {}}),
        }
    }

    /// Creates a definition taking a single required string argument.
    #[must_use]
    pub fn single_string_argument(
        name: impl Into<String>,
        description: impl Into<String>,
        argument: &str,
        argument_description: &str,
    ) -> Self {
        Self::new(name, description).with_input_schema(json!({
            "type": "object",
            "properties": {
                argument: {"type": "string", "description": argument_description}
            },
            "required": [argument]
        }))
    }

    /// Sets the input schema.
    #[must_use]
    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    /// Renders the definition in the function-calling format chat APIs
    /// expect.
    #[must_use]
    pub fn to_function_json(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.input_schema,
            }
        })
    }
}

/// Input to a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInput {
    /// The tool name.
    pub tool_name: String,
    /// The arguments object.
    pub payload: Value,
}

impl ToolInput {
    /// Creates a new tool input.
    #[must_use]
    pub fn new(tool_name: impl Into<String>, payload: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            payload,
        }
    }

    /// Returns a required string argument.
    ///
    /// # Errors
    ///
    /// Returns `ToolError::InvalidInput` if the argument is absent or not a
    /// string.
    pub fn required_str(&self, key: &str) -> Result<&str, ToolError> {
        match self.payload.get(key) {
            Some(Value::String(value)) => Ok(value),
            Some(other) => Err(ToolError::invalid_input(
                &self.tool_name,
                format!("argument '{key}' must be a string, got {other}"),
            )),
            None => Err(ToolError::invalid_input(
                &self.tool_name,
                format!("missing required argument '{key}'"),
            )),
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, Value> {
        let mut map = HashMap::new();
        map.insert("tool_name".to_string(), json!(self.tool_name));
        map.insert("payload".to_string(), self.payload.clone());
        map
    }
}

/// Executes a tool.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Runs the tool and returns its text result.
    async fn invoke(&self, input: &ToolInput) -> Result<String, ToolError>;
}

/// A tool: its definition plus the code that runs it.
#[derive(Clone)]
pub struct ToolSpec {
    /// What the model sees.
    pub definition: ToolDefinition,
    /// What runs when the model calls it.
    pub invoker: Arc<dyn ToolInvoker>,
}

impl std::fmt::Debug for ToolSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSpec")
            .field("name", &self.definition.name)
            .finish_non_exhaustive()
    }
}

impl ToolSpec {
    /// Creates a tool spec.
    #[must_use]
    pub fn new(definition: ToolDefinition, invoker: Arc<dyn ToolInvoker>) -> Self {
        Self { definition, invoker }
    }

    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Runs the tool with the given arguments.
    ///
    /// # Errors
    ///
    /// Propagates the invoker's `ToolError`.
    pub async fn invoke(&self, arguments: Value) -> Result<String, ToolError> {
        let input = ToolInput::new(self.name(), arguments);
        self.invoker.invoke(&input).await
    }
}
