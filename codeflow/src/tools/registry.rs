//! Ordered tool collections.

use super::{ToolDefinition, ToolSpec};
use crate::errors::ToolError;
use crate::providers::ToolCall;
use serde_json::Value;

/// An ordered set of tools with lookup by name.
///
/// Order is preserved in the definitions sent to the model.
#[derive(Debug, Clone, Default)]
pub struct ToolSet {
    tools: Vec<ToolSpec>,
}

impl ToolSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tool. A tool with the same name is replaced in place.
    pub fn add(&mut self, spec: ToolSpec) {
        match self.tools.iter_mut().find(|t| t.name() == spec.name()) {
            Some(existing) => *existing = spec,
            None => self.tools.push(spec),
        }
    }

    /// Adds a tool and returns the set.
    #[must_use]
    pub fn with(mut self, spec: ToolSpec) -> Self {
        self.add(spec);
        self
    }

    /// Looks a tool up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Returns true if a tool with this name is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the tool names in order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(ToolSpec::name).collect()
    }

    /// Returns the tool definitions in order.
    #[must_use]
    pub fn definitions(&self) -> Vec<&ToolDefinition> {
        self.tools.iter().map(|t| &t.definition).collect()
    }

    /// Renders every definition as a function-calling JSON object.
    #[must_use]
    pub fn to_function_json(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|t| t.definition.to_function_json())
            .collect()
    }

    /// Builds a new set from the named tools, in the order given.
    ///
    /// # Errors
    ///
    /// Returns `ToolError::NotFound` for the first name not in this set.
    pub fn select(&self, names: &[&str]) -> Result<Self, ToolError> {
        let tools = names
            .iter()
            .map(|name| self.get(name).cloned().ok_or_else(|| ToolError::not_found(*name)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { tools })
    }

    /// Runs a tool call requested by the model.
    ///
    /// # Errors
    ///
    /// Returns `ToolError::NotFound` for unknown tools, or the tool's own
    /// error.
    pub async fn invoke(&self, call: &ToolCall) -> Result<String, ToolError> {
        let spec = self
            .get(&call.name)
            .ok_or_else(|| ToolError::not_found(&call.name))?;
        spec.invoke(call.arguments.clone()).await
    }

    /// Returns the number of tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
