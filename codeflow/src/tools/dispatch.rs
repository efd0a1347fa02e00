//! The closed mapping from intent to solving strategy and tool set.

use super::{
    analyze_time_space_complexity, detect_python_errors, explain_failure_trace,
    suggest_refactorings, validate_python_syntax, ToolSet,
};
use crate::core::Intent;
use crate::errors::ToolError;
use crate::providers::TextModel;
use std::sync::Arc;

/// Checks Python syntax locally.
pub const VALIDATE_PYTHON_SYNTAX: &str = "validate_python_syntax";
/// Lists likely bugs.
pub const DETECT_PYTHON_ERRORS: &str = "detect_python_errors";
/// Explains a traceback.
pub const EXPLAIN_FAILURE_TRACE: &str = "explain_failure_trace";
/// Big-O analysis.
pub const ANALYZE_TIME_SPACE_COMPLEXITY: &str = "analyze_time_space_complexity";
/// Refactoring suggestions.
pub const SUGGEST_REFACTORINGS: &str = "suggest_refactorings";

/// Opening line of the debugging session instruction.
pub const DEBUG_TASK_HINT: &str = "Debug the following Python code.";
/// Opening line of the optimization session instruction.
pub const OPTIMIZE_TASK_HINT: &str = "Analyze and optimize the following Python code.";

/// Returns the tool names an intent gets, in the order offered to the model.
#[must_use]
pub fn tool_names_for(intent: Intent) -> &'static [&'static str] {
    match intent {
        Intent::Debug => &[
            VALIDATE_PYTHON_SYNTAX,
            DETECT_PYTHON_ERRORS,
            EXPLAIN_FAILURE_TRACE,
        ],
        Intent::Optimize => &[
            ANALYZE_TIME_SPACE_COMPLEXITY,
            SUGGEST_REFACTORINGS,
            VALIDATE_PYTHON_SYNTAX,
        ],
        Intent::Generate => &[],
    }
}

/// How the solve stage handles an intent.
#[derive(Debug, Clone)]
pub enum SolvePlan {
    /// One prompt to the code model, no tools.
    DirectGeneration,
    /// A tool-using reasoning session.
    ReasoningSession {
        /// First line of the instruction.
        task_hint: &'static str,
        /// Tools the session may call.
        tools: ToolSet,
    },
}

/// Every tool the pipeline knows, and the per-intent selection over them.
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    tools: ToolSet,
}

impl ToolCatalog {
    /// Builds the standard catalog, with model-backed tools on `code_model`.
    #[must_use]
    pub fn new(code_model: Arc<dyn TextModel>) -> Self {
        let tools = ToolSet::new()
            .with(validate_python_syntax())
            .with(detect_python_errors(Arc::clone(&code_model)))
            .with(explain_failure_trace(Arc::clone(&code_model)))
            .with(analyze_time_space_complexity(Arc::clone(&code_model)))
            .with(suggest_refactorings(code_model));
        Self { tools }
    }

    /// Wraps an arbitrary tool set.
    #[must_use]
    pub fn from_tools(tools: ToolSet) -> Self {
        Self { tools }
    }

    /// Returns every tool in the catalog.
    #[must_use]
    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    /// Returns the tools for `intent`, in dispatch order.
    ///
    /// # Errors
    ///
    /// Returns `ToolError::NotFound` if the catalog lacks one of them.
    pub fn tools_for(&self, intent: Intent) -> Result<ToolSet, ToolError> {
        self.tools.select(tool_names_for(intent))
    }

    /// Decides how to solve `intent`.
    ///
    /// # Errors
    ///
    /// Returns `ToolError::NotFound` if the catalog lacks a required tool.
    pub fn plan(&self, intent: Intent) -> Result<SolvePlan, ToolError> {
        let task_hint = match intent {
            Intent::Generate => return Ok(SolvePlan::DirectGeneration),
            Intent::Debug => DEBUG_TASK_HINT,
            Intent::Optimize => OPTIMIZE_TASK_HINT,
        };
        Ok(SolvePlan::ReasoningSession {
            task_hint,
            tools: self.tools_for(intent)?,
        })
    }
}

impl ToolSet {
    /// Returns the tools `catalog` assigns to `intent`.
    ///
    /// # Errors
    ///
    /// Returns `ToolError::NotFound` if the catalog lacks one of them.
    pub fn for_intent(catalog: &ToolCatalog, intent: Intent) -> Result<Self, ToolError> {
        catalog.tools_for(intent)
    }
}
