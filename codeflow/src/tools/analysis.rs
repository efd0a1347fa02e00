//! Tools that delegate to the code model.

use super::{ToolDefinition, ToolInput, ToolInvoker, ToolSpec};
use crate::errors::ToolError;
use crate::providers::TextModel;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A tool that fills a prompt template with its single argument and returns
/// the model's raw answer.
pub struct ModelBackedTool {
    argument: &'static str,
    template: fn(&str) -> String,
    model: Arc<dyn TextModel>,
}

impl fmt::Debug for ModelBackedTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelBackedTool")
            .field("argument", &self.argument)
            .field("model", &self.model.model_name())
            .finish_non_exhaustive()
    }
}

impl ModelBackedTool {
    /// Creates a tool reading `argument` and rendering it with `template`.
    #[must_use]
    pub fn new(
        argument: &'static str,
        template: fn(&str) -> String,
        model: Arc<dyn TextModel>,
    ) -> Self {
        Self {
            argument,
            template,
            model,
        }
    }
}

#[async_trait]
impl ToolInvoker for ModelBackedTool {
    async fn invoke(&self, input: &ToolInput) -> Result<String, ToolError> {
        let value = input.required_str(self.argument)?;
        let prompt = (self.template)(value);
        debug!(tool = %input.tool_name, model = self.model.model_name(), "invoking model-backed tool");

        self.model
            .generate(&prompt)
            .await
            .map_err(|e| ToolError::execution_failed(&input.tool_name, e.to_string()))
    }
}

fn spec(
    name: &str,
    description: &str,
    argument: &'static str,
    argument_description: &str,
    template: fn(&str) -> String,
    model: Arc<dyn TextModel>,
) -> ToolSpec {
    ToolSpec::new(
        ToolDefinition::single_string_argument(name, description, argument, argument_description),
        Arc::new(ModelBackedTool::new(argument, template, model)),
    )
}

fn detect_errors_prompt(code: &str) -> String {
    format!(
        "Analyze the following Python code and list:\n\
         - logical bugs\n\
         - runtime error risks\n\
         - incorrect assumptions\n\n\
         Do NOT rewrite the code.\n\
         Do NOT suggest fixes.\n\n\
         Code:\n{code}\n"
    )
}

fn explain_trace_prompt(trace: &str) -> String {
    format!(
        "Explain the following Python error traceback.\n\
         Focus on:\n\
         - what failed\n\
         - why it failed\n\
         - where it failed\n\n\
         Traceback:\n{trace}\n"
    )
}

fn complexity_prompt(code: &str) -> String {
    format!(
        "Analyze the time and space complexity of the following Python code.\n\
         Use Big-O notation.\n\
         Explain briefly.\n\n\
         Code:\n{code}\n"
    )
}

fn refactor_prompt(code: &str) -> String {
    format!(
        "Suggest refactoring improvements for the following Python code.\n\
         Rules:\n\
         - Preserve behavior\n\
         - No full rewrites\n\
         - Focus on readability, maintainability, performance\n\n\
         Code:\n{code}\n"
    )
}

/// Lists likely logical bugs and runtime risks without fixing them.
#[must_use]
pub fn detect_python_errors(model: Arc<dyn TextModel>) -> ToolSpec {
    spec(
        super::DETECT_PYTHON_ERRORS,
        "Identify likely logical or runtime bugs in the code. Do NOT fix them. List causes and locations.",
        "code",
        "The Python source code to analyze",
        detect_errors_prompt,
        model,
    )
}

/// Explains a traceback: what, why and where it failed.
#[must_use]
pub fn explain_failure_trace(model: Arc<dyn TextModel>) -> ToolSpec {
    spec(
        super::EXPLAIN_FAILURE_TRACE,
        "Explain a Python error trace in plain language. Focus on root cause.",
        "trace",
        "The Python traceback text",
        explain_trace_prompt,
        model,
    )
}

/// Big-O time and space analysis.
#[must_use]
pub fn analyze_time_space_complexity(model: Arc<dyn TextModel>) -> ToolSpec {
    spec(
        super::ANALYZE_TIME_SPACE_COMPLEXITY,
        "Analyze time and space complexity of the code. Use Big-O notation.",
        "code",
        "The Python source code to analyze",
        complexity_prompt,
        model,
    )
}

/// Behaviour-preserving refactoring suggestions.
#[must_use]
pub fn suggest_refactorings(model: Arc<dyn TextModel>) -> ToolSpec {
    spec(
        super::SUGGEST_REFACTORINGS,
        "Suggest refactoring ideas without changing behavior. No full rewrites.",
        "code",
        "The Python source code to refactor",
        refactor_prompt,
        model,
    )
}
