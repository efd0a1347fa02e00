//! Local Python syntax validation with the tree-sitter Python grammar.

use super::{ToolDefinition, ToolInput, ToolInvoker, ToolSpec, VALIDATE_PYTHON_SYNTAX as TOOL_NAME};
use crate::errors::ToolError;
use async_trait::async_trait;
use std::sync::Arc;
use tree_sitter::{Node, Parser};

/// Result text for code that parses cleanly.
pub const SYNTAX_OK: &str = "Syntax OK";

/// Parses `code` as Python and reports the first syntax problem.
///
/// Returns [`SYNTAX_OK`] or `SyntaxError: {what} at line {row}, column {col}`
/// with 1-based positions.
///
/// # Errors
///
/// Returns `ToolError::ExecutionFailed` if the grammar cannot be loaded or
/// the parser gives up.
pub fn check_python_syntax(code: &str) -> Result<String, ToolError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| ToolError::execution_failed(TOOL_NAME, format!("grammar error: {e}")))?;

    let tree = parser
        .parse(code, None)
        .ok_or_else(|| ToolError::execution_failed(TOOL_NAME, "parser returned no tree"))?;

    let Some(node) = first_error(tree.root_node()) else {
        return Ok(SYNTAX_OK.to_string());
    };

    let position = node.start_position();
    let what = if node.is_missing() {
        format!("missing '{}'", node.kind())
    } else {
        "invalid syntax".to_string()
    };
    Ok(format!(
        "SyntaxError: {what} at line {}, column {}",
        position.row + 1,
        position.column + 1
    ))
}

/// Depth-first, leftmost error or missing node.
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

/// Invoker for `validate_python_syntax`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonSyntaxTool;

#[async_trait]
impl ToolInvoker for PythonSyntaxTool {
    async fn invoke(&self, input: &ToolInput) -> Result<String, ToolError> {
        let code = input.required_str("code")?;
        check_python_syntax(code)
    }
}

/// Builds the `validate_python_syntax` tool.
#[must_use]
pub fn validate_python_syntax() -> ToolSpec {
    ToolSpec::new(
        ToolDefinition::single_string_argument(
            TOOL_NAME,
            "Check whether the given Python code is syntactically valid. Return errors only, no fixes.",
            "code",
            "The Python source code to check",
        ),
        Arc::new(PythonSyntaxTool),
    )
}
