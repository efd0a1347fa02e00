//! Tools available to the reasoning session, and the table that picks
//! which of them a given intent gets.

mod analysis;
mod definitions;
mod dispatch;
mod registry;
mod syntax;

pub use analysis::{
    analyze_time_space_complexity, detect_python_errors, explain_failure_trace,
    suggest_refactorings, ModelBackedTool,
};
pub use definitions::{ToolDefinition, ToolInput, ToolInvoker, ToolSpec};
pub use dispatch::{
    tool_names_for, ToolCatalog, SolvePlan, ANALYZE_TIME_SPACE_COMPLEXITY, DEBUG_TASK_HINT,
    DETECT_PYTHON_ERRORS, EXPLAIN_FAILURE_TRACE, OPTIMIZE_TASK_HINT, SUGGEST_REFACTORINGS,
    VALIDATE_PYTHON_SYNTAX,
};
pub use registry::ToolSet;
pub use syntax::{check_python_syntax, validate_python_syntax, PythonSyntaxTool, SYNTAX_OK};
