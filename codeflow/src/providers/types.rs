//! Conversation types shared by chat models and the reasoning session.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// System instructions.
    System,
    /// The user.
    User,
    /// The model.
    Assistant,
    /// A tool result.
    Tool,
}

impl ChatRole {
    /// Returns the wire name of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to invoke.
    pub name: String,
    /// Arguments, as a JSON object.
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    /// Creates a tool call.
    #[must_use]
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// One message of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The author.
    pub role: ChatRole,
    /// The text.
    pub content: String,
    /// Tool calls made by an assistant message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// The tool that produced a `tool` message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl ChatMessage {
    fn plain(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_name: None,
        }
    }

    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(ChatRole::System, content)
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(ChatRole::User, content)
    }

    /// Creates an assistant text message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(ChatRole::Assistant, content)
    }

    /// Creates an assistant message that requested tool calls.
    #[must_use]
    pub fn assistant_with_calls(content: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::plain(ChatRole::Assistant, content)
        }
    }

    /// Creates a tool result message.
    #[must_use]
    pub fn tool(tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_name: Some(tool_name.into()),
            ..Self::plain(ChatRole::Tool, content)
        }
    }
}

/// The model's reply to one chat request.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatTurn {
    /// A final text answer.
    Text(String),
    /// A request to run tools before answering.
    ToolCalls {
        /// Any text the model sent alongside the calls.
        content: String,
        /// The requested calls, in order.
        calls: Vec<ToolCall>,
    },
}

impl ChatTurn {
    /// Returns true if the model asked for tools.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        matches!(self, Self::ToolCalls { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_constructors() {
        let msg = ChatMessage::tool("validate_python_syntax", "Syntax OK");
        assert_eq!(msg.role, ChatRole::Tool);
        assert_eq!(msg.tool_name.as_deref(), Some("validate_python_syntax"));

        let msg = ChatMessage::assistant_with_calls(
            "",
            vec![ToolCall::new("detect_python_errors", json!({"code": "x = 1"}))],
        );
        assert_eq!(msg.role, ChatRole::Assistant);
        assert_eq!(msg.tool_calls.len(), 1);
    }

    #[test]
    fn test_message_serialization_omits_empty_parts() {
        let json = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(json, json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn test_chat_turn_has_tool_calls() {
        assert!(!ChatTurn::Text("done".to_string()).has_tool_calls());
        assert!(ChatTurn::ToolCalls {
            content: String::new(),
            calls: vec![]
        }
        .has_tool_calls());
    }
}
