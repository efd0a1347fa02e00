//! Ollama client over the native `/api/chat` endpoint.

use super::{ChatMessage, ChatModel, ChatRole, ChatTurn, TextModel, ToolCall, VisionModel};
use crate::config::ModelConfig;
use crate::errors::ModelError;
use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A client bound to one model on one Ollama server.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    model: String,
    base_url: String,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    stream: bool,
    options: RequestOptions,
    #[serde(skip_serializing_if = "<[Value]>::is_empty")]
    tools: &'a [Value],
}

#[derive(Debug, Serialize)]
struct RequestOptions {
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    function: WireFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

impl From<&ChatMessage> for WireMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.as_str(),
            content: msg.content.clone(),
            images: Vec::new(),
            tool_calls: msg
                .tool_calls
                .iter()
                .map(|call| WireToolCall {
                    function: WireFunction {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                })
                .collect(),
            tool_name: msg.tool_name.clone(),
        }
    }
}

impl OllamaClient {
    /// Creates a client for `model` at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Transport` if the HTTP client cannot be built.
    pub fn new(
        model: impl Into<String>,
        base_url: impl Into<String>,
        temperature: f64,
        timeout: Duration,
    ) -> Result<Self, ModelError> {
        let model = model.into();
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()
            .map_err(|e| ModelError::transport(&model, format!("failed to build client: {e}")))?;

        Ok(Self {
            client,
            model,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            temperature,
        })
    }

    /// Creates the client for the reasoning-session model.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Transport` if the HTTP client cannot be built.
    pub fn brain(config: &ModelConfig) -> Result<Self, ModelError> {
        Self::new(
            &config.brain_model,
            &config.base_url,
            config.brain_temperature,
            config.timeout(),
        )
    }

    /// Creates the client for code generation and model-backed tools.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Transport` if the HTTP client cannot be built.
    pub fn code(config: &ModelConfig) -> Result<Self, ModelError> {
        Self::new(
            &config.code_model,
            &config.base_url,
            config.code_temperature,
            config.timeout(),
        )
    }

    /// Creates the client for image analysis.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Transport` if the HTTP client cannot be built.
    pub fn vision(config: &ModelConfig) -> Result<Self, ModelError> {
        Self::new(
            &config.vision_model,
            &config.base_url,
            config.vision_temperature,
            config.timeout(),
        )
    }

    fn build_request<'a>(&'a self, messages: Vec<WireMessage>, tools: &'a [Value]) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options: RequestOptions {
                temperature: self.temperature,
            },
            tools,
        }
    }

    async fn send(&self, request: &ChatRequest<'_>) -> Result<ChatTurn, ModelError> {
        let url = format!("{}/api/chat", self.base_url);
        debug!(model = %self.model, url = %url, messages = request.messages.len(), "sending chat request");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ModelError::transport(&self.model, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ModelError::transport(&self.model, e.to_string()))?;

        if !status.is_success() {
            return Err(ModelError::status(&self.model, status.as_u16(), body));
        }

        parse_response(&self.model, &body)
    }

    async fn single_prompt(&self, prompt: &str, images: Vec<String>) -> Result<String, ModelError> {
        let message = WireMessage {
            role: ChatRole::User.as_str(),
            content: prompt.to_string(),
            images,
            tool_calls: Vec::new(),
            tool_name: None,
        };
        let request = self.build_request(vec![message], &[]);

        match self.send(&request).await? {
            ChatTurn::Text(text) => Ok(text),
            ChatTurn::ToolCalls { .. } => Err(ModelError::malformed(
                &self.model,
                "unexpected tool calls in a prompt without tools",
            )),
        }
    }
}

/// Interprets an `/api/chat` response body.
fn parse_response(model: &str, body: &str) -> Result<ChatTurn, ModelError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ModelError::malformed(model, format!("invalid JSON body: {e}")))?;

    if let Some(error) = parsed.error {
        return Err(ModelError::malformed(model, error));
    }
    let message = parsed
        .message
        .ok_or_else(|| ModelError::malformed(model, "response has no message"))?;

    if message.tool_calls.is_empty() {
        return Ok(ChatTurn::Text(message.content));
    }

    let calls = message
        .tool_calls
        .into_iter()
        .map(|call| {
            let arguments = match call.function.arguments {
                Value::String(raw) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
                other => other,
            };
            ToolCall::new(call.function.name, arguments)
        })
        .collect();

    Ok(ChatTurn::ToolCalls {
        content: message.content,
        calls,
    })
}

#[async_trait]
impl TextModel for OllamaClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        self.single_prompt(prompt, Vec::new()).await
    }
}

#[async_trait]
impl VisionModel for OllamaClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate_with_image(&self, prompt: &str, image: &[u8]) -> Result<String, ModelError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        self.single_prompt(prompt, vec![encoded]).await
    }
}

#[async_trait]
impl ChatModel for OllamaClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn chat(&self, messages: &[ChatMessage], tools: &[Value]) -> Result<ChatTurn, ModelError> {
        let wire = messages.iter().map(WireMessage::from).collect();
        let request = self.build_request(wire, tools);
        self.send(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn client() -> OllamaClient {
        OllamaClient::new("qwen2.5-coder:1.5b", "http://localhost:11434/", 0.1, Duration::from_secs(5))
            .unwrap()
    }

    #[test]
    fn test_base_url_is_normalized() {
        assert_eq!(client().base_url, "http://localhost:11434");
    }

    #[test]
    fn test_from_config_uses_model_names() {
        let config = ModelConfig::default();
        assert_eq!(TextModel::model_name(&OllamaClient::code(&config).unwrap()), "qwen2.5-coder:1.5b");
        assert_eq!(ChatModel::model_name(&OllamaClient::brain(&config).unwrap()), "llama3.1");
        assert_eq!(VisionModel::model_name(&OllamaClient::vision(&config).unwrap()), "qwen3-vl:2b");
    }

    #[test]
    fn test_request_serialization() {
        let client = client();
        let tools = vec![json!({"type": "function", "function": {"name": "validate_python_syntax"}})];
        let messages = vec![
            WireMessage::from(&ChatMessage::user("fix it")),
            WireMessage::from(&ChatMessage::tool("validate_python_syntax", "Syntax OK")),
        ];
        let request = client.build_request(messages, &tools);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "qwen2.5-coder:1.5b");
        assert_eq!(value["stream"], false);
        assert_eq!(value["options"]["temperature"], 0.1);
        assert_eq!(value["messages"][0], json!({"role": "user", "content": "fix it"}));
        assert_eq!(value["messages"][1]["tool_name"], "validate_python_syntax");
        assert_eq!(value["tools"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_request_without_tools_omits_field() {
        let client = client();
        let request = client.build_request(vec![], &[]);
        let value = serde_json::to_value(&request).unwrap();

        assert!(value.get("tools").is_none());
    }

    #[test]
    fn test_parse_text_response() {
        let body = r#"{"model":"m","message":{"role":"assistant","content":"print(1)"},"done":true}"#;
        assert_eq!(parse_response("m", body).unwrap(), ChatTurn::Text("print(1)".to_string()));
    }

    #[test]
    fn test_parse_tool_call_response() {
        let body = json!({
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [
                    {"function": {"name": "validate_python_syntax", "arguments": {"code": "x ="}}},
                    {"function": {"name": "explain_failure_trace", "arguments": "{\"trace\": \"boom\"}"}}
                ]
            }
        })
        .to_string();

        let ChatTurn::ToolCalls { calls, .. } = parse_response("m", &body).unwrap() else {
            panic!("expected tool calls");
        };
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].arguments["code"], "x =");
        assert_eq!(calls[1].arguments["trace"], "boom");
    }

    #[test]
    fn test_parse_error_responses() {
        assert!(matches!(
            parse_response("m", "not json"),
            Err(ModelError::Malformed { .. })
        ));
        assert!(matches!(
            parse_response("m", r#"{"error":"model 'm' not found"}"#),
            Err(ModelError::Malformed { .. })
        ));
        assert!(matches!(
            parse_response("m", r#"{"done":true}"#),
            Err(ModelError::Malformed { .. })
        ));
    }
}
