//! Configuration for models, the reasoning session, instrumentation,
//! classification and logging.
//!
//! Every field has a serde default, so a partial JSON file (or none at all)
//! yields a complete configuration. Environment variables are applied on top
//! of whatever was loaded.

use crate::errors::CodeflowError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Overrides `models.base_url`.
pub const ENV_OLLAMA_URL: &str = "CODEFLOW_OLLAMA_URL";
/// Overrides `models.brain_model`.
pub const ENV_BRAIN_MODEL: &str = "CODEFLOW_BRAIN_MODEL";
/// Overrides `models.code_model`.
pub const ENV_CODE_MODEL: &str = "CODEFLOW_CODE_MODEL";
/// Overrides `models.vision_model`.
pub const ENV_VISION_MODEL: &str = "CODEFLOW_VISION_MODEL";
/// Overrides `logging.level`; also read directly as a filter directive.
pub const ENV_LOG: &str = "CODEFLOW_LOG";
/// Overrides `logging.format`.
pub const ENV_LOG_FORMAT: &str = "CODEFLOW_LOG_FORMAT";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeflowConfig {
    /// Model endpoints and sampling.
    #[serde(default)]
    pub models: ModelConfig,
    /// Reasoning session limits.
    #[serde(default)]
    pub session: SessionConfig,
    /// Log truncation thresholds.
    #[serde(default)]
    pub instrumentation: InstrumentationConfig,
    /// Intent keyword groups.
    #[serde(default)]
    pub classifier: ClassifierConfig,
    /// Log level and format.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CodeflowConfig {
    /// Reads a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns `CodeflowError::Config` if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CodeflowError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CodeflowError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            CodeflowError::Config(format!("failed to parse {}: {e}", path.display()))
        })
    }

    /// Loads the file (if any), applies environment overrides and validates.
    ///
    /// # Errors
    ///
    /// Returns `CodeflowError::Config` on unreadable files or invalid values.
    pub fn load(path: Option<&Path>) -> Result<Self, CodeflowError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from an environment lookup. Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_OLLAMA_URL) {
            self.models.base_url = url;
        }
        if let Some(model) = get(ENV_BRAIN_MODEL) {
            self.models.brain_model = model;
        }
        if let Some(model) = get(ENV_CODE_MODEL) {
            self.models.code_model = model;
        }
        if let Some(model) = get(ENV_VISION_MODEL) {
            self.models.vision_model = model;
        }
        if let Some(level) = get(ENV_LOG) {
            self.logging.level = level;
        }
        if let Some(format) = get(ENV_LOG_FORMAT) {
            match format.to_ascii_lowercase().as_str() {
                "json" => self.logging.format = LogFormat::Json,
                "text" => self.logging.format = LogFormat::Text,
                other => tracing::warn!(value = other, "ignoring unknown log format"),
            }
        }
    }

    /// Checks the configuration for values the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `CodeflowError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<(), CodeflowError> {
        let models = [
            ("models.brain_model", &self.models.brain_model),
            ("models.code_model", &self.models.code_model),
            ("models.vision_model", &self.models.vision_model),
            ("models.base_url", &self.models.base_url),
        ];
        for (field, value) in models {
            if value.trim().is_empty() {
                return Err(CodeflowError::Config(format!("{field} must not be empty")));
            }
        }
        let timeout = self.models.timeout_seconds;
        if timeout <= 0.0 || Duration::try_from_secs_f64(timeout).is_err() {
            return Err(CodeflowError::Config(format!(
                "models.timeout_seconds must be a positive, representable number of seconds, got {timeout}"
            )));
        }
        if self.session.max_rounds == 0 {
            return Err(CodeflowError::Config(
                "session.max_rounds must be at least 1".to_string(),
            ));
        }
        let thresholds = [
            ("instrumentation.entry_truncate", self.instrumentation.entry_truncate),
            ("instrumentation.delta_truncate", self.instrumentation.delta_truncate),
        ];
        for (field, value) in thresholds {
            if value < MIN_TRUNCATE {
                return Err(CodeflowError::Config(format!(
                    "{field} must be at least {MIN_TRUNCATE}, got {value}"
                )));
            }
        }
        Ok(())
    }
}

const MIN_TRUNCATE: usize = 4;

/// Model service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base URL of the Ollama server.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model driving the reasoning session.
    #[serde(default = "default_brain_model")]
    pub brain_model: String,
    /// Model used for direct generation and model-backed tools.
    #[serde(default = "default_code_model")]
    pub code_model: String,
    /// Model used for image analysis.
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
    /// Sampling temperature of the brain model.
    #[serde(default = "default_brain_temperature")]
    pub brain_temperature: f64,
    /// Sampling temperature of the code model.
    #[serde(default = "default_low_temperature")]
    pub code_temperature: f64,
    /// Sampling temperature of the vision model.
    #[serde(default = "default_low_temperature")]
    pub vision_temperature: f64,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_brain_model() -> String {
    "llama3.1".to_string()
}

fn default_code_model() -> String {
    "qwen2.5-coder:1.5b".to_string()
}

fn default_vision_model() -> String {
    "qwen3-vl:2b".to_string()
}

fn default_brain_temperature() -> f64 {
    0.2
}

fn default_low_temperature() -> f64 {
    0.1
}

fn default_timeout() -> f64 {
    120.0
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            brain_model: default_brain_model(),
            code_model: default_code_model(),
            vision_model: default_vision_model(),
            brain_temperature: default_brain_temperature(),
            code_temperature: default_low_temperature(),
            vision_temperature: default_low_temperature(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl ModelConfig {
    /// Gets the request timeout as a `Duration`.
    ///
    /// Falls back to the default timeout when `timeout_seconds` cannot be
    /// represented; `CodeflowConfig::validate` rejects such values up front.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_seconds)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_timeout()))
    }
}

/// Reasoning session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum number of model turns before giving up.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
}

fn default_max_rounds() -> usize {
    8
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
        }
    }
}

/// Truncation thresholds for stage logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentationConfig {
    /// Max characters of a field value in the entry log.
    #[serde(default = "default_entry_truncate")]
    pub entry_truncate: usize,
    /// Max characters of a rendered value in the delta log.
    #[serde(default = "default_delta_truncate")]
    pub delta_truncate: usize,
}

fn default_entry_truncate() -> usize {
    80
}

fn default_delta_truncate() -> usize {
    60
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self {
            entry_truncate: default_entry_truncate(),
            delta_truncate: default_delta_truncate(),
        }
    }
}

/// Keyword groups for the keyword classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Phrases that mark a debugging request. Checked first.
    #[serde(default = "default_debug_keywords")]
    pub debug_keywords: Vec<String>,
    /// Phrases that mark an optimization request.
    #[serde(default = "default_optimize_keywords")]
    pub optimize_keywords: Vec<String>,
}

fn default_debug_keywords() -> Vec<String> {
    [
        "error",
        "traceback",
        "crash",
        "fail",
        "not defined",
        "attributeerror",
        "typeerror",
        "valueerror",
        "keyerror",
        "indexerror",
        "exception",
        "why does this fail",
        "fix this",
        "broken",
        "doesn't work",
        "debug",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_optimize_keywords() -> Vec<String> {
    [
        "optimize",
        "improve",
        "faster",
        "efficient",
        "refactor",
        "clean up",
        "best practice",
        "reduce memory",
        "speed up",
        "make it better",
        "performance",
        "simplify",
        "elegant",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            debug_keywords: default_debug_keywords(),
            optimize_keywords: default_optimize_keywords(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive: trace, debug, info, warn, error, off, or a full
    /// `EnvFilter` expression.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = CodeflowConfig::default();

        assert_eq!(config.models.base_url, "http://localhost:11434");
        assert_eq!(config.models.brain_model, "llama3.1");
        assert_eq!(config.models.code_model, "qwen2.5-coder:1.5b");
        assert_eq!(config.models.vision_model, "qwen3-vl:2b");
        assert_eq!(config.session.max_rounds, 8);
        assert_eq!(config.instrumentation.entry_truncate, 80);
        assert_eq!(config.instrumentation.delta_truncate, 60);
        assert_eq!(config.classifier.debug_keywords.len(), 16);
        assert_eq!(config.classifier.optimize_keywords.len(), 13);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: CodeflowConfig =
            serde_json::from_str(r#"{"models": {"code_model": "codellama"}, "logging": {"format": "json"}}"#)
                .unwrap();

        assert_eq!(config.models.code_model, "codellama");
        assert_eq!(config.models.brain_model, "llama3.1");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.session.max_rounds, 8);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"session": {{"max_rounds": 3}}}}"#).unwrap();

        let config = CodeflowConfig::from_file(file.path()).unwrap();
        assert_eq!(config.session.max_rounds, 3);
    }

    #[test]
    fn test_from_file_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = CodeflowConfig::from_file(file.path()).unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
    }

    #[test]
    fn test_from_missing_file() {
        let err = CodeflowConfig::from_file("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_OLLAMA_URL, "http://gpu-box:11434"),
            (ENV_CODE_MODEL, "deepseek-coder"),
            (ENV_VISION_MODEL, "  "),
            (ENV_LOG_FORMAT, "JSON"),
        ]);
        let mut config = CodeflowConfig::default();
        config.apply_env(|key| env.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.models.base_url, "http://gpu-box:11434");
        assert_eq!(config.models.code_model, "deepseek-coder");
        assert_eq!(config.models.vision_model, "qwen3-vl:2b");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = CodeflowConfig::default();
        config.session.max_rounds = 0;
        assert!(config.validate().is_err());

        let mut config = CodeflowConfig::default();
        config.models.code_model = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("models.code_model"));

        let mut config = CodeflowConfig::default();
        config.instrumentation.delta_truncate = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unrepresentable_timeout() {
        let config: CodeflowConfig =
            serde_json::from_str(r#"{"models":{"timeout_seconds":1e300}}"#).unwrap();
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
        assert!(err.to_string().contains("models.timeout_seconds"));
        assert_eq!(config.models.timeout(), Duration::from_secs(120));

        let mut config = CodeflowConfig::default();
        config.models.timeout_seconds = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = CodeflowConfig::default();
        config.models.timeout_seconds = 0.0;
        assert!(config.validate().is_err());

        let mut config = CodeflowConfig::default();
        config.models.timeout_seconds = 2.5;
        assert!(config.validate().is_ok());
        assert_eq!(config.models.timeout(), Duration::from_millis(2500));
    }
}
