//! Intent classification policies.

use crate::config::ClassifierConfig;
use crate::core::Intent;
use crate::errors::CodeflowError;
use regex::{Regex, RegexBuilder};

/// Maps problem text to an intent. Must be pure.
pub trait IntentClassifier: Send + Sync + std::fmt::Debug {
    /// Classifies `text`.
    fn classify(&self, text: &str) -> Intent;
}

/// Keyword matching with a fixed priority: debug, then optimize, then
/// generate.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    debug: Option<Regex>,
    optimize: Option<Regex>,
}

impl KeywordClassifier {
    /// Compiles the keyword groups into case-insensitive alternations.
    ///
    /// An empty group never matches.
    ///
    /// # Errors
    ///
    /// Returns `CodeflowError::Config` if a pattern fails to compile.
    pub fn new(config: &ClassifierConfig) -> Result<Self, CodeflowError> {
        Ok(Self {
            debug: compile_group("debug", &config.debug_keywords)?,
            optimize: compile_group("optimize", &config.optimize_keywords)?,
        })
    }
}

fn compile_group(group: &str, keywords: &[String]) -> Result<Option<Regex>, CodeflowError> {
    let alternatives: Vec<String> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(regex::escape)
        .collect();
    if alternatives.is_empty() {
        return Ok(None);
    }

    RegexBuilder::new(&alternatives.join("|"))
        .case_insensitive(true)
        .build()
        .map(Some)
        .map_err(|e| CodeflowError::Config(format!("invalid {group} keyword pattern: {e}")))
}

impl IntentClassifier for KeywordClassifier {
    fn classify(&self, text: &str) -> Intent {
        let text = text.trim().to_lowercase();
        let matches = |group: &Option<Regex>| group.as_ref().is_some_and(|re| re.is_match(&text));

        if matches(&self.debug) {
            Intent::Debug
        } else if matches(&self.optimize) {
            Intent::Optimize
        } else {
            Intent::Generate
        }
    }
}
