//! The route-intent stage.

use super::{IntentClassifier, Stage};
use crate::context::{PipelineState, StateUpdate};
use crate::core::{StageKind, StageOutput};
use crate::errors::CodeflowError;
use async_trait::async_trait;
use std::sync::Arc;

/// Writes `intent` from `problem_text`. Never calls a model.
#[derive(Debug, Clone)]
pub struct RouteIntentStage {
    classifier: Arc<dyn IntentClassifier>,
}

impl RouteIntentStage {
    /// Stage name.
    pub const NAME: &'static str = "route-intent";

    /// Creates the stage.
    #[must_use]
    pub fn new(classifier: Arc<dyn IntentClassifier>) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl Stage for RouteIntentStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn kind(&self) -> StageKind {
        StageKind::Route
    }

    async fn execute(&self, state: &PipelineState) -> Result<StageOutput, CodeflowError> {
        let text = state.problem_text.as_deref().unwrap_or_default();
        let intent = self.classifier.classify(text);
        Ok(StageOutput::ok(StateUpdate::new().with_intent(intent)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassifierConfig;
    use crate::core::Intent;
    use crate::stages::KeywordClassifier;

    fn stage() -> RouteIntentStage {
        RouteIntentStage::new(Arc::new(
            KeywordClassifier::new(&ClassifierConfig::default()).unwrap(),
        ))
    }

    async fn route(problem_text: Option<&str>) -> Intent {
        let mut state = PipelineState::new("ignored traceback", "t");
        state.problem_text = problem_text.map(String::from);
        stage().execute(&state).await.unwrap().update.intent.unwrap()
    }

    #[tokio::test]
    async fn test_routes_on_problem_text() {
        assert_eq!(route(Some("NameError: x is not defined")).await, Intent::Debug);
        assert_eq!(route(Some("speed up this loop")).await, Intent::Optimize);
        assert_eq!(route(Some("binary search")).await, Intent::Generate);
    }

    #[tokio::test]
    async fn test_missing_problem_text_is_empty() {
        assert_eq!(route(None).await, Intent::Generate);
    }

    #[tokio::test]
    async fn test_writes_only_intent() {
        let mut state = PipelineState::new("q", "t");
        state.problem_text = Some("crash".to_string());
        let output = stage().execute(&state).await.unwrap();

        assert_eq!(output.update.fields(), vec![crate::context::StateField::Intent]);
    }
}
