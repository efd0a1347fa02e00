//! The classify-input stage: turns the query and optional image into one
//! problem description.

use super::Stage;
use crate::context::{ImageRef, PipelineState, StateUpdate};
use crate::core::{StageKind, StageOutput};
use crate::errors::CodeflowError;
use crate::providers::VisionModel;
use crate::resources::ImageResolver;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Instruction sent with every image.
pub const VISION_PROMPT: &str = "You are a helpful coding assistant. \
Describe the content of this image clearly and concisely. \
If it shows code, extract it exactly. \
If it shows a data structure (e.g., tree, graph), describe its structure and values. \
If it shows an error, quote the traceback. \
Do not add explanations or markdown.";

/// Writes `problem_text`. Image failures are folded into the text and
/// reported as contained.
pub struct ClassifyInputStage {
    vision_model: Arc<dyn VisionModel>,
    images: Arc<dyn ImageResolver>,
}

impl std::fmt::Debug for ClassifyInputStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifyInputStage")
            .field("vision_model", &self.vision_model.model_name())
            .finish_non_exhaustive()
    }
}

impl ClassifyInputStage {
    /// Stage name.
    pub const NAME: &'static str = "classify-input";

    /// Creates the stage.
    #[must_use]
    pub fn new(vision_model: Arc<dyn VisionModel>, images: Arc<dyn ImageResolver>) -> Self {
        Self {
            vision_model,
            images,
        }
    }

    async fn describe(&self, query: &str, image: &ImageRef) -> StageOutput {
        let bytes = match self.images.resolve(image).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(image = %image, error = %err, "image could not be loaded");
                let text = format!("{query}\n\n[VISION ERROR]: Failed to load image: {err}");
                return StageOutput::contained(
                    StateUpdate::new().with_problem_text(text),
                    err.to_string(),
                );
            }
        };

        debug!(image = %image, bytes = bytes.len(), "running vision model");
        let (analysis, contained) = match self
            .vision_model
            .generate_with_image(VISION_PROMPT, &bytes)
            .await
        {
            Ok(response) => (response.trim().to_string(), None),
            Err(err) => (format!("[VL_INFERENCE_ERROR: {err}]"), Some(err.to_string())),
        };

        let text = format!("{query}\n\n[VISION ANALYSIS]:\n{analysis}")
            .trim()
            .to_string();
        let update = StateUpdate::new().with_problem_text(text);
        match contained {
            Some(err) => StageOutput::contained(update, err),
            None => StageOutput::ok(update),
        }
    }
}

#[async_trait]
impl Stage for ClassifyInputStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn kind(&self) -> StageKind {
        StageKind::Transform
    }

    async fn execute(&self, state: &PipelineState) -> Result<StageOutput, CodeflowError> {
        let query = state.query.trim();
        match &state.image_ref {
            None => Ok(StageOutput::ok(StateUpdate::new().with_problem_text(query))),
            Some(image) => Ok(self.describe(query, image).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ModelError;
    use crate::testing::{MockImageResolver, MockVisionModel};
    use pretty_assertions::assert_eq;

    fn stage(vision: MockVisionModel, images: MockImageResolver) -> ClassifyInputStage {
        ClassifyInputStage::new(Arc::new(vision), Arc::new(images))
    }

    #[tokio::test]
    async fn test_text_only_query_is_trimmed() {
        let vision = Arc::new(MockVisionModel::always("unused"));
        let stage = ClassifyInputStage::new(
            vision.clone(),
            Arc::new(MockImageResolver::with_bytes(vec![1])),
        );

        let output = stage
            .execute(&PipelineState::new("  sort a list \n", "t"))
            .await
            .unwrap();

        assert_eq!(output.update.problem_text.as_deref(), Some("sort a list"));
        assert!(!output.is_contained());
        assert!(vision.calls().is_empty());
    }

    #[tokio::test]
    async fn test_image_is_described() {
        let vision = Arc::new(MockVisionModel::always("  x = [1, 2\n"));
        let stage = ClassifyInputStage::new(
            vision.clone(),
            Arc::new(MockImageResolver::with_bytes(vec![1, 2, 3])),
        );
        let state = PipelineState::new("fix this", "t").with_image(ImageRef::new("shot.png"));

        let output = stage.execute(&state).await.unwrap();

        assert_eq!(
            output.update.problem_text.as_deref(),
            Some("fix this\n\n[VISION ANALYSIS]:\nx = [1, 2")
        );
        assert_eq!(vision.calls(), vec![(VISION_PROMPT.to_string(), 3)]);
    }

    #[tokio::test]
    async fn test_image_only_request_is_trimmed() {
        let stage = stage(
            MockVisionModel::always("print(1)"),
            MockImageResolver::with_bytes(vec![1]),
        );
        let state = PipelineState::new("", "t").with_image(ImageRef::new("shot.png"));

        let output = stage.execute(&state).await.unwrap();

        assert_eq!(
            output.update.problem_text.as_deref(),
            Some("[VISION ANALYSIS]:\nprint(1)")
        );
    }

    #[tokio::test]
    async fn test_unreadable_image_is_contained() {
        let stage = stage(
            MockVisionModel::always("unused"),
            MockImageResolver::failing("not found"),
        );
        let state = PipelineState::new("why", "t").with_image(ImageRef::new("missing.png"));

        let output = stage.execute(&state).await.unwrap();
        let text = output.update.problem_text.unwrap();

        assert_eq!(output.status, crate::core::StageStatus::Contained);
        assert!(text.starts_with("why\n\n[VISION ERROR]: Failed to load image: "));
        assert!(text.contains("missing.png"));
    }

    #[tokio::test]
    async fn test_vision_failure_is_contained() {
        let stage = stage(
            MockVisionModel::new(vec![Err(ModelError::transport("qwen3-vl:2b", "refused"))]),
            MockImageResolver::with_bytes(vec![1]),
        );
        let state = PipelineState::new("q", "t").with_image(ImageRef::new("a.png"));

        let output = stage.execute(&state).await.unwrap();
        let text = output.update.problem_text.clone().unwrap();

        assert!(output.is_contained());
        assert!(text.starts_with("q\n\n[VISION ANALYSIS]:\n[VL_INFERENCE_ERROR: "));
        assert!(text.ends_with(']'));
    }
}
