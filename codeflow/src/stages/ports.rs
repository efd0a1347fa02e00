//! Collaborators injected into the standard stages.

use crate::providers::{TextModel, VisionModel};
use crate::resources::ImageResolver;
use crate::session::ReasoningSession;
use std::sync::Arc;

/// The external capabilities the standard pipeline needs.
#[derive(Clone)]
pub struct StagePorts {
    /// Model for direct generation and model-backed tools.
    pub code_model: Arc<dyn TextModel>,
    /// Model for image analysis.
    pub vision_model: Arc<dyn VisionModel>,
    /// Image loader.
    pub images: Arc<dyn ImageResolver>,
    /// Tool-using session for debug and optimize requests.
    pub session: Arc<dyn ReasoningSession>,
}

impl std::fmt::Debug for StagePorts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagePorts")
            .field("code_model", &self.code_model.model_name())
            .field("vision_model", &self.vision_model.model_name())
            .finish_non_exhaustive()
    }
}

impl StagePorts {
    /// Creates ports from explicit collaborators.
    #[must_use]
    pub fn new(
        code_model: Arc<dyn TextModel>,
        vision_model: Arc<dyn VisionModel>,
        images: Arc<dyn ImageResolver>,
        session: Arc<dyn ReasoningSession>,
    ) -> Self {
        Self {
            code_model,
            vision_model,
            images,
            session,
        }
    }
}

#[cfg(feature = "ollama")]
impl StagePorts {
    /// Creates ports backed by Ollama clients, the filesystem image
    /// resolver and a tool-loop session on the brain model.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn ollama(config: &crate::config::CodeflowConfig) -> Result<Self, crate::errors::CodeflowError> {
        use crate::providers::OllamaClient;
        use crate::resources::FileImageResolver;
        use crate::session::ToolLoopSession;

        let brain = Arc::new(OllamaClient::brain(&config.models)?);
        Ok(Self::new(
            Arc::new(OllamaClient::code(&config.models)?),
            Arc::new(OllamaClient::vision(&config.models)?),
            Arc::new(FileImageResolver::new()),
            Arc::new(ToolLoopSession::new(brain, config.session.max_rounds)),
        ))
    }
}
