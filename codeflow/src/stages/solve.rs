//! The solve stage: produces the final artifact for the routed intent.

use super::Stage;
use crate::context::{PipelineState, StateUpdate};
use crate::core::{StageKind, StageOutput};
use crate::errors::{CodeflowError, ValidationError};
use crate::providers::TextModel;
use crate::session::ReasoningSession;
use crate::tools::{SolvePlan, ToolCatalog};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Prefix of the artifact written when a reasoning session fails.
pub const AGENT_ERROR_PREFIX: &str = "# AGENT ERROR:";

/// Builds the direct-generation prompt.
#[must_use]
pub fn generate_prompt(problem_text: &str) -> String {
    format!(
        "Write Python code that solves this problem:\n\n{problem_text}\n\n\
         Respond with ONLY the code. No explanations."
    )
}

/// Writes `final_artifact`.
///
/// `generate` is a single code-model call whose failure aborts the run.
/// `debug` and `optimize` run a tool-using session; its failures are
/// contained in the artifact.
pub struct SolveStage {
    code_model: Arc<dyn TextModel>,
    session: Arc<dyn ReasoningSession>,
    catalog: ToolCatalog,
}

impl std::fmt::Debug for SolveStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolveStage")
            .field("tools", &self.catalog.tools().names())
            .finish_non_exhaustive()
    }
}

impl SolveStage {
    /// Stage name.
    pub const NAME: &'static str = "solve";

    /// Creates the stage.
    #[must_use]
    pub fn new(
        code_model: Arc<dyn TextModel>,
        session: Arc<dyn ReasoningSession>,
        catalog: ToolCatalog,
    ) -> Self {
        Self {
            code_model,
            session,
            catalog,
        }
    }
}

#[async_trait]
impl Stage for SolveStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn kind(&self) -> StageKind {
        StageKind::Agent
    }

    async fn execute(&self, state: &PipelineState) -> Result<StageOutput, CodeflowError> {
        let intent = state.intent.ok_or_else(|| ValidationError::missing("intent"))?;
        let problem_text = state
            .problem_text
            .as_deref()
            .ok_or_else(|| ValidationError::missing("problem_text"))?;

        match self.catalog.plan(intent)? {
            SolvePlan::DirectGeneration => {
                let code = self.code_model.generate(&generate_prompt(problem_text)).await?;
                Ok(StageOutput::ok(
                    StateUpdate::new().with_final_artifact(code.trim()),
                ))
            }
            SolvePlan::ReasoningSession { task_hint, tools } => {
                let instruction = format!("{task_hint}\n{problem_text}");
                info!(%intent, tools = ?tools.names(), "starting reasoning session");

                match self.session.run(&instruction, &tools).await {
                    Ok(answer) => Ok(StageOutput::ok(
                        StateUpdate::new().with_final_artifact(answer.trim()),
                    )),
                    Err(err) => {
                        warn!(%intent, error = %err, "reasoning session failed");
                        Ok(StageOutput::contained(
                            StateUpdate::new()
                                .with_final_artifact(format!("{AGENT_ERROR_PREFIX} {err}")),
                            err.to_string(),
                        ))
                    }
                }
            }
        }
    }
}
