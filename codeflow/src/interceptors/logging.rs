//! The default interceptor: logs each stage's view of the state and what it
//! changed.

use super::Interceptor;
use crate::config::InstrumentationConfig;
use crate::context::{truncate_preview, PipelineState, StageContext, StateDelta, StateField};
use crate::core::{StageKind, StageOutput};
use crate::errors::CodeflowError;
use async_trait::async_trait;
use tracing::{error, info, warn};

/// Fields included in the entry log, in this order.
pub const ENTRY_FIELDS: [StateField; 5] = [
    StateField::Query,
    StateField::ImageRef,
    StateField::ProblemText,
    StateField::Intent,
    StateField::FinalArtifact,
];

/// Logs stage entry, the resulting state delta, contained errors and
/// uncaught errors.
#[derive(Debug, Clone)]
pub struct StateLoggingInterceptor {
    entry_truncate: usize,
    delta_truncate: usize,
}

impl Default for StateLoggingInterceptor {
    fn default() -> Self {
        Self::from_config(&InstrumentationConfig::default())
    }
}

impl StateLoggingInterceptor {
    /// Creates an interceptor with explicit truncation thresholds.
    #[must_use]
    pub fn new(entry_truncate: usize, delta_truncate: usize) -> Self {
        Self {
            entry_truncate,
            delta_truncate,
        }
    }

    /// Creates an interceptor from configuration.
    #[must_use]
    pub fn from_config(config: &InstrumentationConfig) -> Self {
        Self::new(config.entry_truncate, config.delta_truncate)
    }

    /// Renders the entry summary: the allow-listed fields present in
    /// `state`, each value cut to the entry threshold.
    #[must_use]
    pub fn entry_summary(&self, state: &PipelineState) -> String {
        let parts: Vec<String> = ENTRY_FIELDS
            .iter()
            .filter_map(|field| {
                let value = state.value_of(*field)?;
                Some(format!(
                    "{field}={:?}",
                    truncate_preview(&value, self.entry_truncate)
                ))
            })
            .collect();
        format!("{{{}}}", parts.join(", "))
    }
}

#[async_trait]
impl Interceptor for StateLoggingInterceptor {
    fn name(&self) -> &str {
        "state_logging"
    }

    fn priority(&self) -> i32 {
        -100
    }

    async fn before(&self, ctx: &StageContext, state: &PipelineState) {
        info!(
            stage = ctx.stage_name(),
            trace_id = ctx.trace_id(),
            input = %self.entry_summary(state),
            "stage input"
        );
    }

    async fn after(
        &self,
        ctx: &StageContext,
        input: &PipelineState,
        merged: &PipelineState,
        output: &StageOutput,
    ) {
        let delta = StateDelta::between(input, merged, self.delta_truncate);
        info!(
            stage = ctx.stage_name(),
            trace_id = ctx.trace_id(),
            updated = %delta,
            "stage output"
        );

        if ctx.kind() == StageKind::Route {
            if let Some(intent) = merged.intent {
                info!(
                    stage = ctx.stage_name(),
                    trace_id = ctx.trace_id(),
                    route = %intent,
                    "route decision"
                );
            }
        }

        if let Some(ref contained) = output.contained_error {
            warn!(
                stage = ctx.stage_name(),
                trace_id = ctx.trace_id(),
                error = %contained,
                "stage contained an error"
            );
        }
    }

    async fn on_error(&self, ctx: &StageContext, _state: &PipelineState, err: &CodeflowError) {
        error!(
            stage = ctx.stage_name(),
            trace_id = ctx.trace_id(),
            kind = err.kind(),
            error = %err,
            "stage failed"
        );
    }
}
