//! Interceptor chain for ordered middleware execution.

use crate::context::{PipelineState, StageContext};
use crate::core::StageOutput;
use crate::errors::CodeflowError;
use async_trait::async_trait;
use std::sync::Arc;

/// Observes stage execution.
///
/// Interceptors see the state before and after a stage and any error it
/// returns. They cannot alter the update or swallow the error.
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Returns the interceptor's name.
    fn name(&self) -> &str;

    /// Returns the interceptor's priority (lower = earlier execution).
    fn priority(&self) -> i32 {
        0
    }

    /// Called before stage execution.
    async fn before(&self, _ctx: &StageContext, _state: &PipelineState) {}

    /// Called after a stage returned and its update was merged.
    async fn after(
        &self,
        _ctx: &StageContext,
        _input: &PipelineState,
        _merged: &PipelineState,
        _output: &StageOutput,
    ) {
    }

    /// Called when a stage returned an error.
    async fn on_error(&self, _ctx: &StageContext, _state: &PipelineState, _error: &CodeflowError) {}
}

/// An ordered set of interceptors.
#[derive(Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("interceptors", &self.names())
            .finish()
    }
}

impl InterceptorChain {
    /// Creates a new empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an interceptor, keeping the chain sorted by priority.
    ///
    /// Interceptors with equal priority keep insertion order.
    pub fn add(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
        self.interceptors.sort_by_key(|i| i.priority());
    }

    /// Adds an interceptor and returns the chain.
    #[must_use]
    pub fn with(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.add(interceptor);
        self
    }

    /// Runs every `before` hook in priority order.
    pub async fn run_before(&self, ctx: &StageContext, state: &PipelineState) {
        for interceptor in &self.interceptors {
            interceptor.before(ctx, state).await;
        }
    }

    /// Runs every `after` hook in reverse priority order.
    pub async fn run_after(
        &self,
        ctx: &StageContext,
        input: &PipelineState,
        merged: &PipelineState,
        output: &StageOutput,
    ) {
        for interceptor in self.interceptors.iter().rev() {
            interceptor.after(ctx, input, merged, output).await;
        }
    }

    /// Runs every `on_error` hook in priority order.
    pub async fn handle_error(
        &self,
        ctx: &StageContext,
        state: &PipelineState,
        error: &CodeflowError,
    ) {
        for interceptor in &self.interceptors {
            interceptor.on_error(ctx, state, error).await;
        }
    }

    /// Returns interceptor names in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.interceptors.iter().map(|i| i.name().to_string()).collect()
    }

    /// Returns the number of interceptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Returns true if the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}
