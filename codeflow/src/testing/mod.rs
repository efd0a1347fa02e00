//! Test doubles and fixtures for codeflow pipelines.
//!
//! Exposed publicly so integration tests and downstream crates can drive a
//! full pipeline without a model server.

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_contained_artifact, assert_trace_preserved, assert_written_once};
pub use fixtures::{seed_state, TestHarness};
pub use mocks::{
    FailingStage, MockChatModel, MockImageResolver, MockSession, MockTextModel, MockVisionModel,
    RecordingStage,
};
