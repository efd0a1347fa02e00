//! End-to-end runs of the standard pipeline over mock collaborators.

#[cfg(test)]
mod tests {
    use crate::context::{ImageRef, PipelineState, StateField, StateUpdate};
    use crate::core::Intent;
    use crate::errors::{CodeflowError, ModelError};
    use crate::events::CollectingEventSink;
    use crate::pipeline::{PipelineBuilder, PipelineRequest};
    use crate::stages::{generate_prompt, FnStage, Stage};
    use crate::testing::{
        assert_contained_artifact, assert_trace_preserved, assert_written_once, seed_state,
        FailingStage, MockImageResolver, MockSession, MockTextModel, RecordingStage, TestHarness,
    };
    use crate::core::StageOutput;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_generate_request_end_to_end() {
        let harness = TestHarness::new();
        let pipeline = harness.pipeline().unwrap();

        let initial = seed_state("  write a function that reverses a string ");
        let terminal = pipeline.run(initial.clone()).await.unwrap();

        assert_eq!(
            terminal.problem_text.as_deref(),
            Some("write a function that reverses a string")
        );
        assert_eq!(terminal.intent, Some(Intent::Generate));
        assert_eq!(
            terminal.final_artifact.as_deref(),
            Some("def solve():\n    return 42")
        );
        assert_eq!(harness.session.run_count(), 0);
        assert_eq!(
            harness.code_model.prompts(),
            vec![generate_prompt("write a function that reverses a string")]
        );
        assert_trace_preserved(&initial, &terminal);
    }

    #[tokio::test]
    async fn test_debug_request_uses_session() {
        let harness = TestHarness::new();
        let pipeline = harness.pipeline().unwrap();

        let terminal = pipeline
            .run(seed_state("why does this fail? KeyError: 'a'"))
            .await
            .unwrap();

        assert_eq!(terminal.intent, Some(Intent::Debug));
        assert_eq!(
            terminal.final_artifact.as_deref(),
            Some("def fixed():\n    return 1")
        );
        assert_eq!(harness.code_model.call_count(), 0);
        let runs = harness.session.runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(
            runs[0].1,
            vec!["validate_python_syntax", "detect_python_errors", "explain_failure_trace"]
        );
    }

    #[tokio::test]
    async fn test_image_failure_still_completes() {
        let harness = TestHarness::new().with_images(MockImageResolver::failing("not found"));
        let pipeline = harness.pipeline().unwrap();

        let state = seed_state("sort this").with_image(ImageRef::new("/nope.png"));
        let terminal = pipeline.run(state).await.unwrap();

        let problem_text = terminal.problem_text.as_deref().unwrap();
        assert!(problem_text.starts_with("sort this\n\n[VISION ERROR]: Failed to load image: "));
        assert_eq!(terminal.intent, Some(Intent::Debug));
        assert!(terminal.final_artifact.is_some());
        assert!(harness.vision_model.calls().is_empty());
        assert_eq!(
            harness
                .events
                .count_of("stage.completed", "stage", "classify-input"),
            1
        );

        let runs = harness.session.runs();
        assert_eq!(runs.len(), 1);
        assert!(runs[0].0.starts_with("Debug the following Python code.\nsort this"));
        assert!(runs[0].0.contains("[VISION ERROR]"));
    }

    #[tokio::test]
    async fn test_image_failure_marker_reaches_artifact() {
        let harness = TestHarness::new()
            .with_images(MockImageResolver::failing("not found"))
            .with_session(MockSession::echoing());
        let pipeline = harness.pipeline().unwrap();

        let state = seed_state("sort this").with_image(ImageRef::new("/nope.png"));
        let terminal = pipeline.run(state).await.unwrap();

        assert_eq!(terminal.intent, Some(Intent::Debug));
        assert!(terminal
            .final_artifact
            .as_deref()
            .unwrap()
            .contains("[VISION ERROR]: Failed to load image: "));
        assert_eq!(harness.events.events_of_type("pipeline.completed").len(), 1);
    }

    #[tokio::test]
    async fn test_image_analysis_feeds_routing() {
        let harness = TestHarness::new().with_vision_model(
            crate::testing::MockVisionModel::always("Traceback: IndexError: list index out of range"),
        );
        let pipeline = harness.pipeline().unwrap();

        let state = seed_state("").with_image(ImageRef::new("/shot.png"));
        let terminal = pipeline.run(state).await.unwrap();

        assert_eq!(terminal.intent, Some(Intent::Debug));
        assert_eq!(harness.images.resolved(), vec!["/shot.png"]);
    }

    #[tokio::test]
    async fn test_session_failure_is_contained() {
        for query in ["fix this crash", "make it faster"] {
            let harness = TestHarness::new().with_session(MockSession::failing(
                ModelError::transport("llama3.1", "connection refused"),
            ));
            let pipeline = harness.pipeline().unwrap();

            let terminal = pipeline.run(seed_state(query)).await.unwrap();

            assert_contained_artifact(&terminal);
        }
    }

    #[tokio::test]
    async fn test_generate_failure_aborts() {
        let harness = TestHarness::new().with_code_model(MockTextModel::failing(
            ModelError::status("qwen2.5-coder:1.5b", 500, "oom"),
        ));
        let pipeline = harness.pipeline().unwrap();

        let err = pipeline.run(seed_state("hello world")).await.unwrap_err();

        assert!(matches!(err, CodeflowError::Model(ModelError::Status { status: 500, .. })));
        assert_eq!(harness.events.events_of_type("pipeline.failed").len(), 1);
        assert_eq!(harness.events.events_of_type("pipeline.completed").len(), 0);
    }

    #[tokio::test]
    async fn test_each_derived_field_written_once() {
        let cases = [
            (seed_state("write a binary search"), Intent::Generate),
            (seed_state("fix this crash"), Intent::Debug),
            (seed_state("refactor this"), Intent::Optimize),
            (
                seed_state("what does this do").with_image(ImageRef::new("/shot.png")),
                Intent::Generate,
            ),
        ];

        for (state, expected) in cases {
            let harness = TestHarness::new();
            let pipeline = harness.pipeline().unwrap();

            let terminal = pipeline.run(state).await.unwrap();

            assert_eq!(terminal.intent, Some(expected));
            assert_written_once(&harness.events, &StateField::DERIVED);
            assert_eq!(harness.events.events_of_type("state.field_overwritten").len(), 0);
        }
    }

    #[tokio::test]
    async fn test_trace_id_survives_a_clearing_stage() {
        let rogue = FnStage::new("rogue", |_: &PipelineState| {
            Ok(StageOutput::ok(StateUpdate::new().with_trace_id("")))
        });
        let after = Arc::new(RecordingStage::new("after", StateUpdate::new()));
        let pipeline = PipelineBuilder::new("trace")
            .stage(Arc::new(rogue))
            .unwrap()
            .stage(after.clone())
            .unwrap()
            .build()
            .unwrap();

        let initial = seed_state("q");
        let terminal = pipeline.run(initial.clone()).await.unwrap();

        assert_trace_preserved(&initial, &terminal);
        assert_eq!(after.seen()[0].trace_id, initial.trace_id);
    }

    #[tokio::test]
    async fn test_uncaught_error_skips_later_stages() {
        let first = Arc::new(RecordingStage::new(
            "first",
            StateUpdate::new().with_problem_text("p"),
        ));
        let failing = Arc::new(FailingStage::new("second", "bad"));
        let third = Arc::new(RecordingStage::new("third", StateUpdate::new()));
        let sink = Arc::new(CollectingEventSink::new());
        let pipeline = PipelineBuilder::new("abort")
            .stage(first.clone())
            .unwrap()
            .stage(failing.clone())
            .unwrap()
            .stage(third.clone())
            .unwrap()
            .event_sink(sink.clone())
            .build()
            .unwrap();

        let err = pipeline.run(seed_state("q")).await.unwrap_err();

        assert_eq!(err.kind(), "ValidationError");
        assert_eq!(first.call_count(), 1);
        assert_eq!(failing.call_count(), 1);
        assert_eq!(third.call_count(), 0);
        assert_eq!(sink.count_of("stage.failed", "stage", "second"), 1);
    }

    #[tokio::test]
    async fn test_stages_see_merged_state() {
        let writer = Arc::new(RecordingStage::new(
            "writer",
            StateUpdate::new().with_intent(Intent::Optimize),
        ));
        let reader = Arc::new(RecordingStage::new("reader", StateUpdate::new()));
        let pipeline = PipelineBuilder::new("merge")
            .stage(writer.clone())
            .unwrap()
            .stage(reader.clone())
            .unwrap()
            .build()
            .unwrap();

        pipeline.run(seed_state("q")).await.unwrap();

        assert_eq!(writer.seen()[0].intent, None);
        assert_eq!(reader.seen()[0].intent, Some(Intent::Optimize));
        assert_eq!(reader.name(), "reader");
    }

    #[tokio::test]
    async fn test_empty_trace_id_is_rejected() {
        let harness = TestHarness::new();
        let pipeline = harness.pipeline().unwrap();

        let err = pipeline.run(PipelineState::new("q", "")).await.unwrap_err();

        assert_eq!(err.kind(), "ValidationError");
        assert!(harness.events.is_empty());
    }

    #[tokio::test]
    async fn test_handle_round_trip() {
        let harness = TestHarness::new();
        let pipeline = harness.pipeline().unwrap();

        let reply = pipeline
            .handle(PipelineRequest::new("merge two sorted lists").with_trace_id("req-7"))
            .await
            .unwrap();

        assert_eq!(reply.intent, Some(Intent::Generate));
        assert_eq!(reply.trace_id, "req-7");
        assert_eq!(reply.final_artifact, "def solve():\n    return 42");
    }
}
