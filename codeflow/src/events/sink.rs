//! Event sink trait and implementations.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info, Level};

/// Receives pipeline and stage events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event asynchronously.
    ///
    /// # Arguments
    ///
    /// * `event_type` - The type of event (e.g., "stage.started")
    /// * `data` - Optional event data
    async fn emit(&self, event_type: &str, data: Option<Value>);

    /// Emits an event without blocking. Must never panic.
    fn try_emit(&self, event_type: &str, data: Option<Value>);
}

/// Discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event_type: &str, _data: Option<Value>) {}

    fn try_emit(&self, _event_type: &str, _data: Option<Value>) {}
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::DEBUG }
    }
}

impl LoggingEventSink {
    /// Creates a sink logging at the given level.
    ///
    /// Anything other than `DEBUG` is logged at `INFO`.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates an info-level logging sink.
    #[must_use]
    pub fn info() -> Self {
        Self::new(Level::INFO)
    }

    fn log_event(&self, event_type: &str, data: Option<&Value>) {
        if self.level == Level::DEBUG {
            debug!(event_type = %event_type, event_data = ?data, "event");
        } else {
            info!(event_type = %event_type, event_data = ?data, "event");
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event_type: &str, data: Option<Value>) {
        self.log_event(event_type, data.as_ref());
    }

    fn try_emit(&self, event_type: &str, data: Option<Value>) {
        self.log_event(event_type, data.as_ref());
    }
}

/// Records every event in memory. Used by tests to assert on event order
/// and on per-field write transitions.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: RwLock<Vec<(String, Option<Value>)>>,
}

impl CollectingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events in emission order.
    #[must_use]
    pub fn events(&self) -> Vec<(String, Option<Value>)> {
        self.events.read().clone()
    }

    /// Returns the collected event types in emission order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events.read().iter().map(|(t, _)| t.clone()).collect()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Returns events whose type starts with `type_prefix`.
    #[must_use]
    pub fn events_of_type(&self, type_prefix: &str) -> Vec<(String, Option<Value>)> {
        self.events
            .read()
            .iter()
            .filter(|(t, _)| t.starts_with(type_prefix))
            .cloned()
            .collect()
    }

    /// Counts events of exactly `event_type` whose data has `key == value`.
    #[must_use]
    pub fn count_of(&self, event_type: &str, key: &str, value: &str) -> usize {
        self.events
            .read()
            .iter()
            .filter(|(t, data)| {
                t == event_type
                    && data
                        .as_ref()
                        .and_then(|d| d.get(key))
                        .and_then(Value::as_str)
                        == Some(value)
            })
            .count()
    }

    fn record(&self, event_type: &str, data: Option<Value>) {
        self.events.write().push((event_type.to_string(), data));
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event_type: &str, data: Option<Value>) {
        self.record(event_type, data);
    }

    fn try_emit(&self, event_type: &str, data: Option<Value>) {
        self.record(event_type, data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_noop_sink() {
        let sink = NoOpEventSink;
        sink.emit("stage.started", None).await;
        sink.try_emit("stage.started", Some(json!({"stage": "solve"})));
    }

    #[tokio::test]
    async fn test_logging_sink() {
        let sink = LoggingEventSink::info();
        sink.emit("pipeline.started", Some(json!({"trace_id": "t"}))).await;
        sink.try_emit("pipeline.completed", None);
    }

    #[tokio::test]
    async fn test_collecting_sink_records_in_order() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit("stage.started", None).await;
        sink.try_emit("stage.completed", Some(json!({"stage": "solve"})));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.event_types(), vec!["stage.started", "stage.completed"]);
        assert_eq!(sink.events_of_type("stage.").len(), 2);

        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_count_of_matches_payload_key() {
        let sink = CollectingEventSink::new();
        sink.try_emit("state.field_written", Some(json!({"field": "intent"})));
        sink.try_emit("state.field_written", Some(json!({"field": "problem_text"})));
        sink.try_emit("state.field_overwritten", Some(json!({"field": "intent"})));

        assert_eq!(sink.count_of("state.field_written", "field", "intent"), 1);
        assert_eq!(sink.count_of("state.field_written", "field", "final_artifact"), 0);
    }
}
