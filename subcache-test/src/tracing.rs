//! Tracing utilities for asserting on logs and spans in tests.
//!
//! Install the collector's dispatch as the thread default and run the test on
//! a current-thread runtime: offloaded tasks then run on the same thread and
//! their events are captured too.

use std::sync::{Arc, Mutex};

use tracing::span::{Attributes, Id};
use tracing::{Dispatch, Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::Registry;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;

/// Captured span information.
#[derive(Debug, Clone)]
pub struct CapturedSpan {
    /// The span name (e.g., "offload_task")
    pub name: String,
    /// Captured field values as strings
    pub fields: Vec<(String, String)>,
}

/// Captured event information.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    /// Event level
    pub level: Level,
    /// The event target (e.g., "subcache::cache")
    pub target: String,
    /// Rendered `message` field
    pub message: String,
    /// Other field values as strings
    pub fields: Vec<(String, String)>,
    /// Name of the innermost span the event was recorded in
    pub span: Option<String>,
}

#[derive(Default)]
struct Captured {
    spans: Vec<CapturedSpan>,
    events: Vec<CapturedEvent>,
}

/// A tracing layer that captures spans and events.
pub struct CaptureLayer {
    captured: Arc<Mutex<Captured>>,
}

/// Visitor to capture field values.
#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Vec<(String, String)>,
}

impl FieldVisitor {
    fn push(&mut self, field: &tracing::field::Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.push(field, format!("{:?}", value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.push(field, value.to_string());
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.push(field, value.to_string());
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.push(field, value.to_string());
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.push(field, value.to_string());
    }
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        attrs.record(&mut visitor);
        self.captured.lock().unwrap().spans.push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: visitor.fields,
        });
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        let span = ctx
            .event_span(event)
            .map(|span| span.metadata().name().to_string());
        self.captured.lock().unwrap().events.push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message: visitor.message.unwrap_or_default(),
            fields: visitor.fields,
            span,
        });
    }
}

/// Collector for captured spans and events.
#[derive(Clone)]
pub struct LogCollector {
    captured: Arc<Mutex<Captured>>,
    dispatch: Dispatch,
}

/// Create a new collector with its associated dispatch.
pub fn create_log_collector() -> LogCollector {
    let captured = Arc::new(Mutex::new(Captured::default()));
    let layer = CaptureLayer {
        captured: captured.clone(),
    };
    let subscriber = Registry::default().with(layer);
    LogCollector {
        captured,
        dispatch: Dispatch::new(subscriber),
    }
}

impl LogCollector {
    /// Get the dispatch, e.g. for `tracing::dispatcher::set_default`.
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Get all captured spans.
    pub fn spans(&self) -> Vec<CapturedSpan> {
        self.captured.lock().unwrap().spans.clone()
    }

    /// Get all captured events.
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.captured.lock().unwrap().events.clone()
    }

    /// Check if a span with the given name was captured.
    pub fn has_span(&self, name: &str) -> bool {
        self.captured
            .lock()
            .unwrap()
            .spans
            .iter()
            .any(|s| s.name == name)
    }

    /// Messages of events recorded at `level`.
    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.captured
            .lock()
            .unwrap()
            .events
            .iter()
            .filter(|e| e.level == level)
            .map(|e| e.message.clone())
            .collect()
    }

    /// Whether any event message contains `needle`.
    pub fn contains_message(&self, needle: &str) -> bool {
        self.captured
            .lock()
            .unwrap()
            .events
            .iter()
            .any(|e| e.message.contains(needle))
    }

    /// Clear everything captured so far.
    pub fn clear(&self) {
        let mut captured = self.captured.lock().unwrap();
        captured.spans.clear();
        captured.events.clear();
    }
}

/// Run a closure with capturing enabled.
///
/// Returns the result of the closure and a collector with what was captured.
pub fn with_log_capture<F, R>(f: F) -> (R, LogCollector)
where
    F: FnOnce() -> R,
{
    let collector = create_log_collector();
    let result = tracing::dispatcher::with_default(collector.dispatch(), f);
    (result, collector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{info_span, warn};

    #[test]
    fn captures_spans_and_events() {
        let ((), collector) = with_log_capture(|| {
            let span = info_span!("offload_task", kind = "revalidate");
            let _enter = span.enter();
            warn!(key = "k", "store write failed");
        });

        assert!(collector.has_span("offload_task"));
        let events = collector.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].message, "store write failed");
        assert_eq!(events[0].span.as_deref(), Some("offload_task"));
        assert_eq!(collector.messages_at(Level::WARN), vec!["store write failed"]);
    }
}
