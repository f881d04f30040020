//! test utilities for asserting on emitted spans and events.

use std::sync::{Arc, Mutex};
use tracing::{
    field::{Field, Visit},
    subscriber::set_default,
    Event, Level, Subscriber,
};
use tracing_subscriber::{
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
    Layer,
};

/// a recorded span or event with its captured fields.
#[derive(Debug, Clone)]
pub(crate) struct LogRecord {
    pub(crate) name: String,
    pub(crate) target: String,
    pub(crate) level: Level,
    pub(crate) fields: Vec<(String, String)>,
}

impl LogRecord {
    pub(crate) fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == name)
    }

    pub(crate) fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

struct FieldCollector {
    fields: Vec<(String, String)>,
}

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.fields
            .push((field.name().to_string(), format!("{:?}", value)));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.fields
            .push((field.name().to_string(), value.to_string()));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields
            .push((field.name().to_string(), value.to_string()));
    }
}

/// a tracing layer that keeps spans and events for test assertions.
#[derive(Debug, Clone, Default)]
pub(crate) struct LogCollector {
    spans: Arc<Mutex<Vec<LogRecord>>>,
    events: Arc<Mutex<Vec<LogRecord>>>,
}

impl LogCollector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// finds the first span with the given name.
    pub(crate) fn find_span(&self, name: &str) -> Option<LogRecord> {
        self.spans
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.name == name)
            .cloned()
    }

    /// all events emitted at `level`.
    pub(crate) fn events_at(&self, level: Level) -> Vec<LogRecord> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.level == level)
            .cloned()
            .collect()
    }

    /// installs this collector as the default subscriber for the current thread,
    /// returning a guard that restores the previous subscriber on drop.
    pub(crate) fn as_default(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        set_default(subscriber)
    }
}

impl<S> Layer<S> for LogCollector
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: Context<'_, S>,
    ) {
        let mut collector = FieldCollector { fields: Vec::new() };
        attrs.record(&mut collector);

        let metadata = attrs.metadata();
        self.spans.lock().unwrap().push(LogRecord {
            name: metadata.name().to_string(),
            target: metadata.target().to_string(),
            level: *metadata.level(),
            fields: collector.fields,
        });
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut collector = FieldCollector { fields: Vec::new() };
        event.record(&mut collector);

        let metadata = event.metadata();
        self.events.lock().unwrap().push(LogRecord {
            name: metadata.name().to_string(),
            target: metadata.target().to_string(),
            level: *metadata.level(),
            fields: collector.fields,
        });
    }
}
