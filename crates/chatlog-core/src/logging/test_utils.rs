//! In-memory capture of `tracing` events for tests.
//!
//! The write path's only observable effect on a muted failure is a
//! diagnostic event, so tests install [`capture_logs`] and inspect what was
//! emitted, including structured fields such as `error` and `record`.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::field::{Field, Visit};
use tracing::level_filters::LevelFilter;
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

/// One recorded event.
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    /// Event level.
    pub level: Level,
    /// Emitting module path.
    pub target: String,
    /// The event's message text.
    pub message: String,
    /// Structured fields in emission order, rendered as text.
    pub fields: Vec<(String, String)>,
}

impl CapturedEvent {
    /// Text of the named field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find_map(|(key, value)| (key == name).then_some(value.as_str()))
    }
}

/// Shared handle to the events seen by a capture layer.
#[derive(Clone, Default)]
pub struct CapturedLogs {
    inner: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CapturedLogs {
    // A panicking test must not hide the events of the next one.
    fn guard(&self) -> MutexGuard<'_, Vec<CapturedEvent>> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn matching(&self, level: Level, needle: &str) -> Vec<CapturedEvent> {
        self.guard()
            .iter()
            .filter(|e| e.level == level && e.message.contains(needle))
            .cloned()
            .collect()
    }

    /// Snapshot of everything captured so far.
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.guard().clone()
    }

    /// Whether an event at `level` has a message containing `needle`.
    pub fn has_event(&self, level: Level, needle: &str) -> bool {
        !self.matching(level, needle).is_empty()
    }

    /// First event at `level` whose message contains `needle`.
    pub fn find_event(&self, level: Level, needle: &str) -> Option<CapturedEvent> {
        self.matching(level, needle).into_iter().next()
    }

    /// Number of events at `level`.
    pub fn count_at_level(&self, level: Level) -> usize {
        self.guard().iter().filter(|e| e.level == level).count()
    }

    /// Forget everything captured so far.
    pub fn clear(&self) {
        self.guard().clear();
    }
}

#[derive(Default)]
struct Recorder {
    message: String,
    fields: Vec<(String, String)>,
}

impl Recorder {
    fn put(&mut self, field: &Field, text: String) {
        if field.name() == "message" {
            self.message = text;
        } else {
            self.fields.push((field.name().to_string(), text));
        }
    }
}

impl Visit for Recorder {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        // `%value` fields arrive here wrapped so that Debug prints Display.
        self.put(field, format!("{value:?}"));
    }
}

struct CaptureLayer(CapturedLogs);

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut recorder = Recorder::default();
        event.record(&mut recorder);
        let meta = event.metadata();
        self.0.guard().push(CapturedEvent {
            level: *meta.level(),
            target: meta.target().to_string(),
            message: recorder.message,
            fields: recorder.fields,
        });
    }
}

/// Route every event on the current thread into a fresh [`CapturedLogs`].
///
/// Capture lasts while the returned guard is alive. It is thread-scoped, so
/// async tests should use the default current-thread runtime.
pub fn capture_logs() -> (CapturedLogs, DefaultGuard) {
    let logs = CapturedLogs::default();
    let guard = tracing_subscriber::registry()
        .with(CaptureLayer(logs.clone()))
        .with(LevelFilter::TRACE)
        .set_default();
    (logs, guard)
}
