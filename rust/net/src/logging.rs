use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::Level;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{Layer, Registry};

/// One captured tracing event.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

impl LogEntry {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Collects events so tests can assert on what the console would show.
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn into_layer<S>(self) -> CaptureLayer<S>
    where
        S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    {
        CaptureLayer {
            capture: self,
            _phantom: PhantomData,
        }
    }
}

pub struct CaptureLayer<S> {
    capture: LogCapture,
    _phantom: PhantomData<S>,
}

impl<S> Layer<S> for CaptureLayer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let entry = LogEntry {
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: visitor.message.unwrap_or_default(),
            fields: visitor.fields,
        };

        self.capture
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields
                .push((field.name().to_string(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let value_str = format!("{:?}", value);
        if field.name() == "message" {
            self.message = Some(value_str);
        } else {
            self.fields.push((field.name().to_string(), value_str));
        }
    }
}

/// Run `f` with every event on this thread captured.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, Vec<LogEntry>) {
    let capture = LogCapture::new();
    let registry = Registry::default().with(capture.clone().into_layer::<Registry>());
    let result = tracing::subscriber::with_default(registry, f);
    (result, capture.entries())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Install the console subscriber in the default text format.
pub fn init_logging() {
    init_logging_with(LogFormat::Text);
}

/// Install the console subscriber.
///
/// The filter comes from `RUST_LOG` and defaults to `info,netchess_net=debug`.
/// Output goes to stderr so stdout stays free for the board. Calling this
/// twice is harmless; the first subscriber wins.
pub fn init_logging_with(format: LogFormat) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,netchess_net=debug"));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if result.is_err() {
        tracing::debug!("logging already initialised");
    }
}
