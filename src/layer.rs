use crate::attr::Attr;
use crate::handler::FluentBitHandler;
use crate::options::HandlerContext;
use crate::record::{Caller, Level, LogRecord};
use chrono::Utc;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Events whose target starts with this prefix come from the handler
/// itself and are never forwarded.
const OWN_TARGET: &str = "tracing_fluentbit_sink";

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s and
/// hands them to a [`FluentBitHandler`].
///
/// Records are always delivered on background tokio tasks so that HTTP
/// I/O never runs on application threads; call
/// [`FluentBitHandler::shutdown`] on a clone of the handler before exit.
/// Fields of the enclosing spans (root first) are added before the
/// event's own fields, so the innermost value wins on duplicate keys.
pub struct FluentBitLayer {
    handler: FluentBitHandler,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Handed to the handler for delivery.
    pub dispatched_events: Arc<AtomicU64>,
    /// Dropped because no tokio runtime was running.
    pub dropped_events: Arc<AtomicU64>,
}

impl FluentBitLayer {
    pub fn new(handler: FluentBitHandler) -> Self {
        Self {
            handler,
            total_events: Arc::new(AtomicU64::new(0)),
            dispatched_events: Arc::new(AtomicU64::new(0)),
            dropped_events: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn handler(&self) -> &FluentBitHandler {
        &self.handler
    }
}

/// Span fields stored in the registry's extensions.
struct SpanFields(Vec<Attr>);

impl<S> Layer<S> for FluentBitLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut fields = Vec::new();
        let mut message = None;
        attrs.record(&mut FieldVisitor { fields: &mut fields, message: &mut message });
        if let Some(message) = message {
            fields.push(Attr::new("message", message));
        }
        span.extensions_mut().insert(SpanFields(fields));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut fields = Vec::new();
        let mut message = None;
        values.record(&mut FieldVisitor { fields: &mut fields, message: &mut message });
        if let Some(message) = message {
            fields.push(Attr::new("message", message));
        }

        let mut extensions = span.extensions_mut();
        match extensions.get_mut::<SpanFields>() {
            Some(existing) => existing.0.extend(fields),
            None => extensions.insert(SpanFields(fields)),
        }
    }

    fn on_event(&self, event: &Event, ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);

        let meta = event.metadata();
        let level = Level::from(meta.level());
        if !self.handler.enabled(level) || meta.target().starts_with(OWN_TARGET) {
            return;
        }

        let mut attrs = Vec::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(fields) = span.extensions().get::<SpanFields>() {
                    attrs.extend(fields.0.iter().cloned());
                }
            }
        }

        let mut message = None;
        event.record(&mut FieldVisitor { fields: &mut attrs, message: &mut message });

        let record = LogRecord {
            timestamp: Utc::now(),
            level,
            message: message.unwrap_or_default(),
            caller: Caller {
                target: meta.target().to_string(),
                module_path: meta.module_path().map(|s| s.to_string()),
                file: meta.file().map(|s| s.to_string()),
                line: meta.line(),
            },
            attrs,
        };

        match self.handler.spawn_handle(HandlerContext::new(), record) {
            Ok(()) => {
                self.dispatched_events.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.dropped_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("dropping log record: {}", e);
            }
        }
    }
}

/// Collects event or span fields as [`Attr`]s, pulling out `message`.
pub struct FieldVisitor<'a> {
    pub fields: &'a mut Vec<Attr>,
    pub message: &'a mut Option<String>,
}

impl<'a> FieldVisitor<'a> {
    fn push(&mut self, field: &Field, value: serde_json::Value) {
        self.fields.push(Attr::new(field.name(), value));
    }
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.push(field, serde_json::Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, serde_json::Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, serde_json::Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.push(field, serde_json::Value::String(format!("{:?}", value)));
        }
    }
}
