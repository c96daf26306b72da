use crate::format::{JsonFormatter, RecordFormatter};
use crate::record::Level;
use crate::transport::Transport;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Content type sent with every request unless overridden.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Options for [`FluentBitHandler`](crate::handler::FluentBitHandler).
///
/// **Fields**
/// - `url`: Fluent Bit HTTP input to post to. Required.
/// - `content_type`: value of the `Content-Type` header. Empty means
///   [`DEFAULT_CONTENT_TYPE`].
/// - `level`: minimum level that passes the handler.
/// - `enable_async`: run each `handle` call on its own background task.
///   Call `shutdown` before exiting so pending records are written.
/// - `transport`: HTTP client override. `None` means the default
///   reqwest client (requires the `http` feature).
/// - `formatter`: record formatter override. `None` means
///   [`JsonFormatter`].
#[derive(Clone)]
pub struct HandlerOptions {
    pub url: String,
    pub content_type: String,
    pub level: Level,
    pub enable_async: bool,
    pub transport: Option<Arc<dyn Transport>>,
    pub formatter: Option<Arc<dyn RecordFormatter>>,
}

impl HandlerOptions {
    pub fn new(url: impl Into<String>) -> Self {
        HandlerOptions { url: url.into(), ..Default::default() }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_async(mut self, enable_async: bool) -> Self {
        self.enable_async = enable_async;
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn RecordFormatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }
}

impl Default for HandlerOptions {
    /// The default option set. `url` is left empty and `transport` is
    /// `None`; the reqwest client is only built by
    /// [`FluentBitHandler::new`](crate::handler::FluentBitHandler::new).
    fn default() -> Self {
        HandlerOptions {
            url: String::new(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            level: Level::Info,
            enable_async: false,
            transport: None,
            formatter: Some(Arc::new(JsonFormatter::default())),
        }
    }
}

impl fmt::Debug for HandlerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerOptions")
            .field("url", &self.url)
            .field("content_type", &self.content_type)
            .field("level", &self.level)
            .field("enable_async", &self.enable_async)
            .field("transport", &self.transport.as_ref().map(|_| ".."))
            .field("formatter", &self.formatter.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Per-call context handed to formatters and transports.
///
/// Carries the options of the handler that is emitting the record and an
/// optional per-request timeout.
#[derive(Clone, Debug, Default)]
pub struct HandlerContext {
    options: Option<Arc<HandlerOptions>>,
    timeout: Option<Duration>,
}

impl HandlerContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Attach handler options to the context.
    pub fn with_options(mut self, options: Arc<HandlerOptions>) -> Self {
        self.options = Some(options);
        self
    }

    /// Options attached to this context, or the default option set when
    /// none were attached.
    pub fn options(&self) -> Arc<HandlerOptions> {
        match &self.options {
            Some(options) => Arc::clone(options),
            None => Arc::new(HandlerOptions::default()),
        }
    }

    pub fn has_options(&self) -> bool {
        self.options.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_falls_back_to_defaults() {
        let cx = HandlerContext::new();
        assert!(!cx.has_options());
        let options = cx.options();
        assert_eq!(options.content_type, DEFAULT_CONTENT_TYPE);
        assert_eq!(options.level, Level::Info);
        assert!(options.url.is_empty());
        assert!(options.transport.is_none());
        assert!(options.formatter.is_some());
    }

    #[test]
    fn context_returns_attached_options() {
        let options = Arc::new(HandlerOptions::new("http://collector:9880/app").with_level(Level::Warn));
        let cx = HandlerContext::new()
            .with_options(Arc::clone(&options))
            .with_timeout(Duration::from_secs(2));
        assert!(Arc::ptr_eq(&cx.options(), &options));
        assert_eq!(cx.timeout(), Some(Duration::from_secs(2)));
    }
}
