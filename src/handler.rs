use crate::attr::Attr;
use crate::consolidate::consolidate_attrs;
use crate::error::SinkError;
use crate::format::{JsonFormatter, RecordFormatter};
use crate::options::{HandlerContext, HandlerOptions, DEFAULT_CONTENT_TYPE};
use crate::record::{Level, LogRecord};
use crate::transport::Transport;
use futures_util::FutureExt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Finished tasks are pruned from the in-flight list once it grows past
/// this many entries.
const COMPACT_THRESHOLD: usize = 256;

/// Batches awaited by `shutdown`: the tasks present when it starts, then
/// those started while they drained.
const DRAIN_PASSES: usize = 2;

/// Background deliveries started by one handler and not yet drained.
#[derive(Debug, Default)]
struct InFlight {
    tasks: Vec<JoinHandle<()>>,
    first_failure: Option<SinkError>,
    failures: usize,
}

impl InFlight {
    fn record_failure(&mut self, err: SinkError) {
        self.failures += 1;
        if self.first_failure.is_none() {
            self.first_failure = Some(err);
        }
    }

    /// Drop finished tasks, keeping the failure of any that panicked.
    fn compact(&mut self) {
        for mut task in std::mem::take(&mut self.tasks) {
            if !task.is_finished() {
                self.tasks.push(task);
                continue;
            }
            match (&mut task).now_or_never() {
                Some(Ok(())) => {}
                Some(Err(err)) => self.record_failure(SinkError::Join(err)),
                None => self.tasks.push(task),
            }
        }
    }
}

/// Log handler that posts records to a Fluent Bit HTTP input.
///
/// A handler is never mutated by [`with_attrs`](Self::with_attrs) or
/// [`with_group`](Self::with_group); both return a new handler. Clones
/// share the list of in-flight background deliveries, derived handlers
/// start with an empty one.
#[derive(Debug, Clone)]
pub struct FluentBitHandler {
    attrs: Arc<Vec<Attr>>,
    active_group: Option<String>,
    groups: Arc<Vec<String>>,
    options: Arc<HandlerOptions>,
    in_flight: Arc<Mutex<InFlight>>,
}

impl FluentBitHandler {
    /// Create a handler, filling in defaults for every option except `url`.
    ///
    /// **Returns**
    /// - `Err(SinkError::Configuration)` if `url` is empty, or if no
    ///   transport was given and the `http` feature is disabled.
    ///
    /// No I/O happens here.
    pub fn new(mut options: HandlerOptions) -> Result<Self, SinkError> {
        if options.url.is_empty() {
            return Err(SinkError::Configuration(
                "URL is required and cannot be empty".to_string(),
            ));
        }

        if options.content_type.is_empty() {
            options.content_type = DEFAULT_CONTENT_TYPE.to_string();
        }
        if options.transport.is_none() {
            options.transport = crate::transport::default_transport();
        }
        if options.transport.is_none() {
            return Err(SinkError::Configuration(
                "no transport given and the `http` feature is disabled".to_string(),
            ));
        }
        if options.formatter.is_none() {
            options.formatter = Some(Arc::new(JsonFormatter::default()));
        }

        debug!(url = %options.url, level = %options.level, enable_async = options.enable_async, "fluent bit handler created");

        Ok(FluentBitHandler {
            attrs: Arc::new(Vec::new()),
            active_group: None,
            groups: Arc::new(Vec::new()),
            options: Arc::new(options),
            in_flight: Arc::default(),
        })
    }

    pub fn options(&self) -> &HandlerOptions {
        &self.options
    }

    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    pub fn active_group(&self) -> Option<&str> {
        self.active_group.as_deref()
    }

    /// Every group opened on this handler's lineage, oldest first.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Number of background deliveries recorded and not yet drained.
    pub fn pending(&self) -> usize {
        self.lock_in_flight().tasks.len()
    }

    pub fn enabled(&self, level: Level) -> bool {
        level >= self.options.level
    }

    /// Derive a handler carrying `attrs` in addition to this one's.
    ///
    /// With a group open, `attrs` are nested under that group.
    pub fn with_attrs(&self, attrs: Vec<Attr>) -> Self {
        let mut merged = Vec::with_capacity(self.attrs.len() + attrs.len());
        merged.extend(self.attrs.iter().cloned());
        match &self.active_group {
            Some(group) => merged.push(Attr::group(group.clone(), attrs)),
            None => merged.extend(attrs),
        }
        self.derive(Arc::new(merged), self.active_group.clone(), Arc::clone(&self.groups))
    }

    /// Derive a handler with `name` as its active group. An empty name
    /// returns an equivalent handler.
    pub fn with_group(&self, name: &str) -> Self {
        if name.is_empty() {
            return self.clone();
        }
        let mut groups = Vec::with_capacity(self.groups.len() + 1);
        groups.extend(self.groups.iter().cloned());
        groups.push(name.to_string());
        self.derive(Arc::clone(&self.attrs), Some(name.to_string()), Arc::new(groups))
    }

    fn derive(&self, attrs: Arc<Vec<Attr>>, active_group: Option<String>, groups: Arc<Vec<String>>) -> Self {
        FluentBitHandler {
            attrs,
            active_group,
            groups,
            options: Arc::clone(&self.options),
            in_flight: Arc::default(),
        }
    }

    /// Deliver `record` to the endpoint.
    ///
    /// Records below the configured level are ignored. In synchronous mode
    /// the delivery is awaited and its error returned. With `enable_async`
    /// the delivery runs on its own tokio task and `Ok(())` is returned at
    /// once: failures are not reported here, only by
    /// [`shutdown`](Self::shutdown).
    pub async fn handle(&self, cx: HandlerContext, record: LogRecord) -> Result<(), SinkError> {
        if !self.enabled(record.level) {
            return Ok(());
        }
        if self.options.enable_async {
            return self.spawn_handle(cx, record);
        }

        let cx = cx.with_options(Arc::clone(&self.options));
        self.emit(&cx, &record).await
    }

    /// Start delivering `record` on a background task of the current tokio
    /// runtime, regardless of `enable_async`.
    ///
    /// **Returns**
    /// - `Err(SinkError::NoRuntime)` when called outside a tokio runtime.
    pub fn spawn_handle(&self, cx: HandlerContext, record: LogRecord) -> Result<(), SinkError> {
        if !self.enabled(record.level) {
            return Ok(());
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| SinkError::NoRuntime)?;

        let cx = cx.with_options(Arc::clone(&self.options));
        let this = self.clone();
        let task = runtime.spawn(async move {
            if let Err(err) = this.emit(&cx, &record).await {
                debug!(error = %err, "background delivery failed");
                this.lock_in_flight().record_failure(err);
            }
        });

        let mut in_flight = self.lock_in_flight();
        if in_flight.tasks.len() >= COMPACT_THRESHOLD {
            in_flight.compact();
        }
        in_flight.tasks.push(task);
        Ok(())
    }

    /// Wait for every background delivery started before this call.
    ///
    /// Tasks are awaited in the order they were started. Tasks started
    /// while the first batch drains get one more pass; anything started
    /// after that is left running, so a producer that keeps logging cannot
    /// hold shutdown open. With `continue_on_error = false` the first
    /// failure is returned once draining is done; with `true` failures are
    /// logged and `Ok(())` is returned.
    pub async fn shutdown(&self, continue_on_error: bool) -> Result<(), SinkError> {
        for _ in 0..DRAIN_PASSES {
            let pending = std::mem::take(&mut self.lock_in_flight().tasks);
            if pending.is_empty() {
                break;
            }
            debug!(tasks = pending.len(), "draining background deliveries");
            for task in pending {
                if let Err(err) = task.await {
                    self.lock_in_flight().record_failure(SinkError::Join(err));
                }
            }
        }

        let (first_failure, failures) = {
            let mut in_flight = self.lock_in_flight();
            (in_flight.first_failure.take(), std::mem::take(&mut in_flight.failures))
        };
        match first_failure {
            Some(err) if !continue_on_error => Err(err),
            Some(err) => {
                warn!(failures, first_error = %err, "background deliveries failed before shutdown");
                Ok(())
            }
            None => Ok(()),
        }
    }

    async fn emit(&self, cx: &HandlerContext, record: &LogRecord) -> Result<(), SinkError> {
        let attrs = consolidate_attrs(&self.attrs, self.active_group.as_deref(), &record.attrs);

        let body = match &self.options.formatter {
            Some(formatter) => formatter.format_record(
                cx,
                record.timestamp,
                record.level,
                &record.caller,
                &record.message,
                &attrs,
            )?,
            None => JsonFormatter::default().format_record(
                cx,
                record.timestamp,
                record.level,
                &record.caller,
                &record.message,
                &attrs,
            )?,
        };

        let transport = self
            .options
            .transport
            .as_ref()
            .ok_or_else(|| SinkError::Configuration("no transport configured".to_string()))?;
        let status = transport
            .post(cx, &self.options.url, &self.options.content_type, body)
            .await?;
        if status >= 400 {
            return Err(SinkError::Delivery { status });
        }
        Ok(())
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, InFlight> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
