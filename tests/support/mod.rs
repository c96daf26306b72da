#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_fluentbit_sink::{
    Attr, Caller, FormatError, HandlerContext, JsonFormatter, Level, RecordFormatter, Transport,
    TransportError,
};

/// Transport stub answering with a fixed status and remembering what it
/// was asked to post.
pub struct StubTransport {
    status: u16,
    delay: Option<Duration>,
    fail: bool,
    panic_first: bool,
    pub calls: AtomicUsize,
    pub completed: AtomicUsize,
    pub requests: Mutex<Vec<(String, String, Vec<u8>)>>,
}

impl StubTransport {
    pub fn with_status(status: u16) -> Arc<Self> {
        Arc::new(Self::build(status, None, false))
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self::build(200, Some(delay), false))
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self::build(0, None, true))
    }

    /// Panics on the first post, answers 200 afterwards.
    pub fn panicking_once() -> Arc<Self> {
        Arc::new(StubTransport { panic_first: true, ..Self::build(200, None, false) })
    }

    fn build(status: u16, delay: Option<Duration>, fail: bool) -> Self {
        StubTransport {
            status,
            delay,
            fail,
            panic_first: false,
            calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Bodies posted so far, parsed as JSON.
    pub fn bodies(&self) -> Vec<serde_json::Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, _, body)| serde_json::from_slice(body).expect("json body"))
            .collect()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn post(
        &self,
        _cx: &HandlerContext,
        url: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<u16, TransportError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_first && call == 0 {
            panic!("transport blew up");
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), content_type.to_string(), body));
        self.completed.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(TransportError::new("connection refused"));
        }
        Ok(self.status)
    }
}

/// Formatter stub that delegates to [`JsonFormatter`] unless told to fail,
/// and records the URL found in the context it was given.
pub struct StubFormatter {
    fail: bool,
    pub calls: AtomicUsize,
    pub seen_urls: Mutex<Vec<String>>,
}

impl StubFormatter {
    pub fn ok() -> Arc<Self> {
        Arc::new(StubFormatter { fail: false, calls: AtomicUsize::new(0), seen_urls: Mutex::new(Vec::new()) })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(StubFormatter { fail: true, calls: AtomicUsize::new(0), seen_urls: Mutex::new(Vec::new()) })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RecordFormatter for StubFormatter {
    fn format_record(
        &self,
        cx: &HandlerContext,
        time: DateTime<Utc>,
        level: Level,
        caller: &Caller,
        message: &str,
        attrs: &[Attr],
    ) -> Result<Vec<u8>, FormatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_urls.lock().unwrap().push(cx.options().url.clone());
        if self.fail {
            return Err(FormatError::new("boom"));
        }
        JsonFormatter { include_source: false }.format_record(cx, time, level, caller, message, attrs)
    }
}
