use crate::attr::{attrs_to_map, Attr};
use crate::error::FormatError;
use crate::options::HandlerContext;
use crate::record::{Caller, Level};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

/// Turns a consolidated record into the bytes posted to the endpoint.
///
/// Implementations are shared between handlers and background tasks, so
/// they must be safe to call concurrently.
pub trait RecordFormatter: Send + Sync {
    fn format_record(
        &self,
        cx: &HandlerContext,
        time: DateTime<Utc>,
        level: Level,
        caller: &Caller,
        message: &str,
        attrs: &[Attr],
    ) -> Result<Vec<u8>, FormatError>;
}

/// Formats a record as a single flat JSON object.
///
/// Attributes are written first; the reserved keys `time`, `level`, `msg`
/// and, with `include_source`, `source` are written last and win over
/// attributes of the same name.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    pub include_source: bool,
}

impl Default for JsonFormatter {
    fn default() -> Self {
        JsonFormatter { include_source: true }
    }
}

impl RecordFormatter for JsonFormatter {
    fn format_record(
        &self,
        _cx: &HandlerContext,
        time: DateTime<Utc>,
        level: Level,
        caller: &Caller,
        message: &str,
        attrs: &[Attr],
    ) -> Result<Vec<u8>, FormatError> {
        let mut map = attrs_to_map(attrs);
        map.insert(
            "time".to_string(),
            Value::String(time.to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
        map.insert("level".to_string(), Value::String(level.to_string()));
        map.insert("msg".to_string(), Value::String(message.to_string()));
        if self.include_source {
            map.insert(
                "source".to_string(),
                json!({
                    "target": caller.target,
                    "module": caller.module_path,
                    "file": caller.file,
                    "line": caller.line,
                }),
            );
        }

        serde_json::to_vec(&Value::Object(map))
            .map_err(|e| FormatError::with_source("failed to encode record as JSON", e))
    }
}
