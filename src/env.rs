//! Environment variable names used by this crate for convenient
//! configuration of handlers from services.
//!
//! These are purely helpers; the handler itself never reads the
//! environment.

use crate::endpoint::parse_dsn;
use crate::error::SinkError;
use crate::options::HandlerOptions;
use crate::record::Level;

/// Fluent Bit endpoint: an `http(s)://` URL or a `fluentbit://` DSN.
pub const FLUENT_BIT_URL_ENV: &str = "FLUENT_BIT_URL";

/// Optional `Content-Type` override.
pub const FLUENT_BIT_CONTENT_TYPE_ENV: &str = "FLUENT_BIT_CONTENT_TYPE";

/// Optional minimum level (`trace`, `debug`, `info`, `warn`, `error`).
pub const FLUENT_BIT_LEVEL_ENV: &str = "FLUENT_BIT_LEVEL";

/// Optional flag enabling background delivery (`true`/`false`/`1`/`0`).
pub const FLUENT_BIT_ASYNC_ENV: &str = "FLUENT_BIT_ASYNC";

/// Build [`HandlerOptions`] from the process environment.
pub fn options_from_env() -> Result<HandlerOptions, SinkError> {
    options_from_lookup(|key| std::env::var(key).ok())
}

/// Build [`HandlerOptions`] from any key lookup. Unset keys keep their
/// defaults; a missing URL is left empty and rejected when the handler
/// is built.
pub fn options_from_lookup<F>(lookup: F) -> Result<HandlerOptions, SinkError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut options = HandlerOptions::default();

    if let Some(url) = lookup(FLUENT_BIT_URL_ENV).filter(|v| !v.trim().is_empty()) {
        options.url = parse_dsn(&url)
            .map_err(|e| SinkError::Configuration(format!("{}: {}", FLUENT_BIT_URL_ENV, e)))?;
    }
    if let Some(content_type) = lookup(FLUENT_BIT_CONTENT_TYPE_ENV) {
        options.content_type = content_type;
    }
    if let Some(level) = lookup(FLUENT_BIT_LEVEL_ENV) {
        options.level = level
            .parse::<Level>()
            .map_err(|e| SinkError::Configuration(format!("{}: {}", FLUENT_BIT_LEVEL_ENV, e)))?;
    }
    if let Some(flag) = lookup(FLUENT_BIT_ASYNC_ENV) {
        options.enable_async = parse_flag(&flag).ok_or_else(|| {
            SinkError::Configuration(format!("{}: expected a boolean, got {:?}", FLUENT_BIT_ASYNC_ENV, flag))
        })?;
    }

    Ok(options)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
