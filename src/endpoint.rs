/// Port the Fluent Bit `http` input listens on unless configured otherwise.
pub const DEFAULT_FLUENT_BIT_PORT: u16 = 9880;

/// Error type returned when parsing a DSN.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum DsnError {
    #[error("unknown or unsupported DSN scheme")]
    UnknownScheme,

    #[error("DSN has no host")]
    MissingHost,
}

/// Turn a DSN into the HTTP URL records are posted to.
///
/// Examples:
/// - "http://127.0.0.1:9880/app.logs" (used as-is)
/// - "fluentbit://collector/app.logs" -> "http://collector:9880/app.logs"
/// - "fluentbits://collector:443/app" -> "https://collector:443/app"
///
/// The path of a `fluentbit://` DSN is the Fluent Bit tag; it is
/// percent-encoded segment by segment.
pub fn parse_dsn(dsn: &str) -> Result<String, DsnError> {
    let dsn = dsn.trim();
    let lower = dsn.to_ascii_lowercase();

    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Ok(dsn.to_string());
    }

    let (scheme, rest) = if lower.starts_with("fluentbit://") {
        ("http", &dsn["fluentbit://".len()..])
    } else if lower.starts_with("fluentbits://") {
        ("https", &dsn["fluentbits://".len()..])
    } else {
        return Err(DsnError::UnknownScheme);
    };

    let (authority, tag) = match rest.split_once('/') {
        Some((authority, tag)) => (authority, tag),
        None => (rest, ""),
    };
    if authority.is_empty() || authority.starts_with(':') {
        return Err(DsnError::MissingHost);
    }

    let authority = if has_port(authority) {
        authority.to_string()
    } else {
        format!("{}:{}", authority, DEFAULT_FLUENT_BIT_PORT)
    };

    let tag = tag
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");

    Ok(format!("{}://{}/{}", scheme, authority, tag))
}

fn has_port(authority: &str) -> bool {
    // `[::1]:9880` keeps its colons inside the brackets.
    let host_end = authority.rfind(']').map(|i| i + 1).unwrap_or(0);
    authority[host_end..].contains(':')
}
