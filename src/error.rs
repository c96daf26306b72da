use std::error::Error;

/// Errors returned by [`FluentBitHandler`](crate::handler::FluentBitHandler).
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    /// A required option is missing or invalid. Only produced while
    /// building a handler.
    #[error("invalid handler configuration: {0}")]
    Configuration(String),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The endpoint answered with a status code of 400 or above.
    #[error("failed to write message - HTTP status code {status}")]
    Delivery { status: u16 },

    #[error("no tokio runtime available for background dispatch")]
    NoRuntime,

    #[error("background dispatch task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Error reported by a [`RecordFormatter`](crate::format::RecordFormatter).
#[derive(thiserror::Error, Debug)]
#[error("{message}")]
pub struct FormatError {
    message: String,
    #[source]
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl FormatError {
    pub fn new(message: impl Into<String>) -> Self {
        FormatError { message: message.into(), source: None }
    }

    pub fn with_source(message: impl Into<String>, source: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        FormatError { message: message.into(), source: Some(source.into()) }
    }
}

/// Network or client level failure reported by a
/// [`Transport`](crate::transport::Transport).
#[derive(thiserror::Error, Debug)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        TransportError { message: message.into(), source: None }
    }

    pub fn with_source(message: impl Into<String>, source: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        TransportError { message: message.into(), source: Some(source.into()) }
    }
}
