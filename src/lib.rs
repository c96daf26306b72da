//! Structured log handler that posts records to a Fluent Bit HTTP input.
//!
//! A [`FluentBitHandler`] gates records by level, consolidates handler and
//! record attributes into one de-duplicated tree, formats it with a
//! [`RecordFormatter`] and posts the bytes through a [`Transport`].
//! Delivery is either awaited by the caller or run on background tokio
//! tasks that are drained by [`FluentBitHandler::shutdown`].

pub mod attr;
pub mod consolidate;
pub mod endpoint;
pub mod env;
pub mod error;
pub mod format;
pub mod handler;
pub mod init;
pub mod layer;
pub mod noop;
pub mod options;
pub mod record;
pub mod transport;

pub use attr::{Attr, AttrValue};
pub use error::{FormatError, SinkError, TransportError};
pub use format::{JsonFormatter, RecordFormatter};
pub use handler::FluentBitHandler;
pub use options::{HandlerContext, HandlerOptions};
pub use record::{Caller, Level, LogRecord};
pub use transport::Transport;
