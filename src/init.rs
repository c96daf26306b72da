use crate::handler::FluentBitHandler;
use crate::layer::FluentBitLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the installed subscriber.
///
/// **Fields**
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   added next to [`FluentBitLayer`] so events are also printed to the
///   console.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self { enable_stdout: true }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("failed to install global subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Install a global `tracing` subscriber that forwards events to
/// `handler`.
///
/// **Effects**
///
/// A [`Registry`] combined with [`FluentBitLayer`] becomes the global
/// default subscriber. Keep a clone of `handler` around and call
/// [`FluentBitHandler::shutdown`] on it before the process exits so
/// in-flight records are delivered.
pub fn init_tracing_with_config(handler: FluentBitHandler, config: LayerConfig) -> Result<(), InitError> {
    let layer = FluentBitLayer::new(handler);

    // Both branches build a different subscriber type.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

/// Equivalent to calling [`init_tracing_with_config`] with
/// [`LayerConfig::default`].
pub fn init_tracing(handler: FluentBitHandler) -> Result<(), InitError> {
    init_tracing_with_config(handler, LayerConfig::default())
}
