use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};
use tracing_fluentbit_sink::{
    endpoint::parse_dsn, init::init_tracing, FluentBitHandler, HandlerContext, HandlerOptions, Transport, TransportError,
};

/// Example of plugging in a completely custom transport by implementing
/// the `Transport` trait directly. Imagine this wraps a client with its
/// own retry policy or a message queue in front of Fluent Bit.
struct StdoutTransport;

#[async_trait]
impl Transport for StdoutTransport {
    async fn post(
        &self,
        _cx: &HandlerContext,
        url: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<u16, TransportError> {
        println!("[{} {}] {}", url, content_type, String::from_utf8_lossy(&body));
        Ok(200)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = parse_dsn("fluentbit://127.0.0.1/custom")?;
    let options = HandlerOptions::new(url)
        .with_async(true)
        .with_transport(Arc::new(StdoutTransport));
    let handler = FluentBitHandler::new(options)?;

    init_tracing(handler.clone())?;

    info!("custom transport example started");
    error!(db = "orders", "simulated error sent via custom transport");

    handler.shutdown(false).await?;
    Ok(())
}
