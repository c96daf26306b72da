use std::sync::Arc;
use std::time::Instant;
use tracing::error;

use tracing_fluentbit_sink::init::{init_tracing_with_config, LayerConfig};
use tracing_fluentbit_sink::noop::NoopTransport;
use tracing_fluentbit_sink::{FluentBitHandler, HandlerOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = HandlerOptions::new("http://127.0.0.1:9880/load")
        .with_async(true)
        .with_transport(Arc::new(NoopTransport));
    let handler = FluentBitHandler::new(options)?;
    init_tracing_with_config(handler.clone(), LayerConfig { enable_stdout: false })?;

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, "default load test error");
    }

    let dispatched = start.elapsed();
    handler.shutdown(true).await?;
    let drained = start.elapsed();

    println!("dispatched {} events in {:?} (~{:.0} ev/s), drained after {:?}",
        n,
        dispatched,
        n as f64 / dispatched.as_secs_f64(),
        drained
    );
    Ok(())
}
