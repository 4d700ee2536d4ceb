use bulk_dispatcher::{
    Config, Dispatcher, TuningParams, api::Server, backend::MemoryBackend,
};
use std::sync::Arc;
use tracing::info;

/// The main entry point for the bulk dispatcher service.
///
/// Initializes logging, loads the configuration, starts the dispatcher on
/// an in-memory backend, and serves the JSON-RPC API until Ctrl-C. Then it
/// shuts the dispatcher down and waits for in-flight batches to drain.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/default.toml".to_string());
    let config = Config::load(&path)?;
    info!("Bulk dispatcher starting with config: {:?}", config);

    // Invalid tuning (e.g. more pending batches than connections) is fatal here
    let params = TuningParams::from_config(&config)?;

    let backend = Arc::new(MemoryBackend::new());
    let (handle, dispatcher) = Dispatcher::spawn(params, backend)?;

    let server = Server::new(config.api.clone(), handle.clone());
    server
        .start(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Ctrl-C received");
        })
        .await?;

    info!(
        queued = handle.queued(),
        in_flight = handle.batches_in_flight(),
        "Stopping dispatcher"
    );
    handle.shutdown();
    let report = dispatcher.await?;
    info!(
        batches = report.batches,
        transactions = report.transactions,
        abandoned = report.abandoned,
        drained = report.drained,
        "Shutdown complete"
    );

    Ok(())
}
