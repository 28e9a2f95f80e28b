use std::net::SocketAddr;
use std::process::ExitCode;

use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use capi_relay::{AppState, CapiClient, Config, build_router, metrics, utils};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!(
        "Starting Conversions API relay v{}",
        env!("CARGO_PKG_VERSION")
    );

    match run().await {
        Ok(()) => ExitCode::from(exitcode::OK as u8),
        Err(exit_code) => ExitCode::from(exit_code as u8),
    }
}

/// Run the application, returning an exit code on error.
async fn run() -> Result<(), exitcode::ExitCode> {
    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Configuration error: {e}");
        exitcode::CONFIG
    })?;
    info!(
        host = %config.host,
        port = %config.port,
        graph_api = %config.graph_api_base_url,
        api_version = %config.graph_api_version,
        "Configuration loaded"
    );

    // Missing credentials are a per-request 500, not a startup failure:
    // health checks keep working and the diagnostic reaches the caller.
    let missing = config.missing_credentials();
    if !missing.is_empty() {
        warn!(
            missing = missing.join(", "),
            "Upstream credentials not configured; tracking requests will fail"
        );
    }

    // Start Prometheus metrics exporter (optional)
    if let Some(metrics_addr) = config.metrics_addr() {
        metrics::try_init_metrics(metrics_addr);
    }

    // Build upstream client, application state, and router
    let capi = CapiClient::new(&config).map_err(|e| {
        error!("Failed to build upstream client: {e}");
        exitcode::SOFTWARE
    })?;
    let state = AppState::new(capi, config.clone());
    let app = build_router(state).map_err(|e| {
        error!("Failed to build router: {e}");
        exitcode::CONFIG
    })?;

    // Start server
    let addr: SocketAddr = config.server_addr().parse().map_err(|e| {
        error!("Invalid server address: {e}");
        exitcode::CONFIG
    })?;
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to {addr}: {e}");
        exitcode::UNAVAILABLE
    })?;

    info!("Server listening on http://{addr}");
    info!("API endpoints:");
    info!("  POST /events  - Relay a tracking event");
    info!("  GET  /health  - Health check");
    info!("  GET  /ready   - Readiness check");

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(utils::shutdown_signal())
        .await
        .map_err(|e| {
            error!("Server error: {e}");
            exitcode::SOFTWARE
        })?;

    info!("Server shutdown complete");
    Ok(())
}
