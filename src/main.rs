//! Periodic Timer - HTTP controller entry point

use tokio::net::TcpListener;
use tracing::info;

use periodic_timer::{
    api::create_router,
    config::Config,
    state::AppState,
    tasks::status_monitor_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("periodic_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting periodic-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, interval={}ms",
          config.host, config.port, config.interval_ms);

    // Create application state; rejects a zero interval
    let state = AppState::new(config.port, config.host.clone(), config.interval())?;

    // Log timer transitions in the background
    let monitor = tokio::spawn(status_monitor_task(state.timer.subscribe()));

    if config.start_resumed {
        state.timer.resume()?;
    }

    // Create HTTP router with all endpoints
    let app = create_router(state.clone());

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /resume  - Resume the timer");
    info!("  POST /suspend - Suspend the timer");
    info!("  GET  /status  - Check timer state and count");
    info!("  GET  /health  - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        result = shutdown_signal() => {
            match result {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => tracing::error!("Failed to install signal handler: {}", e),
            }
        }
    }

    state.timer.shutdown();
    drop(state);
    monitor.abort();

    info!("Server shutdown complete");
    Ok(())
}
