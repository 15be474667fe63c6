//! Lookup Cache demo server
//!
//! Serves the category collection over HTTP through the cached service.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lookup_cache::api::create_router;
use lookup_cache::config::DEFAULT_LOG_FILTER;
use lookup_cache::{AppState, Config};

/// Main entry point for the Lookup Cache server.
///
/// # Startup Sequence
/// 1. Load configuration from environment variables
/// 2. Initialize tracing subscriber for logging
/// 3. Create the store, settings and cached category service
/// 4. Create Axum router with all endpoints
/// 5. Start HTTP server on configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    // Defaults to "info" level, can be overridden with RUST_LOG env var.
    // Cache events follow the runtime `debug` setting, not the filter.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Lookup Cache Server");
    info!(
        "Configuration loaded: ttl={}s, loading_mode={}, debug={}, port={}",
        config.cache.ttl_seconds, config.cache.loading_mode, config.cache.debug, config.server_port
    );

    let state = AppState::from_config(&config);
    info!(
        "Category service initialized with {} records",
        state.store.len().await
    );

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
