//! Memo Pool server
//!
//! Serves the operator API over a shared cache and upstream connection pool.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::runtime::Handle;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memo_pool::api::create_router;
use memo_pool::{AppState, Config, Reaper};

/// Main entry point.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Create cache store, upstream pool and memoized reads
/// 4. Start the TTL reaper
/// 5. Serve until SIGINT/SIGTERM
/// 6. Stop the reaper and close the pool
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memo_pool=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Memo Pool server");

    let config = Config::from_env();
    if let Some(error_msg) = config.validate() {
        anyhow::bail!("Invalid configuration: {}", error_msg);
    }
    info!(
        "Configuration loaded: max_entries={}, default_ttl={}s, port={}, cleanup_interval={}s, upstream={}",
        config.max_entries,
        config.default_ttl,
        config.server_port,
        config.cleanup_interval,
        config.upstream_addr
    );

    let state = AppState::from_config(&config);
    let reaper = Reaper::start(
        &Handle::current(),
        state.cache.clone(),
        config.cleanup_interval(),
    );
    let pool = state.pool.clone();

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    reaper.stop();
    let closed = pool.close();
    info!(closed, "Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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
