//! Web Cache Proxy - A multithreaded HTTP forwarding proxy
//!
//! Usage: `web_cache_proxy [port]`

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use web_cache_proxy::api::{create_router, AppState};
use web_cache_proxy::{CacheStore, Config, ProxyServer};

/// Main entry point for the caching proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables and the command line
/// 3. Create the shared cache store
/// 4. Start the proxy accept loop on its own thread
/// 5. Serve the admin API until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "web_cache_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting web cache proxy");

    let config = Config::from_env()
        .with_args(std::env::args().skip(1))
        .map_err(|e| anyhow!("{}\nusage: web_cache_proxy [port]", e))?;
    config.validate().map_err(|e| anyhow!(e))?;
    info!(
        "Configuration loaded: capacity={}B, max_object={}B, proxy_port={}, admin_port={}",
        config.cache_capacity, config.max_object_size, config.proxy_port, config.admin_port
    );

    let cache = Arc::new(CacheStore::from_config(&config));

    let proxy = ProxyServer::from_config(&config, Arc::clone(&cache))
        .with_context(|| format!("failed to bind proxy port {}", config.proxy_port))?;
    info!("Proxy listening on {}", proxy.local_addr()?);
    proxy.spawn().context("failed to start proxy listener")?;

    let app = create_router(AppState::new(cache));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.admin_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind admin port {}", config.admin_port))?;
    info!("Admin API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("admin server failed")?;

    info!("Shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// Worker threads are detached; in-flight relays end with the process.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
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
