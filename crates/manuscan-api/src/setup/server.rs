//! Server startup and graceful shutdown

use anyhow::{Context, Result};
use axum::Router;
use manuscan_core::Config;
use std::net::SocketAddr;

/// Serve `app` until a shutdown signal arrives.
pub async fn start_server(config: &Config, app: Router) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port()));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        manuscripts_prefix = %config.manuscripts_prefix(),
        scratch_dir = %config.scan_scratch_dir().display(),
        smtp_fallback = config.mail().smtp.is_some(),
        event_auth = config.service_api_key().is_some(),
        addr = %addr,
        "Server ready and accepting connections"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
///
/// # Panics
/// If the signal handlers cannot be installed.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.expect("install Ctrl+C handler");
                tracing::info!(signal = "SIGINT", "Shutdown requested");
            }
            _ = sigterm.recv() => {
                tracing::info!(signal = "SIGTERM", "Shutdown requested");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("install Ctrl+C handler");
        tracing::info!(signal = "ctrl_c", "Shutdown requested");
    }

    tracing::info!("Draining in-flight requests");
}
