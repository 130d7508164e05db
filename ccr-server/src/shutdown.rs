//! Signal handling for graceful shutdown.

use tokio::signal::unix::{SignalKind, signal};

/// Creates a future that completes when a shutdown signal is received.
///
/// Listens for SIGTERM and SIGINT (Ctrl+C).
pub async fn shutdown_signal() {
    let Ok(mut sigterm) = signal(SignalKind::terminate()) else {
        tracing::error!("failed to install SIGTERM handler");
        return std::future::pending().await;
    };
    let Ok(mut sigint) = signal(SignalKind::interrupt()) else {
        tracing::error!("failed to install SIGINT handler");
        return std::future::pending().await;
    };

    tokio::select! {
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
        _ = sigint.recv() => {
            tracing::info!("Received SIGINT, initiating graceful shutdown");
        }
    }
}
