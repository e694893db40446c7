pub mod adapters;
pub mod app;
mod assets;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod ports;
pub mod push;
pub(crate) mod state;
pub mod types;

use std::sync::Arc;
use thiserror::Error;
use tokio::signal;
use tracing::{error, info};

use crate::adapters::InMemorySubscriptionStore;
use crate::error::DispatchError;
use crate::push::NotificationDispatcher;

pub use push::generate_vapid_credentials;

#[derive(Debug, Error)]
pub enum ServeError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Builds the dispatcher (failing on missing VAPID settings) and serves the
/// notification routes until Ctrl+C or SIGTERM.
pub async fn serve(config: config::AppConfig) -> Result<(), ServeError> {
    serve_with_shutdown(config, shutdown_signal()).await
}

/// Like [`serve`], but stops accepting connections once `shutdown`
/// resolves. In-flight requests are allowed to finish.
pub async fn serve_with_shutdown<F>(config: config::AppConfig, shutdown: F) -> Result<(), ServeError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let dispatcher =
        NotificationDispatcher::from_config(&config, InMemorySubscriptionStore::new())?;
    let router = app::app(Arc::new(dispatcher), &config.api_prefix);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(
        addr = %config.bind,
        prefix = %config::normalize_api_prefix(&config.api_prefix),
        "listening"
    );
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(err) => {
                error!("failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
