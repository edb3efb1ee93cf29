//! Serving the proxy over TCP with graceful shutdown.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use log::{error, info};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;

use crate::backend::SchoolsBackend;
use crate::proxy::router;

/// Errors running the proxy server.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The server stopped with an I/O error.
    #[error("proxy server failed: {0}")]
    Serve(#[source] io::Error),
}

/// Bind `addr` and serve the proxy until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// [`ServeError::Bind`] if the address is unavailable, [`ServeError::Serve`]
/// if serving fails.
pub async fn serve(addr: SocketAddr, backend: Arc<dyn SchoolsBackend>) -> Result<(), ServeError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })?;
    serve_with_shutdown(listener, backend, shutdown_signal()).await
}

/// Serve the proxy on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// [`ServeError::Serve`] if serving fails.
pub async fn serve_with_shutdown<S>(
    listener: TcpListener,
    backend: Arc<dyn SchoolsBackend>,
    shutdown: S,
) -> Result<(), ServeError>
where
    S: Future<Output = ()> + Send + 'static,
{
    match listener.local_addr() {
        Ok(local) => info!("proxy listening on {local}"),
        Err(err) => error!("proxy listening on an unknown address: {err}"),
    }
    axum::serve(listener, router(backend))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServeError::Serve)?;
    info!("proxy shut down");
    Ok(())
}

/// Resolve on Ctrl+C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(err) => {
                error!("failed to install Ctrl+C handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
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
        () = ctrl_c => {},
        () = terminate => {},
    }
}
