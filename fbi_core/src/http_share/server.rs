//! HTTP server for file serving
//!
//! Static files from the serving directory, started once per session and
//! stopped with a bounded grace period.

use crate::error::TransferError;
use axum::Router;
use std::future;
use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Build the axum router serving files under `root`.
///
/// Requests can't escape `root`; missing files are 404.
pub fn create_router(root: &Path) -> Router {
    let files = ServeDir::new(root).append_index_html_on_directories(false);

    Router::new()
        .fallback_service(files)
        .layer(TraceLayer::new_for_http())
}

/// Handle to a running file server
pub struct FileServer {
    local_addr: SocketAddr,
    cancel_token: CancellationToken,
    task: Option<JoinHandle<io::Result<()>>>,
}

impl FileServer {
    /// Bind `addr` and start serving `root` in a background task.
    ///
    /// Returns as soon as the listener is bound.
    pub async fn start(addr: SocketAddr, root: &Path) -> Result<Self, TransferError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|error| TransferError::ServerStart {
                addr: addr.to_string(),
                error,
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|error| TransferError::ServerStart {
                addr: addr.to_string(),
                error,
            })?;

        let router = create_router(root);
        let cancel_token = CancellationToken::new();
        let ct = cancel_token.clone();

        tracing::info!(
            "HTTP server starting on http://{} serving {}",
            local_addr,
            root.display()
        );

        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    ct.cancelled().await;
                    tracing::info!("HTTP server shutting down gracefully");
                })
                .await
        });

        Ok(Self {
            local_addr,
            cancel_token,
            task: Some(task),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Resolves only if the serve loop exits before [`FileServer::shutdown`].
    ///
    /// Any such exit is a server failure.
    pub async fn failed(&mut self) -> TransferError {
        let Some(task) = self.task.as_mut() else {
            return future::pending().await;
        };

        let result = task.await;
        self.task = None;

        match result {
            Ok(Ok(())) => TransferError::Server(io::Error::other("server stopped unexpectedly")),
            Ok(Err(e)) => TransferError::Server(e),
            Err(join_err) => TransferError::Server(io::Error::other(join_err.to_string())),
        }
    }

    /// Stop accepting connections and wait up to `grace` for in-flight requests.
    ///
    /// Requests still running after `grace` are dropped and a `TimedOut` error
    /// is returned for the caller to log.
    pub async fn shutdown(mut self, grace: Duration) -> io::Result<()> {
        self.cancel_token.cancel();

        let Some(mut task) = self.task.take() else {
            return Ok(());
        };

        match tokio::time::timeout(grace, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(io::Error::other(join_err.to_string())),
            Err(_) => {
                task.abort();
                Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("in-flight requests still running after {:?}", grace),
                ))
            }
        }
    }
}

impl Drop for FileServer {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
