//! Transfer session lifecycle
//!
//! One session: build the manifest, serve the files, hand the URL list to the
//! device, then wait for the device to hang up (or for an interrupt) and shut
//! everything down in order.

use crate::AppEvent;
use crate::config::TransferConfig;
use crate::error::TransferError;
use crate::http_share::FileServer;
use crate::manifest::build_manifest;
use crate::transfer::{Notifier, WatchOutcome, watch_for_completion};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// How a session that shut down cleanly ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The device closed the connection after installing
    Completed,
    /// An external interrupt ended the session first
    Interrupted,
    /// The connection failed while waiting; installation status unknown
    Unknown,
}

/// Run one transfer session for `target`.
///
/// `interrupt` resolves when the user asks to stop. Every path that gets past
/// the handshake stops the HTTP server and joins the watcher before
/// returning. Only setup failures (manifest, directory change, server start,
/// connect/send) and an unexpected HTTP server exit are returned as errors.
pub async fn run_transfer<I>(
    config: &TransferConfig,
    target: &Path,
    interrupt: I,
    event_tx: mpsc::Sender<AppEvent>,
) -> Result<SessionOutcome, TransferError>
where
    I: Future<Output = ()>,
{
    // 1. Manifest
    let _ = event_tx
        .send(AppEvent::Status("Preparing data...".to_string()))
        .await;
    let (manifest, serving_dir) = build_manifest(target, &config.host_ip, config.host_port)?;
    let payload = manifest.payload();
    let _ = event_tx
        .send(AppEvent::ManifestReady {
            urls: manifest.urls().to_vec(),
            serving_dir: serving_dir.clone(),
        })
        .await;

    // 2. Serving directory and HTTP server
    let serve_root = enter_serving_directory(&serving_dir)?;
    let mut server = FileServer::start(config.bind_addr(), &serve_root).await?;
    let _ = event_tx
        .send(AppEvent::HttpServerStarted {
            addr: server.local_addr(),
        })
        .await;

    // 3. Handshake
    let _ = event_tx
        .send(AppEvent::Status(format!(
            "Sending URL(s) to {} on port {}...",
            config.target_ip, config.target_port
        )))
        .await;
    let sent = match Notifier::connect(
        &config.target_ip,
        config.target_port,
        config.connect_timeout,
    )
    .await
    {
        Ok(notifier) => notifier.send(&payload).await,
        Err(e) => Err(e),
    };
    let stream = match sent {
        Ok((stream, bytes)) => {
            let _ = event_tx
                .send(AppEvent::PayloadSent {
                    target: config.target_addr(),
                    bytes,
                })
                .await;
            stream
        }
        Err(e) => {
            error!("Handshake failed: {}", e);
            stop_server(server, config.shutdown_grace, &event_tx).await;
            return Err(e);
        }
    };

    // 4. Completion watcher
    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(watch_for_completion(stream, cancel.clone()));
    let _ = event_tx.send(AppEvent::WaitingForInstall).await;

    // 5-6. Watcher done, interrupt, or server failure: first one wins
    let mut interrupted = false;
    let mut server_failure = None;
    tokio::pin!(interrupt);
    tokio::select! {
        biased;

        _ = cancel.cancelled() => {}
        _ = &mut interrupt => {
            info!("Interrupt received. Initiating shutdown...");
            interrupted = true;
            let _ = event_tx.send(AppEvent::InterruptReceived).await;
            cancel.cancel();
        }
        err = server.failed() => {
            error!("{}", err);
            server_failure = Some(err);
            cancel.cancel();
        }
    }

    // 7. HTTP server
    stop_server(server, config.shutdown_grace, &event_tx).await;

    // 8. Watcher exit
    let outcome = settle_watcher(watcher.await, interrupted, &event_tx).await;

    if let Some(err) = server_failure {
        return Err(err);
    }

    info!("Session finished: {:?}", outcome);
    Ok(outcome)
}

/// Map how the watcher task ended onto the session outcome.
///
/// A watcher read error is reported but never fails the session.
async fn settle_watcher(
    joined: Result<Result<WatchOutcome, TransferError>, JoinError>,
    interrupted: bool,
    event_tx: &mpsc::Sender<AppEvent>,
) -> SessionOutcome {
    match joined {
        Ok(Ok(WatchOutcome::PeerClosed)) if !interrupted => {
            let _ = event_tx.send(AppEvent::InstallCompleted).await;
            SessionOutcome::Completed
        }
        Ok(Ok(_)) => SessionOutcome::Interrupted,
        Ok(Err(e)) => {
            warn!("Installation process error: {}", e);
            let _ = event_tx
                .send(AppEvent::Error(format!(
                    "Installation status unknown: {}",
                    e
                )))
                .await;
            SessionOutcome::Unknown
        }
        Err(join_err) => {
            warn!("Watcher task failed: {}", join_err);
            SessionOutcome::Unknown
        }
    }
}

/// Switch the process working directory to `dir`, once, before serving.
///
/// Returns the absolute directory the HTTP server is rooted at.
fn enter_serving_directory(dir: &Path) -> Result<PathBuf, TransferError> {
    let change_err = |error: std::io::Error| TransferError::ChangeDirectory {
        path: dir.to_path_buf(),
        error,
    };

    let absolute = dir.canonicalize().map_err(change_err)?;
    std::env::set_current_dir(&absolute).map_err(change_err)?;
    Ok(absolute)
}

/// Best-effort server shutdown; failures are logged only
async fn stop_server(server: FileServer, grace: Duration, event_tx: &mpsc::Sender<AppEvent>) {
    match server.shutdown(grace).await {
        Ok(()) => info!("HTTP server stopped"),
        Err(e) => warn!("HTTP server shutdown error: {}", e),
    }
    let _ = event_tx.send(AppEvent::HttpServerStopped).await;
}
