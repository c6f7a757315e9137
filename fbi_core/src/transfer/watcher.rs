use crate::error::TransferError;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Read buffer for anything the device writes back (discarded)
const READ_BUFFER_SIZE: usize = 1024;

/// How the watcher reached its terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// Device closed (or reset) the connection: installation finished
    PeerClosed,
    /// Session cancellation fired first
    Cancelled,
}

/// Watch the handshake connection until the device closes it.
///
/// Returns `PeerClosed` on EOF or connection reset, `Cancelled` if `cancel`
/// fires first, and an error for any other read failure. Whichever way it
/// ends, `cancel` is triggered on return.
pub async fn watch_for_completion<R>(
    mut conn: R,
    cancel: CancellationToken,
) -> Result<WatchOutcome, TransferError>
where
    R: AsyncRead + Unpin,
{
    let _done = cancel.clone().drop_guard();

    info!("Waiting for the installation to complete...");
    let mut buf = [0u8; READ_BUFFER_SIZE];

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("Watcher cancelled");
                return Ok(WatchOutcome::Cancelled);
            }
            result = conn.read(&mut buf) => {
                match result {
                    Ok(0) => {
                        info!("Installation completed. Connection closed by target device.");
                        return Ok(WatchOutcome::PeerClosed);
                    }
                    Ok(n) => debug!("Discarding {} bytes from target device", n),
                    Err(e) if is_peer_reset(&e) => {
                        info!("Installation completed. Connection reset by target device.");
                        return Ok(WatchOutcome::PeerClosed);
                    }
                    Err(e) => return Err(TransferError::Watch(e)),
                }
            }
        }
    }
}

fn is_peer_reset(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::ConnectionReset
}
