use crate::config::join_host_port;
use crate::error::TransferError;
use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, info};

use super::protocol::write_frame;

/// Open connection to the device's URL listener
pub struct Notifier {
    stream: TcpStream,
    target: String,
}

impl Notifier {
    /// Dial the device. No retries; a failure ends the session.
    pub async fn connect(
        target_ip: &str,
        target_port: u16,
        connect_timeout: Option<Duration>,
    ) -> Result<Self, TransferError> {
        let target = join_host_port(target_ip, target_port);
        info!("Connecting to target device at {}", target);

        let connecting = TcpStream::connect(target.as_str());
        let stream = within(connect_timeout, connecting)
            .await
            .map_err(|error| TransferError::Connect {
                target: target.clone(),
                error,
            })?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not set TCP_NODELAY: {}", e);
        }

        Ok(Self { stream, target })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Write the framed payload and hand the still-open stream back for watching.
    ///
    /// On failure the stream is dropped, closing the connection.
    pub async fn send(mut self, payload: &str) -> Result<(TcpStream, usize), TransferError> {
        let written = write_frame(&mut self.stream, payload)
            .await
            .map_err(|error| TransferError::Send {
                target: self.target.clone(),
                error,
            })?;

        debug!("Wrote {} byte frame to {}", written, self.target);
        Ok((self.stream, written))
    }
}

/// Run `connecting`, failing with `TimedOut` once `limit` passes
async fn within<F, T>(limit: Option<Duration>, connecting: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    let Some(limit) = limit else {
        return connecting.await;
    };

    match tokio::time::timeout(limit, connecting).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("no answer within {:?}", limit),
        )),
    }
}
