use std::net::SocketAddr;
use std::path::PathBuf;

pub mod config;
pub mod error;
pub mod http_share;
pub mod manifest;
pub mod session;
pub mod transfer;

pub use config::{AppConfig, TransferConfig};
pub use error::{ManifestError, ProtocolError, TransferError};
pub use manifest::{ACCEPTED_EXTENSIONS, Manifest, build_manifest};
pub use session::{SessionOutcome, run_transfer};

//Struct report from Core to the front end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Status(String),

    /// Manifest built; URLs in the order they will be sent
    ManifestReady {
        urls: Vec<String>,
        serving_dir: PathBuf,
    },

    /// HTTP server is bound and accepting requests
    HttpServerStarted {
        addr: SocketAddr,
    },

    /// Payload written to the target device
    PayloadSent {
        target: String,
        bytes: usize,
    },

    /// Waiting for the device to close the connection
    WaitingForInstall,

    /// Device closed the connection
    InstallCompleted,

    /// External interrupt requested shutdown
    InterruptReceived,

    /// HTTP server has been stopped
    HttpServerStopped,

    Error(String),
}
