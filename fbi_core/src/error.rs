//! Error types for manifest building, framing and the transfer session.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while turning a target path into a manifest
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("no files with supported extensions to serve in {}", .path.display())]
    NoEligibleFiles { path: PathBuf },

    #[error("unsupported file extension: {}. Supported extensions are: {}", .path.display(), .accepted.join(", "))]
    UnsupportedExtension {
        path: PathBuf,
        accepted: Vec<&'static str>,
    },

    #[error("invalid host address {host}:{port}")]
    InvalidHost { host: String, port: u16 },
}

/// Failures while encoding or decoding the length-prefixed payload
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("payload too large: {0} bytes does not fit a u32 length prefix")]
    PayloadTooLarge(usize),

    #[error("Message too large: {len} bytes (max {max})")]
    FrameTooLarge { len: usize, max: usize },

    #[error("frame truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("payload is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Fatal failures of a transfer session, tagged with the stage that failed.
///
/// Messages carry the underlying cause so one line is enough to act on.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("preparing file list payload: {0}")]
    Manifest(ManifestError),

    #[error("changing directory to {}: {error}", .path.display())]
    ChangeDirectory { path: PathBuf, error: std::io::Error },

    #[error("starting HTTP server on {addr}: {error}")]
    ServerStart { addr: String, error: std::io::Error },

    #[error("HTTP server failed: {0}")]
    Server(std::io::Error),

    #[error("dialing target device {target}: {error}")]
    Connect { target: String, error: std::io::Error },

    #[error("writing to connection {target}: {error}")]
    Send { target: String, error: ProtocolError },

    #[error("reading from connection: {0}")]
    Watch(std::io::Error),
}

impl From<ManifestError> for TransferError {
    fn from(err: ManifestError) -> Self {
        Self::Manifest(err)
    }
}
