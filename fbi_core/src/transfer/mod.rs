//! Device handshake over TCP.
//!
//! This module provides:
//! - Length-prefixed framing of the URL list
//! - The notifier that dials the device and writes the frame
//! - The completion watcher that waits for the device to hang up

pub mod notifier;
pub mod protocol;
pub mod watcher;

// Re-export public API
pub use notifier::Notifier;
pub use protocol::{decode_frame, encode_frame, read_frame, write_frame};
pub use watcher::{WatchOutcome, watch_for_completion};
