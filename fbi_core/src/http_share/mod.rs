//! HTTP file serving module
//!
//! Exposes the serving directory so the device can download the packages.

pub mod server;

pub use server::{FileServer, create_router};
