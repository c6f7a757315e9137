use crate::error::TransferError;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_QUALIFIER: &str = "com";
const APP_ORGANIZATION: &str = "fbisender";
const APP_NAME: &str = "fbisender";
const CONFIG_FILE: &str = "config.json";

/// Overrides the config directory (used by tests and portable installs)
pub const CONFIG_DIR_ENV: &str = "FBI_SENDER_CONFIG_DIR";

pub const ENV_TARGET_IP: &str = "FBI_TARGET_IP";
pub const ENV_TARGET_PORT: &str = "FBI_TARGET_PORT";
pub const ENV_HOST_IP: &str = "FBI_HOST_IP";
pub const ENV_HOST_PORT: &str = "FBI_HOST_PORT";

/// Port the homebrew loader listens on for URL lists
pub const DEFAULT_TARGET_PORT: u16 = 5000;

/// Default HTTP port for file serving
pub const DEFAULT_HOST_PORT: u16 = 8080;

/// How long in-flight downloads may run after shutdown starts
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Address probed to find the interface of the default route. Nothing is sent.
const ROUTE_PROBE_ADDR: &str = "8.8.8.8:53";

/// On-disk configuration. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub target_ip: Option<String>,
    pub target_port: u16,
    pub host_ip: Option<String>,
    pub host_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            target_ip: None,
            target_port: DEFAULT_TARGET_PORT,
            host_ip: None,
            host_port: DEFAULT_HOST_PORT,
        }
    }
}

impl AppConfig {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Some(PathBuf::from(dir).join(CONFIG_FILE));
        }

        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Load config from the default location, or defaults if there is no file
    pub fn load() -> Result<Self, TransferError> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from `path`. A missing file yields defaults; a malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self, TransferError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(TransferError::Config(format!(
                    "reading {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        serde_json::from_str(&content)
            .map_err(|e| TransferError::Config(format!("parsing {}: {}", path.display(), e)))
    }

    /// Save config to disk, creating the parent directory
    pub fn save_to(&self, path: &Path) -> Result<(), TransferError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                TransferError::Config(format!("creating {}: {}", parent.display(), e))
            })?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| TransferError::Config(e.to_string()))?;
        fs::write(path, json)
            .map_err(|e| TransferError::Config(format!("writing {}: {}", path.display(), e)))
    }

    /// Overlay values from the process environment
    pub fn apply_env(self) -> Result<Self, TransferError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary variable lookup
    pub fn apply_env_from<F>(mut self, lookup: F) -> Result<Self, TransferError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ip) = lookup(ENV_TARGET_IP).filter(|v| !v.trim().is_empty()) {
            self.target_ip = Some(ip.trim().to_string());
        }
        if let Some(ip) = lookup(ENV_HOST_IP).filter(|v| !v.trim().is_empty()) {
            self.host_ip = Some(ip.trim().to_string());
        }
        if let Some(port) = lookup(ENV_TARGET_PORT) {
            self.target_port = parse_port(ENV_TARGET_PORT, &port)?;
        }
        if let Some(port) = lookup(ENV_HOST_PORT) {
            self.host_port = parse_port(ENV_HOST_PORT, &port)?;
        }
        Ok(self)
    }

    /// Validate and fill in detected values, producing the session config
    pub fn resolve(self) -> Result<TransferConfig, TransferError> {
        let target_ip = self
            .target_ip
            .as_deref()
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                TransferError::Config(
                    "target_ip is not set (config file, FBI_TARGET_IP or --target-ip)".to_string(),
                )
            })?;

        if self.target_port == 0 {
            return Err(TransferError::Config("target_port must not be 0".to_string()));
        }
        let (host_ip, host_port) = self.resolve_host()?;

        Ok(TransferConfig {
            target_ip,
            target_port: self.target_port,
            host_ip,
            host_port,
            shutdown_grace: SHUTDOWN_GRACE,
            connect_timeout: Some(CONNECT_TIMEOUT),
        })
    }

    /// Resolve only the serving side (host IP and port). Needs no target.
    pub fn resolve_host(&self) -> Result<(String, u16), TransferError> {
        if self.host_port == 0 {
            return Err(TransferError::Config("host_port must not be 0".to_string()));
        }

        let host_ip = match self.host_ip.as_deref().map(str::trim) {
            Some(ip) if !ip.is_empty() => ip.to_string(),
            _ => {
                tracing::info!("Detecting host IP...");
                detect_host_ip().ok_or_else(|| {
                    TransferError::Config(
                        "could not detect host IP, set host_ip explicitly".to_string(),
                    )
                })?
            }
        };

        Ok((host_ip, self.host_port))
    }
}

fn parse_port(name: &str, value: &str) -> Result<u16, TransferError> {
    value
        .trim()
        .parse()
        .map_err(|_| TransferError::Config(format!("{} is not a valid port: {:?}", name, value)))
}

/// Fully resolved settings for one transfer session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfig {
    pub target_ip: String,
    pub target_port: u16,
    pub host_ip: String,
    pub host_port: u16,
    pub shutdown_grace: Duration,
    pub connect_timeout: Option<Duration>,
}

impl TransferConfig {
    /// `host:port` of the device listener, bracketing IPv6 literals
    pub fn target_addr(&self) -> String {
        join_host_port(&self.target_ip, self.target_port)
    }

    /// HTTP server bind address (all interfaces)
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.host_port))
    }
}

pub(crate) fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

/// Best-effort IP of the interface that routes to the outside world.
///
/// Falls back to the first local address reported by the OS.
pub fn detect_host_ip() -> Option<String> {
    route_local_ip()
        .or_else(|| local_ip_address::local_ip().ok())
        .map(|ip| ip.to_string())
}

fn route_local_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect(ROUTE_PROBE_ADDR).ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_unspecified()).then_some(ip)
}
