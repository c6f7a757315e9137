use clap::Parser;
use fbi_core::AppConfig;
use std::path::PathBuf;

/// Send .cia/.tik/.cetk/.3dsx files to FBI over the network
#[derive(Debug, Parser)]
#[command(name = "fbisender", version, about)]
pub struct Cli {
    /// File or directory to send
    #[arg(required_unless_present = "init_config")]
    pub target_path: Option<PathBuf>,

    /// IP of the device running the installer (overrides config)
    #[arg(long)]
    pub target_ip: Option<String>,

    /// Port the installer listens on
    #[arg(long)]
    pub target_port: Option<u16>,

    /// IP the device should download from (auto-detected if unset)
    #[arg(long)]
    pub host_ip: Option<String>,

    /// Port for the local HTTP server
    #[arg(long)]
    pub host_port: Option<u16>,

    /// Print the URL list and exit without serving or contacting the device
    #[arg(long)]
    pub dry_run: bool,

    /// Write a config template to the config directory and exit
    #[arg(long, conflicts_with = "dry_run")]
    pub init_config: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Target path with surrounding whitespace removed.
    ///
    /// Non UTF-8 paths are passed through untouched.
    pub fn cleaned_target_path(&self) -> Option<PathBuf> {
        let raw = self.target_path.as_ref()?;
        match raw.to_str() {
            Some(text) => Some(PathBuf::from(text.trim())),
            None => Some(raw.clone()),
        }
    }

    /// Command-line flags win over file and environment values
    pub fn apply_overrides(&self, mut config: AppConfig) -> AppConfig {
        if let Some(ip) = &self.target_ip {
            config.target_ip = Some(ip.clone());
        }
        if let Some(port) = self.target_port {
            config.target_port = port;
        }
        if let Some(ip) = &self.host_ip {
            config.host_ip = Some(ip.clone());
        }
        if let Some(port) = self.host_port {
            config.host_port = port;
        }
        config
    }
}
