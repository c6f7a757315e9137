use anyhow::{Context, Result, bail};
use clap::Parser;
use fbi_core::{AppConfig, AppEvent, SessionOutcome, build_manifest, run_transfer};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

mod cli;
mod output;

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // 0. Initialize logging
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // FBI_* overrides may live in a .env next to the packages
    let _ = dotenvy::dotenv();

    if cli.init_config {
        return init_config();
    }

    let target = target_path(&cli)?;
    let config = AppConfig::load()
        .and_then(AppConfig::apply_env)
        .map(|config| cli.apply_overrides(config))
        .context("Error loading configuration")?;

    // Nothing is sent in a dry run, so no target device is needed
    if cli.dry_run {
        let (host_ip, host_port) = config
            .resolve_host()
            .context("Error loading configuration")?;
        let (manifest, serving_dir) = build_manifest(&target, &host_ip, host_port)?;
        println!("Serving directory: {}", serving_dir.display());
        println!("\nURLs:\n{}", manifest.payload());
        return Ok(());
    }

    let config = config.resolve().context("Error loading configuration")?;

    // 1. Event channel to the printer
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(100);
    let printer = tokio::spawn(output::print_events(event_rx));

    // 2. Run the session; dropping event_tx at the end lets the printer finish
    let result = run_transfer(&config, &target, shutdown_signal(), event_tx).await;
    let _ = printer.await;

    match result? {
        SessionOutcome::Completed | SessionOutcome::Interrupted => {
            println!("Server gracefully shut down.");
        }
        SessionOutcome::Unknown => {
            println!("Server shut down. Installation status unknown.");
        }
    }
    Ok(())
}

fn target_path(cli: &Cli) -> Result<PathBuf> {
    let Some(path) = cli.cleaned_target_path() else {
        bail!("usage: fbisender <file / directory>");
    };

    if !path.exists() {
        bail!("{}: no such file or directory", path.display());
    }
    Ok(path)
}

fn init_config() -> Result<()> {
    let path = AppConfig::config_path().context("No config directory on this platform")?;
    if path.exists() {
        bail!("{} already exists", path.display());
    }

    AppConfig::default().save_to(&path)?;
    println!("Wrote {}. Set target_ip to your device's IP address.", path.display());
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on Unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
