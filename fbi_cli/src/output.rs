use fbi_core::AppEvent;
use tokio::sync::mpsc;

/// Print session events until the core drops its sender
pub async fn print_events(mut event_rx: mpsc::Receiver<AppEvent>) {
    while let Some(event) = event_rx.recv().await {
        if let Some(line) = render(&event) {
            println!("{}", line);
        }
    }
}

fn render(event: &AppEvent) -> Option<String> {
    match event {
        AppEvent::Status(message) => Some(message.clone()),
        AppEvent::ManifestReady { urls, .. } => Some(format!("\nURLs:\n{}\n", urls.join("\n"))),
        AppEvent::HttpServerStarted { addr } => {
            Some(format!("Starting HTTP server on port {}", addr.port()))
        }
        AppEvent::PayloadSent { .. } => None,
        AppEvent::WaitingForInstall => {
            Some("Waiting for the installation to complete...".to_string())
        }
        AppEvent::InstallCompleted => {
            Some("Installation completed. Connection closed by target device.".to_string())
        }
        AppEvent::InterruptReceived => Some("\nReceived signal. Shutting down...".to_string()),
        AppEvent::HttpServerStopped => None,
        AppEvent::Error(message) => Some(format!("Warning: {}", message)),
    }
}
