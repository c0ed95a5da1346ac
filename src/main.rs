//! Photobooth server - stores kiosk uploads and serves them for QR links
//!
//! Main entry point for the application.

use photobooth::settings::ServerSettings;
use photobooth::telemetry::{init_logging, LogConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Held until exit so file output is flushed
    let _log_guard = init_logging(&LogConfig::from_env())?;

    tracing::info!("Starting Photobooth server v{}", env!("CARGO_PKG_VERSION"));

    let settings = ServerSettings::from_env();
    photobooth::run_server(settings, shutdown_signal()).await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
