//! # ARK RCON Bridge - Application Entry Point
//!
//! Websocket bridge between browser clients and the RCON connection of an ARK
//! server. This crate handles CLI parsing, configuration loading, logging
//! and the application lifecycle around [`bridge_server::BridgeServer`].
//!
//! The crate ships no executable: the embedding program owns the RCON
//! transport and passes a connected [`UpstreamHandle`] to [`init`].
//!
//! ## Command Line
//!
//! ```bash
//! # Run with default configuration
//! my-ark-tool
//!
//! # Specify custom configuration
//! my-ark-tool --config production.toml
//!
//! # Override specific settings
//! my-ark-tool --bind 0.0.0.0:8080 --log-level debug --json-logs
//! ```
//!
//! ## Configuration
//!
//! The bridge loads configuration from a TOML file (default: `config.toml`).
//! If the file doesn't exist, a default configuration will be created.
//!
//! ## Signal Handling
//!
//! The bridge shuts down gracefully on SIGINT (Ctrl+C) or SIGTERM. A second
//! signal exits immediately.

use std::sync::Arc;
use tracing::error;

pub mod app;
pub mod cli;
pub mod config;
pub mod logging;
pub mod signals;

pub use app::Application;
pub use bridge_server::{UpstreamError, UpstreamHandle};
pub use cli::CliArgs;
pub use config::{AppConfig, LoggingSettings, ServerSettings, UpstreamSettings};

/// Runs the bridge in front of `upstream` until a termination signal arrives.
///
/// Handles the complete application lifecycle:
/// 1. Command-line argument parsing
/// 2. Configuration loading and logging setup
/// 3. Application creation and execution
///
/// Must be called from within a tokio runtime.
///
/// # Example
///
/// ```rust,no_run
/// use lib_ark_bridge::UpstreamHandle;
/// use std::sync::Arc;
///
/// async fn serve(rcon: Arc<dyn UpstreamHandle>) -> Result<(), Box<dyn std::error::Error>> {
///     lib_ark_bridge::init(rcon).await
/// }
/// ```
pub async fn init(upstream: Arc<dyn UpstreamHandle>) -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Logging comes up before the application so config loading is visible
    let mut logging_settings = AppConfig::load_from_file(&args.config_path)
        .await
        .unwrap_or_default()
        .logging;
    if let Some(level) = &args.log_level {
        logging_settings.level = level.clone();
    }

    if let Err(e) = logging::setup_logging(&logging_settings, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        return Err(e);
    }

    let app = Application::new(args, upstream).await.inspect_err(|e| {
        error!("❌ Failed to start application: {e:?}");
    })?;

    app.run().await.inspect_err(|e| {
        error!("❌ Application error: {:?}", e);
    })
}
