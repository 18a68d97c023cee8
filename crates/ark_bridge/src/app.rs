//! Main application logic and lifecycle management.
//!
//! This module contains the `Application` struct that orchestrates bridge
//! startup, periodic statistics and shutdown.

use crate::{
    cli::CliArgs, config::AppConfig, logging::display_banner, signals::handle_shutdown_signals,
};
use bridge_event_system::{EventSystem, ShutdownState};
use bridge_server::shutdown::ShutdownPhase;
use bridge_server::{BridgeServer, UpstreamHandle};
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{error, info, warn};

/// Interval between periodic statistics reports.
const STATS_INTERVAL: Duration = Duration::from_secs(60);

/// Time the accept loop gets to stop after shutdown is initiated.
const SERVER_STOP_TIMEOUT: Duration = Duration::from_secs(8);

/// Main application struct.
///
/// The `Application` manages the lifecycle of the bridge: configuration,
/// server construction, monitoring and graceful shutdown.
pub struct Application {
    /// Loaded application configuration
    config: AppConfig,
    /// Bridge server instance
    server: Arc<BridgeServer>,
}

impl Application {
    /// Creates a new application instance.
    ///
    /// # Arguments
    ///
    /// * `args` - Parsed command-line arguments
    /// * `upstream` - Connected handle to the game server's RCON port
    ///
    /// # Process
    ///
    /// 1. Load configuration from file (creating default if missing)
    /// 2. Apply command-line argument overrides
    /// 3. Validate merged configuration
    /// 4. Display startup banner
    /// 5. Initialize the bridge server
    pub async fn new(
        args: CliArgs,
        upstream: Arc<dyn UpstreamHandle>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        if let Some(bind_address) = args.bind_address {
            config.server.bind_address = bind_address;
        }

        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }

        if args.json_logs {
            config.logging.json_format = true;
        }

        config
            .validate()
            .map_err(|e| format!("Configuration validation failed: {e}"))?;
        info!("✅ Configuration loaded and validated successfully");

        display_banner();

        let server_config = config.to_server_config()?;
        let server = Arc::new(BridgeServer::new(server_config, upstream));

        Ok(Self { config, server })
    }

    /// The bridge server driven by this application.
    pub fn server(&self) -> Arc<BridgeServer> {
        self.server.clone()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Runs the bridge until a termination signal arrives.
    ///
    /// Returns the server's error if it stops on its own, for example when
    /// the bind address is already taken.
    ///
    /// # Shutdown
    ///
    /// 1. Stop accepting websocket clients
    /// 2. Wait for the accept loop to finish
    /// 3. Log final statistics
    ///
    /// An in-game shutdown sequence that is still running when the process
    /// stops is abandoned.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        info!("🌟 Starting ARK RCON bridge");
        self.log_configuration_summary();

        let event_system = self.server.get_event_system();
        let shutdown_state = ShutdownState::new();

        let mut server_handle = {
            let server = self.server.clone();
            let shutdown_state = shutdown_state.clone();
            tokio::spawn(async move { server.start_with_shutdown_state(shutdown_state).await })
        };

        let monitoring_handle = {
            let server = self.server.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(STATS_INTERVAL);
                let mut last_events_emitted = 0u64;

                loop {
                    interval.tick().await;

                    let stats = server.get_event_stats();
                    let events_this_period = stats.events_emitted - last_events_emitted;
                    last_events_emitted = stats.events_emitted;
                    let clients = server.get_connection_manager().connection_count().await;

                    info!(
                        "📊 Bridge Health - {} events/min | {} clients | {} handler failures",
                        events_this_period, clients, stats.handler_failures
                    );

                    let phase = server.shutdown_phase();
                    if phase != ShutdownPhase::Idle {
                        info!("🛑 In-game shutdown in progress: {}", phase);
                    }
                }
            })
        };

        info!("✅ Bridge is now running!");
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        let stopped_early = tokio::select! {
            signal = handle_shutdown_signals(&shutdown_state) => {
                signal?;
                None
            }
            finished = &mut server_handle => Some(finished),
        };
        monitoring_handle.abort();

        if let Some(finished) = stopped_early {
            // The server stopped without a signal; hand its error to the caller
            shutdown_state.initiate_shutdown();
            shutdown_state.complete_shutdown();
            log_final_statistics(&event_system);
            return match finished {
                Ok(Ok(())) => {
                    info!("✅ Server completed successfully");
                    Ok(())
                }
                Ok(Err(e)) => {
                    error!("❌ Server error: {}", e);
                    Err(e.into())
                }
                Err(e) => {
                    error!("❌ Server task failed: {}", e);
                    Err(e.into())
                }
            };
        }

        let phase = self.server.shutdown_phase();
        if phase != ShutdownPhase::Idle {
            warn!("⚠️ Abandoning in-game shutdown sequence at phase {}", phase);
        }

        info!("⏳ Waiting for server task to stop...");
        match tokio::time::timeout(SERVER_STOP_TIMEOUT, &mut server_handle).await {
            Ok(Ok(Ok(()))) => info!("✅ Server task completed gracefully"),
            Ok(Ok(Err(e))) => warn!("⚠️ Server stopped with error: {}", e),
            Ok(Err(e)) => warn!("⚠️ Server task failed: {}", e),
            Err(_) => warn!("⏰ Server task did not complete within timeout, proceeding"),
        }

        shutdown_state.complete_shutdown();
        log_final_statistics(&event_system);

        info!("✅ ARK RCON bridge shutdown complete");
        Ok(())
    }

    /// Logs the configuration summary at startup.
    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("  🌐 Bind address: {}", self.config.server.bind_address);
        info!("  👥 Max connections: {}", self.config.server.max_connections);
        info!(
            "  ⏱️ Forced reconnect after {} possible timeouts within {}s",
            self.config.upstream.timeout_threshold, self.config.upstream.timeout_window_secs
        );
    }
}

/// Logs final statistics during shutdown.
fn log_final_statistics(event_system: &EventSystem) {
    let final_stats = event_system.get_stats();
    info!("📊 Final Statistics:");
    info!("  - Events emitted: {}", final_stats.events_emitted);
    info!("  - Events without handlers: {}", final_stats.events_unhandled);
    info!("  - Handler failures: {}", final_stats.handler_failures);
    info!("  - Handlers registered: {}", final_stats.total_handlers);
}
