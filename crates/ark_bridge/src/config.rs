//! Configuration management for the bridge.
//!
//! This module handles loading, validation, and conversion of the bridge
//! configuration from TOML files and command-line arguments.
//!
//! ```toml
//! [server]
//! bind_address = "127.0.0.1:8080"
//! max_connections = 1000
//!
//! [upstream]
//! timeout_threshold = 3
//! timeout_window_secs = 60
//!
//! [logging]
//! level = "info"
//! json_format = false
//! ```

use bridge_server::health::TimeoutMonitorConfig;
use bridge_server::ServerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

fn default_max_connections() -> usize {
    1000
}

fn default_timeout_threshold() -> u32 {
    3
}

fn default_timeout_window_secs() -> u64 {
    60
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Websocket listener settings
    pub server: ServerSettings,
    /// Upstream health settings
    #[serde(default)]
    pub upstream: UpstreamSettings,
    /// Logging configuration settings
    pub logging: LoggingSettings,
}

/// Websocket listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Network address to bind the listener to (e.g., "127.0.0.1:8080")
    pub bind_address: String,
    /// Maximum number of concurrent client connections
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

/// Thresholds for forcing an upstream reconnect.
///
/// When `timeout_threshold` possible timeouts are reported within
/// `timeout_window_secs`, the bridge asks the upstream to reconnect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamSettings {
    #[serde(default = "default_timeout_threshold")]
    pub timeout_threshold: u32,
    #[serde(default = "default_timeout_window_secs")]
    pub timeout_window_secs: u64,
}

/// Logging configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to emit JSON instead of human-readable lines
    #[serde(default)]
    pub json_format: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            timeout_threshold: default_timeout_threshold(),
            timeout_window_secs: default_timeout_window_secs(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, a default configuration file is written to
    /// `path` and the defaults are returned.
    pub async fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Converts the application configuration to a bridge server configuration.
    pub fn to_server_config(&self) -> Result<ServerConfig, Box<dyn std::error::Error>> {
        Ok(ServerConfig {
            bind_address: self.server.bind_address.parse()?,
            max_connections: self.server.max_connections,
            timeout_monitor: TimeoutMonitorConfig {
                threshold: self.upstream.timeout_threshold,
                window: Duration::from_secs(self.upstream.timeout_window_secs),
            },
        })
    }

    /// Validates the configuration for consistency and correctness.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration is valid, or an error string describing the issue.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(format!(
                "Invalid bind address: {}",
                &self.server.bind_address
            ));
        }

        if self.server.max_connections == 0 {
            return Err("server.max_connections must be greater than 0".to_string());
        }

        if self.upstream.timeout_threshold == 0 {
            return Err("upstream.timeout_threshold must be greater than 0".to_string());
        }

        if self.upstream.timeout_window_secs == 0 {
            return Err("upstream.timeout_window_secs must be greater than 0".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}
