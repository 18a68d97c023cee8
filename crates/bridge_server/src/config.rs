//! Server configuration types and defaults.
//!
//! This module contains the configuration handed to [`BridgeServer`](crate::BridgeServer)
//! at construction time. The application crate builds it from its TOML file
//! and command line.

use crate::health::TimeoutMonitorConfig;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};

/// Configuration structure for the bridge server.
///
/// Contains the websocket listener settings and the thresholds used to decide
/// when repeated upstream failures warrant a forced reconnect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The socket address the websocket listener binds to
    pub bind_address: SocketAddr,

    /// Maximum number of concurrent client connections allowed
    pub max_connections: usize,

    /// Upstream timeout monitoring thresholds
    pub timeout_monitor: TimeoutMonitorConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            max_connections: 1000,
            timeout_monitor: TimeoutMonitorConfig::default(),
        }
    }
}
