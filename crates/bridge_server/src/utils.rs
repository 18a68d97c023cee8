//! Factory functions for bridge servers.

use crate::{config::ServerConfig, server::BridgeServer, upstream::UpstreamHandle};
use std::sync::Arc;

/// Creates a new bridge server with default configuration.
///
/// # Example
///
/// ```rust
/// use bridge_server::{create_server, UpstreamHandle};
/// use std::sync::Arc;
///
/// fn build(upstream: Arc<dyn UpstreamHandle>) {
///     let server = create_server(upstream);
///     assert_eq!(server.config().max_connections, 1000);
/// }
/// ```
pub fn create_server(upstream: Arc<dyn UpstreamHandle>) -> BridgeServer {
    BridgeServer::new(ServerConfig::default(), upstream)
}

/// Creates a new bridge server with custom configuration.
///
/// # Example
///
/// ```rust
/// use bridge_server::{create_server_with_config, ServerConfig, UpstreamHandle};
/// use std::sync::Arc;
///
/// fn build(upstream: Arc<dyn UpstreamHandle>) {
///     let config = ServerConfig {
///         bind_address: "0.0.0.0:9000".parse().unwrap(),
///         max_connections: 50,
///         ..Default::default()
///     };
///
///     let server = create_server_with_config(config, upstream);
/// }
/// ```
pub fn create_server_with_config(
    config: ServerConfig,
    upstream: Arc<dyn UpstreamHandle>,
) -> BridgeServer {
    BridgeServer::new(config, upstream)
}
