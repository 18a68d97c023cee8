//! Core bridge server implementation.
//!
//! This module contains the `BridgeServer` struct, which wires the websocket
//! client pool, the event bus, the command proxy, the shutdown orchestrator
//! and the status broadcaster around one upstream connection.

use crate::{
    config::ServerConfig,
    connection::ConnectionManager,
    error::ServerError,
    health::MonitoredUpstream,
    messaging::CommandProxy,
    server::handlers::{handle_connection, reject_connection, relay_connection_states},
    shutdown::{ShutdownOrchestrator, ShutdownPhase},
    status::StatusBroadcaster,
    upstream::UpstreamHandle,
};
use bridge_event_system::{EventSystem, EventSystemStats, ShutdownState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use std::io;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Pause after an accept failure that is not tied to a single peer.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// The bridge server.
///
/// `BridgeServer` owns every component between the websocket clients and the
/// upstream RCON handle.
///
/// # Architecture
///
/// * **Event System**: carries inbound messages, disconnects and upstream
///   connection state between components
/// * **Connection Management**: websocket connection lifecycle
/// * **Command Proxy**: classifies client text and executes it per client
/// * **Shutdown Orchestrator**: timed warn, save and exit sequence
/// * **Status Broadcaster**: pushes upstream state to every client
///
/// The upstream handle is wrapped in a [`MonitoredUpstream`] so repeated
/// possible timeouts lead to a forced reconnect.
pub struct BridgeServer {
    /// Server configuration settings
    config: ServerConfig,

    event_system: Arc<EventSystem>,

    connection_manager: Arc<ConnectionManager>,

    upstream: Arc<MonitoredUpstream>,

    proxy: Arc<CommandProxy>,

    orchestrator: ShutdownOrchestrator,

    status: StatusBroadcaster,

    /// Set once bus handlers have been registered
    handlers_registered: AtomicBool,

    /// Channel for coordinating server shutdown
    shutdown_sender: broadcast::Sender<()>,
}

impl BridgeServer {
    /// Creates a new bridge server.
    ///
    /// # Arguments
    ///
    /// * `config` - Configuration parameters for server behavior
    /// * `upstream` - Connected handle to the managed server's RCON port
    pub fn new(config: ServerConfig, upstream: Arc<dyn UpstreamHandle>) -> Self {
        let event_system = Arc::new(EventSystem::new());
        let connection_manager = Arc::new(ConnectionManager::new());
        let (shutdown_sender, _) = broadcast::channel(1);

        let upstream = Arc::new(MonitoredUpstream::new(
            upstream,
            config.timeout_monitor.clone(),
        ));
        let shared_upstream: Arc<dyn UpstreamHandle> = upstream.clone();
        let orchestrator = ShutdownOrchestrator::new(shared_upstream.clone());
        let proxy = Arc::new(CommandProxy::new(shared_upstream, orchestrator.clone()));
        let status = StatusBroadcaster::new(connection_manager.clone());

        Self {
            config,
            event_system,
            connection_manager,
            upstream,
            proxy,
            orchestrator,
            status,
            handlers_registered: AtomicBool::new(false),
            shutdown_sender,
        }
    }

    /// Starts the server and runs until the shutdown state is initiated.
    ///
    /// # Arguments
    ///
    /// * `shutdown_state` - Shared shutdown state for coordinating graceful shutdown
    pub async fn start_with_shutdown_state(
        &self,
        shutdown_state: ShutdownState,
    ) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener, Some(shutdown_state)).await
    }

    /// Starts the server and runs until [`BridgeServer::shutdown`] is called.
    pub async fn start(&self) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener, None).await
    }

    /// Runs the bridge on an already bound listener.
    ///
    /// # Startup Sequence
    ///
    /// 1. Register the proxy and status broadcaster on the bus
    /// 2. Relay upstream connection state onto the bus
    /// 3. Accept clients until shutdown is requested
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown_state: Option<ShutdownState>,
    ) -> Result<(), ServerError> {
        self.register_handlers()?;

        let relay = relay_connection_states(
            self.upstream.connection_states(),
            self.event_system.clone(),
        );

        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Network(format!("Failed to read local address: {e}")))?;
        info!("🌐 Bridge listening on ws://{}", local_addr);

        let mut shutdown_receiver = self.shutdown_sender.subscribe();
        let wait_for_shutdown = async {
            match &shutdown_state {
                Some(shutdown_state) => shutdown_state.wait_for_shutdown().await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(wait_for_shutdown);

        loop {
            tokio::select! {
                _ = &mut wait_for_shutdown => {
                    info!("🛑 Accept loop stopping - shutdown initiated");
                    break;
                }
                _ = shutdown_receiver.recv() => {
                    info!("Internal shutdown signal received");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => self.dispatch_connection(stream, addr).await,
                    Err(e) => match accept_backoff(&e) {
                        None => debug!("Dropped connection during accept: {}", e),
                        Some(delay) => {
                            warn!("⚠️ Failed to accept connection: {}, retrying in {:?}", e, delay);
                            tokio::time::sleep(delay).await;
                        }
                    },
                },
            }
        }

        info!("🧹 Performing server cleanup...");
        relay.abort();
        info!("✅ Server cleanup completed");
        Ok(())
    }

    /// Signals the accept loop to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_sender.send(());
    }

    pub fn get_event_system(&self) -> Arc<EventSystem> {
        self.event_system.clone()
    }

    pub fn get_connection_manager(&self) -> Arc<ConnectionManager> {
        self.connection_manager.clone()
    }

    pub fn get_command_proxy(&self) -> Arc<CommandProxy> {
        self.proxy.clone()
    }

    pub fn get_upstream(&self) -> Arc<MonitoredUpstream> {
        self.upstream.clone()
    }

    /// Current phase of the in-game shutdown sequence.
    pub fn shutdown_phase(&self) -> ShutdownPhase {
        self.orchestrator.phase()
    }

    pub fn get_event_stats(&self) -> EventSystemStats {
        self.event_system.get_stats()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    async fn bind(&self) -> Result<TcpListener, ServerError> {
        TcpListener::bind(self.config.bind_address)
            .await
            .map_err(|e| {
                ServerError::Network(format!(
                    "Failed to bind {}: {e}",
                    self.config.bind_address
                ))
            })
    }

    /// Registers the bridge's bus handlers once per server.
    fn register_handlers(&self) -> Result<(), ServerError> {
        if self.handlers_registered.swap(true, Ordering::AcqRel) {
            debug!("Bus handlers already registered");
            return Ok(());
        }

        self.proxy.register(&self.event_system)?;
        let _status_worker = self.status.start(&self.event_system)?;
        info!("📝 Command proxy and status broadcaster registered");
        Ok(())
    }

    async fn dispatch_connection(&self, stream: tokio::net::TcpStream, addr: std::net::SocketAddr) {
        let max_connections = self.config.max_connections;
        if self.connection_manager.connection_count().await >= max_connections {
            tokio::spawn(reject_connection(stream, addr, max_connections));
            return;
        }

        let connection_manager = self.connection_manager.clone();
        let event_system = self.event_system.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, addr, connection_manager, event_system).await {
                error!("Connection error: {:?}", e);
            }
        });
    }
}

impl std::fmt::Debug for BridgeServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeServer")
            .field("config", &self.config)
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}

/// How long the accept loop pauses after `error`.
///
/// Errors caused by one peer are retried at once. Anything else, such as
/// running out of file descriptors, backs off so the loop does not spin
/// while the listener stays open.
fn accept_backoff(error: &io::Error) -> Option<Duration> {
    match error.kind() {
        io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionRefused
        | io::ErrorKind::Interrupted
        | io::ErrorKind::WouldBlock => None,
        _ => Some(ACCEPT_ERROR_BACKOFF),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_backoff_only_for_listener_errors() {
        let peer_reset = io::Error::from(io::ErrorKind::ConnectionReset);
        assert_eq!(accept_backoff(&peer_reset), None);

        let aborted = io::Error::from(io::ErrorKind::ConnectionAborted);
        assert_eq!(accept_backoff(&aborted), None);

        // EMFILE
        let out_of_descriptors = io::Error::from_raw_os_error(24);
        assert_eq!(accept_backoff(&out_of_descriptors), Some(ACCEPT_ERROR_BACKOFF));
    }
}
