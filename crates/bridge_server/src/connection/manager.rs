//! Connection manager for tracking and managing client connections.
//!
//! This module provides the central registry of connected clients and the
//! delivery paths into their outbound queues.

use super::{client::ClientConnection, ConnectionId};
use crate::error::ServerError;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

/// Central manager for all client connections.
///
/// The `ConnectionManager` tracks active connections, assigns unique IDs and
/// delivers outbound text to one or all clients. It uses async-safe data
/// structures to handle concurrent access from multiple connection handlers.
///
/// # Architecture
///
/// * Uses `RwLock<HashMap>` for thread-safe connection storage
/// * Implements atomic connection ID generation
/// * Each connection owns an unbounded queue drained by its writer task
#[derive(Debug)]
pub struct ConnectionManager {
    /// Map of connection ID to client connection information
    connections: Arc<RwLock<HashMap<ConnectionId, ClientConnection>>>,

    /// Atomic counter for generating unique connection IDs
    next_id: Arc<AtomicUsize>,
}

impl ConnectionManager {
    /// Creates a new connection manager.
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicUsize::new(1)),
        }
    }

    /// Adds a new connection and returns its unique ID.
    ///
    /// # Arguments
    ///
    /// * `remote_addr` - The network address of the connecting client
    ///
    /// # Returns
    ///
    /// The `ConnectionId` assigned to this connection and the receiver of its
    /// outbound queue.
    pub async fn add_connection(
        &self,
        remote_addr: SocketAddr,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let connection_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (connection, outbound) = ClientConnection::new(remote_addr);
        self.connections
            .write()
            .await
            .insert(connection_id, connection);
        info!("🔗 Connection {} from {}", connection_id, remote_addr);
        (connection_id, outbound)
    }

    /// Removes a connection from the manager.
    ///
    /// Dropping the entry closes the outbound queue, which ends the
    /// connection's writer task.
    ///
    /// # Returns
    ///
    /// `true` if the connection was still registered.
    pub async fn remove_connection(&self, connection_id: ConnectionId) -> bool {
        let mut connections = self.connections.write().await;
        match connections.remove(&connection_id) {
            Some(connection) => {
                let duration = connection.connected_at.elapsed().unwrap_or_default();
                info!(
                    "❌ Connection {} from {} disconnected after {:?}",
                    connection_id, connection.remote_addr, duration
                );
                true
            }
            None => false,
        }
    }

    /// Sends a message to a specific connection.
    ///
    /// # Arguments
    ///
    /// * `connection_id` - The target connection
    /// * `message` - The text to deliver
    pub async fn send_to_connection(
        &self,
        connection_id: ConnectionId,
        message: String,
    ) -> Result<(), ServerError> {
        let connections = self.connections.read().await;
        let connection = connections.get(&connection_id).ok_or_else(|| {
            ServerError::Internal(format!("Connection {connection_id} not found"))
        })?;

        connection.send(message).map_err(|_| {
            ServerError::Network(format!("Connection {connection_id} is closing"))
        })
    }

    /// Broadcasts a message to all currently connected clients.
    ///
    /// Only the clients registered at the moment of the call are addressed. A
    /// client whose queue is already closed is logged and skipped.
    ///
    /// # Returns
    ///
    /// The number of connections the message was queued for.
    pub async fn broadcast_to_all(&self, message: &str) -> usize {
        let connections = self.connections.read().await;
        let mut delivered = 0;

        for (connection_id, connection) in connections.iter() {
            match connection.send(message.to_string()) {
                Ok(()) => delivered += 1,
                Err(_) => warn!(
                    "⚠️ Failed to queue broadcast for connection {}, skipping",
                    connection_id
                ),
            }
        }

        debug!(
            "📡 Broadcasted message to {}/{} connections",
            delivered,
            connections.len()
        );
        delivered
    }

    /// Number of currently registered connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// IDs of all currently registered connections.
    pub async fn connection_ids(&self) -> Vec<ConnectionId> {
        self.connections.read().await.keys().copied().collect()
    }

    /// Remote address of a connection, if it is still registered.
    pub async fn remote_addr(&self, connection_id: ConnectionId) -> Option<SocketAddr> {
        self.connections
            .read()
            .await
            .get(&connection_id)
            .map(|connection| connection.remote_addr)
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[tokio::test]
    async fn test_ids_are_unique_and_removal_closes_queue() {
        let manager = ConnectionManager::new();
        let (first, mut first_rx) = manager.add_connection(addr(4000)).await;
        let (second, _second_rx) = manager.add_connection(addr(4001)).await;

        assert_ne!(first, second);
        assert_eq!(manager.connection_count().await, 2);
        assert_eq!(manager.remote_addr(first).await, Some(addr(4000)));

        assert!(manager.remove_connection(first).await);
        assert!(!manager.remove_connection(first).await);
        assert_eq!(first_rx.recv().await, None);
        assert_eq!(manager.connection_ids().await, vec![second]);
    }

    #[tokio::test]
    async fn test_broadcast_skips_closed_queues() {
        let manager = ConnectionManager::new();
        let (_live, mut live_rx) = manager.add_connection(addr(4000)).await;
        let (_gone, gone_rx) = manager.add_connection(addr(4001)).await;
        drop(gone_rx);

        let delivered = manager.broadcast_to_all("hello").await;

        assert_eq!(delivered, 1);
        assert_eq!(live_rx.recv().await.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_send_to_unknown_connection_fails() {
        let manager = ConnectionManager::new();
        let (id, mut rx) = manager.add_connection(addr(4000)).await;

        manager.send_to_connection(id, "direct".to_string()).await.unwrap();
        assert_eq!(rx.recv().await.as_deref(), Some("direct"));

        let result = manager.send_to_connection(id + 100, "lost".to_string()).await;
        assert!(matches!(result, Err(ServerError::Internal(_))));
    }
}
