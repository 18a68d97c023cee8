//! Fan-out of upstream connection state to every client.
//!
//! Each state report becomes one [`StatusMessage`], serialized once and
//! queued for every client connected at that moment. Reports are broadcast in
//! the order they were emitted; repeats are not collapsed.

use crate::connection::ConnectionManager;
use crate::error::ServerError;
use bridge_event_system::{EventError, EventSystem, EventTopic, RconConnectionChangeEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Outbound status frame: `{"type": "rcon::connectionChange", "payload": true}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: bool,
}

impl StatusMessage {
    pub fn connection_change(is_connected: bool) -> Self {
        Self {
            kind: EventTopic::RconConnectionChange.as_str().to_string(),
            payload: is_connected,
        }
    }
}

/// Broadcasts upstream connection state changes to all clients.
#[derive(Debug, Clone)]
pub struct StatusBroadcaster {
    connection_manager: Arc<ConnectionManager>,
}

impl StatusBroadcaster {
    pub fn new(connection_manager: Arc<ConnectionManager>) -> Self {
        Self { connection_manager }
    }

    /// Subscribes to connection state events and starts the broadcast worker.
    ///
    /// The bus handler only queues the state; a single worker task performs
    /// the broadcasts one after another so clients see states in emission
    /// order.
    pub fn start(&self, events: &EventSystem) -> Result<JoinHandle<()>, EventError> {
        let (states, mut pending) = mpsc::unbounded_channel::<bool>();

        events.on(move |event: RconConnectionChangeEvent| {
            states.send(event.is_connected).map_err(|_| {
                EventError::HandlerExecution("status broadcaster has stopped".to_string())
            })
        })?;

        let broadcaster = self.clone();
        Ok(tokio::spawn(async move {
            while let Some(is_connected) = pending.recv().await {
                if let Err(e) = broadcaster.broadcast_status(is_connected).await {
                    error!("❌ Failed to broadcast connection status: {}", e);
                }
            }
            debug!("Status broadcaster stopped");
        }))
    }

    /// Sends the given state to every currently connected client.
    ///
    /// # Returns
    ///
    /// The number of clients the status was queued for.
    pub async fn broadcast_status(&self, is_connected: bool) -> Result<usize, ServerError> {
        let message = serde_json::to_string(&StatusMessage::connection_change(is_connected))
            .map_err(|e| ServerError::Internal(format!("Failed to serialize status: {e}")))?;

        let delivered = self.connection_manager.broadcast_to_all(&message).await;
        info!(
            "📡 Upstream {} - notified {} clients",
            if is_connected { "connected" } else { "disconnected" },
            delivered
        );
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_event_system::current_timestamp;
    use std::net::SocketAddr;
    use std::time::Duration;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn test_status_message_wire_format() {
        let text = serde_json::to_string(&StatusMessage::connection_change(false)).unwrap();
        assert_eq!(text, r#"{"type":"rcon::connectionChange","payload":false}"#);
    }

    #[tokio::test]
    async fn test_only_current_clients_receive_status() {
        let manager = Arc::new(ConnectionManager::new());
        let broadcaster = StatusBroadcaster::new(manager.clone());
        let (_a, mut a_rx) = manager.add_connection(addr(5000)).await;
        let (_b, mut b_rx) = manager.add_connection(addr(5001)).await;

        assert_eq!(broadcaster.broadcast_status(false).await.unwrap(), 2);
        let (_late, mut late_rx) = manager.add_connection(addr(5002)).await;

        let expected = r#"{"type":"rcon::connectionChange","payload":false}"#;
        assert_eq!(a_rx.recv().await.as_deref(), Some(expected));
        assert_eq!(b_rx.recv().await.as_deref(), Some(expected));
        assert!(late_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_bus_states_arrive_in_order() {
        let manager = Arc::new(ConnectionManager::new());
        let events = EventSystem::new();
        let broadcaster = StatusBroadcaster::new(manager.clone());
        broadcaster.start(&events).unwrap();
        let (_client, mut rx) = manager.add_connection(addr(5000)).await;

        for is_connected in [false, false, true] {
            events
                .emit(&RconConnectionChangeEvent {
                    is_connected,
                    timestamp: current_timestamp(),
                })
                .unwrap();
        }

        let mut received = Vec::new();
        for _ in 0..3 {
            let text = tokio::time::timeout(Duration::from_secs(1), rx.recv())
                .await
                .expect("status should arrive")
                .expect("queue open");
            let message: StatusMessage = serde_json::from_str(&text).unwrap();
            received.push(message.payload);
        }
        assert_eq!(received, vec![false, false, true]);
    }
}
