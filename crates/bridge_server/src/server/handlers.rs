//! Connection handling logic for websocket clients.
//!
//! This module manages the lifecycle of individual client connections:
//! handshake, publishing inbound text on the bus, draining the outbound queue
//! and cleanup.

use crate::{connection::ConnectionManager, error::ServerError};
use bridge_event_system::{
    current_timestamp, ClientDisconnectedEvent, ClientMessageEvent, ConnectionId, EventSystem,
    RconConnectionChangeEvent,
};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, trace, warn};

/// Handles a single client connection from establishment to cleanup.
///
/// # Connection Flow
///
/// 1. Perform websocket handshake
/// 2. Register connection with the connection manager
/// 3. Start message handling tasks (incoming and outgoing)
/// 4. Handle connection termination and cleanup
/// 5. Emit client disconnected event
///
/// # Arguments
///
/// * `stream` - The TCP stream for the client connection
/// * `addr` - The remote address of the client
/// * `connection_manager` - Manager for tracking connections
/// * `event_system` - Bus inbound messages are published on
///
/// # Message Handling
///
/// * **Incoming Task**: publishes text frames as [`ClientMessageEvent`]s
/// * **Outgoing Task**: writes queued text (status broadcasts) to the client
///
/// These run until the connection is closed or an error occurs.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    connection_manager: Arc<ConnectionManager>,
    event_system: Arc<EventSystem>,
) -> Result<(), ServerError> {
    let ws_stream = accept_async(stream)
        .await
        .map_err(|e| ServerError::Network(format!("WebSocket handshake failed: {e}")))?;

    let (ws_sender, mut ws_receiver) = ws_stream.split();
    let ws_sender = Arc::new(tokio::sync::Mutex::new(ws_sender));
    let (connection_id, mut outbound) = connection_manager.add_connection(addr).await;

    let incoming_task = {
        let ws_sender = ws_sender.clone();
        let event_system = event_system.clone();

        async move {
            while let Some(msg) = ws_receiver.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        publish_message(&event_system, connection_id, text.to_string());
                    }
                    Ok(Message::Binary(data)) => match String::from_utf8(data.to_vec()) {
                        Ok(text) => publish_message(&event_system, connection_id, text),
                        Err(_) => {
                            warn!("⚠️ Dropping non UTF-8 binary frame from connection {}", connection_id);
                        }
                    },
                    Ok(Message::Ping(data)) => {
                        let mut ws_sender = ws_sender.lock().await;
                        let _ = ws_sender.send(Message::Pong(data)).await;
                    }
                    Ok(Message::Close(_)) => {
                        debug!("🔌 Client {} requested close", connection_id);
                        break;
                    }
                    Err(e) => {
                        error!("WebSocket error for connection {}: {}", connection_id, e);
                        break;
                    }
                    _ => {}
                }
            }
        }
    };

    let outgoing_task = {
        let ws_sender = ws_sender.clone();
        async move {
            while let Some(text) = outbound.recv().await {
                let mut ws_sender = ws_sender.lock().await;
                if let Err(e) = ws_sender.send(Message::Text(text.into())).await {
                    error!("Failed to send message to connection {}: {}", connection_id, e);
                    break;
                }
            }
        }
    };

    // Run both tasks concurrently until one completes
    tokio::select! {
        _ = incoming_task => {},
        _ = outgoing_task => {},
    }

    connection_manager.remove_connection(connection_id).await;
    let _ = ws_sender.lock().await.close().await;

    event_system
        .emit(&ClientDisconnectedEvent {
            connection_id,
            timestamp: current_timestamp(),
        })
        .map_err(|e| ServerError::Internal(e.to_string()))?;

    Ok(())
}

/// Completes the handshake only to tell the client the server is full.
pub async fn reject_connection(stream: TcpStream, addr: SocketAddr, max_connections: usize) {
    let mut ws_stream = match accept_async(stream).await {
        Ok(ws_stream) => ws_stream,
        Err(e) => {
            debug!("Handshake with rejected client {} failed: {}", addr, e);
            return;
        }
    };

    warn!(
        "🚫 Rejecting connection from {}: limit of {} connections reached",
        addr, max_connections
    );
    let frame = CloseFrame {
        code: CloseCode::Again,
        reason: "Server is full".to_string().into(),
    };
    if let Err(e) = ws_stream.close(Some(frame)).await {
        trace!("Close to rejected client {} failed: {}", addr, e);
    }
}

/// Forwards upstream connection state reports onto the event bus.
///
/// Runs until the upstream drops its sender.
pub fn relay_connection_states(
    mut states: broadcast::Receiver<bool>,
    event_system: Arc<EventSystem>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match states.recv().await {
                Ok(is_connected) => {
                    let event = RconConnectionChangeEvent {
                        is_connected,
                        timestamp: current_timestamp(),
                    };
                    if let Err(e) = event_system.emit(&event) {
                        error!("❌ Failed to publish upstream state: {}", e);
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!("⚠️ Missed {} upstream connection state reports", missed);
                }
                Err(RecvError::Closed) => {
                    info!("🔌 Upstream connection state channel closed");
                    break;
                }
            }
        }
    })
}

fn publish_message(event_system: &EventSystem, connection_id: ConnectionId, payload: String) {
    let event = ClientMessageEvent {
        connection_id,
        payload,
        timestamp: current_timestamp(),
    };
    if let Err(e) = event_system.emit(&event) {
        trace!("❌ Message publish error: {}", e);
    }
}
