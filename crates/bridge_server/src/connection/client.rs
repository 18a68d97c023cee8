//! Client connection representation.

use std::net::SocketAddr;
use std::time::SystemTime;
use tokio::sync::mpsc;

/// Represents an individual client connection to the bridge.
///
/// # Fields
///
/// * `remote_addr` - The network address of the connected client
/// * `connected_at` - Timestamp when the connection was established
/// * `outbound` - Queue drained by the connection's websocket writer task
#[derive(Debug)]
pub struct ClientConnection {
    /// The remote network address of the client
    pub remote_addr: SocketAddr,

    /// When this connection was established
    pub connected_at: SystemTime,

    outbound: mpsc::UnboundedSender<String>,
}

impl ClientConnection {
    /// Creates a new client connection and the receiving end of its queue.
    ///
    /// # Arguments
    ///
    /// * `remote_addr` - The network address of the connecting client
    ///
    /// # Returns
    ///
    /// The connection and the receiver its writer task should drain.
    pub fn new(remote_addr: SocketAddr) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (outbound, receiver) = mpsc::unbounded_channel();
        let connection = Self {
            remote_addr,
            connected_at: SystemTime::now(),
            outbound,
        };
        (connection, receiver)
    }

    /// Queues a text frame for this client.
    ///
    /// Fails only when the writer task has already gone away.
    pub fn send(&self, message: String) -> Result<(), mpsc::error::SendError<String>> {
        self.outbound.send(message)
    }
}
