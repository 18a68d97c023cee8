//! Contract for the upstream RCON connection.
//!
//! The bridge never owns the transport to the game server. It is handed an
//! already-connected [`UpstreamHandle`] and only ever sends commands through
//! it, asks it to reconnect, and feeds it diagnostics. Connection state is
//! owned by the handle and observed through [`UpstreamHandle::connection_states`].

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::broadcast;

/// Failure reported by the upstream handle for a single command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    /// The handle has no live connection to send on
    #[error("Upstream not connected")]
    NotConnected,

    /// No response arrived within the transport's deadline
    #[error("Upstream command timed out after {0:?}")]
    Timeout(Duration),

    /// Socket-level failure while writing or reading
    #[error("Upstream transport error: {0}")]
    Transport(String),

    /// The server answered with something the protocol layer rejected
    #[error("Upstream protocol error: {0}")]
    Protocol(String),
}

/// A single logical connection to the managed server process.
///
/// Implementations must tolerate concurrent [`send`](UpstreamHandle::send)
/// calls: forwarded client commands and the shutdown sequence share one
/// handle and are not serialized by the bridge.
#[async_trait]
pub trait UpstreamHandle: Send + Sync + 'static {
    /// Sends one raw command and returns the server's response text.
    async fn send(&self, command: &str) -> Result<String, UpstreamError>;

    /// Drops the current connection and starts establishing a new one.
    ///
    /// Returns as soon as the reconnect has been triggered; completion is
    /// signalled through [`connection_states`](UpstreamHandle::connection_states).
    fn force_reconnect(&self);

    /// Records that a send failed in a way that may indicate a dead link.
    ///
    /// `label` is a short diagnostic tag and never contains command arguments.
    fn report_possible_timeout(&self, error: &UpstreamError, label: &str);

    /// Subscribes to connection state transitions (`true` = connected).
    ///
    /// Every report is delivered, including repeats of the current state.
    fn connection_states(&self) -> broadcast::Receiver<bool>;
}
