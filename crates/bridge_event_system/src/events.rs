//! # Event Traits and Bridge Events
//!
//! This module defines the event infrastructure of the bridge: the [`Event`]
//! trait, the closed set of [`EventTopic`]s events are published under, the
//! handler abstraction, and every event type that travels over the bus.
//!
//! ## Event Topics
//!
//! Topics are an enumerated tag rather than free-form strings. Each event type
//! names exactly one topic through [`Event::TOPIC`], so a subscription for an
//! event type can never be registered under the wrong key.
//!
//! - [`EventTopic::ClientMessage`] - raw text received from a websocket client
//! - [`EventTopic::ClientDisconnected`] - a websocket client went away
//! - [`EventTopic::RconConnectionChange`] - the upstream RCON link changed state

use crate::types::ConnectionId;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt::{self, Debug};

// ============================================================================
// Topics
// ============================================================================

/// The fixed set of topics carried by the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// A text payload arrived from a connected client.
    ClientMessage,
    /// A client connection was closed and removed from the pool.
    ClientDisconnected,
    /// The upstream RCON connection reported a new connection state.
    RconConnectionChange,
}

impl EventTopic {
    /// Wire name of the topic.
    ///
    /// This is the value clients see in the `type` field of outbound status
    /// messages, so it must stay stable.
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventTopic::ClientMessage => "socket::message",
            EventTopic::ClientDisconnected => "socket::disconnected",
            EventTopic::RconConnectionChange => "rcon::connectionChange",
        }
    }
}

impl fmt::Display for EventTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Event Traits and Core Infrastructure
// ============================================================================

/// Core trait that all bus events implement.
///
/// Events are serialized once per emission and the same buffer is handed to
/// every subscriber, so an event type only needs serde support and a topic.
///
/// # Examples
///
/// ```rust
/// use bridge_event_system::{Event, EventTopic};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct Heartbeat {
///     connected: bool,
/// }
///
/// impl Event for Heartbeat {
///     const TOPIC: EventTopic = EventTopic::RconConnectionChange;
/// }
/// ```
pub trait Event: Serialize + DeserializeOwned + Send + Sync + Debug + 'static {
    /// Topic this event type is published under.
    const TOPIC: EventTopic;

    /// Returns the type name of this event for debugging.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Serializes the event to the bytes delivered to subscribers.
    fn to_bytes(&self) -> Result<Vec<u8>, EventError> {
        serde_json::to_vec(self).map_err(|e| {
            tracing::error!(
                "🔴 Event serialization failed for type '{}': {} (event debug: {:?})",
                Self::type_name(),
                e,
                self
            );
            EventError::Serialization(e)
        })
    }

    /// Rebuilds an event from bytes produced by [`Event::to_bytes`].
    fn from_bytes(data: &[u8]) -> Result<Self, EventError> {
        serde_json::from_slice(data).map_err(|e| {
            let data_preview = if data.len() > 200 {
                format!(
                    "{}... (truncated {} bytes)",
                    String::from_utf8_lossy(&data[..200]),
                    data.len() - 200
                )
            } else {
                String::from_utf8_lossy(data).to_string()
            };

            tracing::error!(
                "🔴 Event deserialization failed for type '{}': {} (content preview: '{}')",
                Self::type_name(),
                e,
                data_preview
            );
            EventError::Deserialization(e)
        })
    }
}

/// Handler trait for processing events.
///
/// Handlers run inline on the emitting task and therefore must return
/// quickly. Anything that needs to await is spawned by the handler itself.
pub trait EventHandler: Send + Sync + 'static + Debug {
    /// Handles an event from serialized data.
    fn handle(&self, data: &[u8]) -> Result<(), EventError>;

    /// Returns a human-readable name for this handler for debugging.
    fn handler_name(&self) -> &str;
}

/// Type-safe wrapper binding a closure to one event type.
pub struct TypedEventHandler<T, F>
where
    T: Event,
    F: Fn(T) -> Result<(), EventError> + Send + Sync,
{
    handler: F,
    name: String,
    _phantom: std::marker::PhantomData<fn(T)>,
}

impl<T, F> Debug for TypedEventHandler<T, F>
where
    T: Event,
    F: Fn(T) -> Result<(), EventError> + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedEventHandler")
            .field("name", &self.name)
            .finish()
    }
}

impl<T, F> TypedEventHandler<T, F>
where
    T: Event,
    F: Fn(T) -> Result<(), EventError> + Send + Sync,
{
    /// Creates a new typed event handler.
    ///
    /// # Arguments
    ///
    /// * `name` - Human-readable name for debugging
    /// * `handler` - Function to handle events of type T
    pub fn new(name: String, handler: F) -> Self {
        Self {
            handler,
            name,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T, F> EventHandler for TypedEventHandler<T, F>
where
    T: Event,
    F: Fn(T) -> Result<(), EventError> + Send + Sync + 'static,
{
    fn handle(&self, data: &[u8]) -> Result<(), EventError> {
        let event = T::from_bytes(data)?;
        (self.handler)(event)
    }

    fn handler_name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Bridge Events
// ============================================================================

/// A raw text message received from a websocket client.
///
/// The payload is untouched; classification into game or system commands is
/// the job of whoever subscribes to [`EventTopic::ClientMessage`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientMessageEvent {
    /// Connection the message arrived on
    pub connection_id: ConnectionId,
    /// Message text exactly as received
    pub payload: String,
    /// Unix timestamp (seconds) of receipt
    pub timestamp: u64,
}

impl Event for ClientMessageEvent {
    const TOPIC: EventTopic = EventTopic::ClientMessage;
}

/// Emitted once a client connection has been removed from the pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientDisconnectedEvent {
    pub connection_id: ConnectionId,
    pub timestamp: u64,
}

impl Event for ClientDisconnectedEvent {
    const TOPIC: EventTopic = EventTopic::ClientDisconnected;
}

/// Emitted whenever the upstream RCON link reports a connection state.
///
/// Repeated reports of the same state are separate events; nothing upstream
/// of the bus deduplicates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RconConnectionChangeEvent {
    /// `true` when the upstream link is usable
    pub is_connected: bool,
    pub timestamp: u64,
}

impl Event for RconConnectionChangeEvent {
    const TOPIC: EventTopic = EventTopic::RconConnectionChange;
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during event system operations.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// Serialization failed when converting event to bytes
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Deserialization failed when converting bytes to event
    #[error("Deserialization error: {0}")]
    Deserialization(serde_json::Error),
    /// Handler execution failed during event processing
    #[error("Handler execution error: {0}")]
    HandlerExecution(String),
    /// Handler panicked while processing an event
    #[error("Handler panicked: {0}")]
    HandlerPanicked(String),
}
