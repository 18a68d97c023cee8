//! Connection management for websocket clients.
//!
//! This module tracks every connected client together with the queue its
//! writer task drains, so that other components can push text to one client
//! or to all of them without touching the sockets.

pub mod client;
pub mod manager;

pub use bridge_event_system::ConnectionId;
pub use manager::ConnectionManager;
