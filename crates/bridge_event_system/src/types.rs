//! # Core Type Definitions
//!
//! Identifier types shared between the event bus and the crates publishing
//! onto it.

/// Identifier of a single client connection.
///
/// Connection IDs are assigned by the connection pool when a websocket is
/// accepted and stay unique for the lifetime of the process.
pub type ConnectionId = usize;
