//! Core server implementation and connection handling.
//!
//! This module contains the bridge server structure and the logic for
//! handling websocket clients and the server lifecycle.

pub mod core;
pub mod handlers;

pub use core::BridgeServer;
