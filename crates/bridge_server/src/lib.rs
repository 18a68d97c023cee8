//! # Bridge Server
//!
//! Websocket front end for a single ARK RCON connection. Clients send plain
//! text commands; the bridge forwards game commands to the server, runs a
//! small set of its own system commands, and pushes upstream connection state
//! back to every client.
//!
//! ## Message Flow
//!
//! 1. A client sends `arkCommand::<rcon command>` or `sysCommand::<name>`
//! 2. The connection handler publishes the text on the event bus
//! 3. The [`CommandProxy`](messaging::CommandProxy) classifies it and queues
//!    it on the client's lane
//! 4. Game commands go to the upstream; `reconnect` forces an upstream
//!    reconnect; `shutdown` starts the timed shutdown sequence
//! 5. Upstream connection state changes are broadcast to all clients as
//!    `{"type": "rcon::connectionChange", "payload": <bool>}`
//!
//! The upstream transport itself is not part of this crate. Embedders
//! implement [`UpstreamHandle`] for their RCON client and hand it to
//! [`BridgeServer::new`].
//!
//! ## Error Handling
//!
//! Nothing a client sends can fail the server. Unsupported text is logged and
//! dropped, failed forwards are reported to the upstream as possible timeouts,
//! and failed shutdown stages are logged while the sequence carries on.
//! [`ServerError`] covers the server's own plumbing:
//!
//! * **Network errors** - binding, handshakes, closed client queues
//! * **Internal errors** - event bus registration and serialization

pub use config::ServerConfig;
pub use error::ServerError;
pub use server::BridgeServer;
pub use upstream::{UpstreamError, UpstreamHandle};
pub use utils::{create_server, create_server_with_config};

pub mod config;
pub mod connection;
pub mod error;
pub mod health;
pub mod messaging;
pub mod server;
pub mod shutdown;
pub mod status;
pub mod upstream;
pub mod utils;

#[cfg(test)]
mod testing;
mod tests;
