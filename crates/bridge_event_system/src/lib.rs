//! # Bridge Event System
//!
//! The in-process event bus that decouples the websocket client pool and the
//! upstream RCON connection from the command bridge.
//!
//! ## Core Features
//!
//! - **Typed Topics**: every event type names its [`EventTopic`]; subscribing
//!   is keyed by type, never by string
//! - **Isolated Handlers**: a failing or panicking subscriber is logged and
//!   counted, the emitter and the other subscribers carry on
//! - **Non-blocking Dispatch**: handlers run inline and hand async work to the
//!   tokio runtime, so emission never waits on command execution
//! - **Shutdown Coordination**: [`ShutdownState`] for process-level graceful
//!   stop
//!
//! ## Quick Start Example
//!
//! ```rust
//! use bridge_event_system::*;
//!
//! let events = create_event_system();
//!
//! events.on(|event: ClientMessageEvent| {
//!     println!("client {} sent {}", event.connection_id, event.payload);
//!     Ok(())
//! }).expect("registration");
//!
//! events.emit(&ClientMessageEvent {
//!     connection_id: 1,
//!     payload: "sysCommand::reconnect".to_string(),
//!     timestamp: current_timestamp(),
//! }).expect("emission");
//! ```

pub mod events;
pub mod shutdown;
pub mod system;
pub mod types;
pub mod utils;

pub use events::{
    ClientDisconnectedEvent, ClientMessageEvent, Event, EventError, EventHandler, EventTopic,
    RconConnectionChangeEvent, TypedEventHandler,
};
pub use shutdown::ShutdownState;
pub use system::{EventSystem, EventSystemStats};
pub use types::ConnectionId;
pub use utils::{create_event_system, current_timestamp};
