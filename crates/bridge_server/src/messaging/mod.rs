//! Inbound client message handling.
//!
//! This module classifies the raw text clients send and dispatches the result
//! to the upstream connection, the reconnect trigger or the shutdown
//! orchestrator.

pub mod proxy;
pub mod router;
pub mod types;

pub use proxy::CommandProxy;
pub use router::{classify_message, timeout_label};
pub use types::{CommandEnvelope, CommandOutcome, SystemCommand};
