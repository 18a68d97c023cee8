//! # Utility Functions
//!
//! Helpers shared by every crate that publishes onto the bus.

use crate::system::EventSystem;
use std::sync::Arc;

/// Returns the current Unix timestamp in seconds.
///
/// All events use this function for timestamp generation. A clock set before
/// the Unix epoch yields `0` rather than failing.
pub fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Creates a new event system instance ready to be shared across tasks.
pub fn create_event_system() -> Arc<EventSystem> {
    Arc::new(EventSystem::new())
}
