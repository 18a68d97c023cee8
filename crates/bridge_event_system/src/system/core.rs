/// Core EventSystem implementation
use crate::events::{EventHandler, EventTopic};
use super::stats::{EventSystemStats, StatsCounters};
use dashmap::DashMap;
use std::sync::Arc;

/// The in-process publish/subscribe hub of the bridge.
///
/// Subscriptions are registered once at startup per event type; the topic is
/// taken from the event type itself, so there is no string key to mistype.
/// Emission runs every subscriber inline, in registration order, and isolates
/// subscribers from each other: an error or panic in one handler is logged
/// and counted but never reaches the emitter or the remaining handlers.
///
/// Uses DashMap so registration and emission never contend on a global lock.
pub struct EventSystem {
    /// Map of topics to their registered handlers
    pub(super) handlers: DashMap<EventTopic, Vec<Arc<dyn EventHandler>>>,
    /// Counters for monitoring
    pub(super) stats: StatsCounters,
}

impl std::fmt::Debug for EventSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSystem")
            .field("topics", &self.handlers.len())
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

impl EventSystem {
    /// Creates a new event system with no registered handlers.
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
            stats: StatsCounters::default(),
        }
    }

    /// Gets the current event system statistics
    #[inline]
    pub fn get_stats(&self) -> EventSystemStats {
        self.stats.snapshot()
    }

    /// Number of handlers subscribed to `topic`.
    pub fn handler_count(&self, topic: EventTopic) -> usize {
        self.handlers.get(&topic).map(|entry| entry.len()).unwrap_or(0)
    }
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new()
    }
}
