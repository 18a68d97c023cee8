/// Statistics tracking for the event system
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Snapshot of event system statistics for monitoring
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct EventSystemStats {
    /// Total number of registered event handlers
    pub total_handlers: usize,
    /// Total number of events emitted since system start
    pub events_emitted: u64,
    /// Emissions that found no subscriber for their topic
    pub events_unhandled: u64,
    /// Handler invocations that returned an error or panicked
    pub handler_failures: u64,
}

/// Live counters behind [`EventSystemStats`].
#[derive(Debug, Default)]
pub(super) struct StatsCounters {
    pub(super) total_handlers: AtomicUsize,
    pub(super) events_emitted: AtomicU64,
    pub(super) events_unhandled: AtomicU64,
    pub(super) handler_failures: AtomicU64,
}

impl StatsCounters {
    pub(super) fn snapshot(&self) -> EventSystemStats {
        EventSystemStats {
            total_handlers: self.total_handlers.load(Ordering::Relaxed),
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
            events_unhandled: self.events_unhandled.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
        }
    }
}
