/// Event emission methods
use crate::events::{Event, EventError, EventHandler};
use super::core::EventSystem;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, error, warn};

impl EventSystem {
    /// Emits an event to every handler subscribed to its topic.
    ///
    /// The event is serialized once and the same buffer is handed to each
    /// handler. A failing handler is logged and skipped; emission itself only
    /// fails when the event cannot be serialized.
    ///
    /// # Returns
    ///
    /// The number of handlers that processed the event successfully.
    pub fn emit<T>(&self, event: &T) -> Result<usize, EventError>
    where
        T: Event,
    {
        let data = event.to_bytes()?;

        // Clone the handler list so no map guard is held while handlers run
        let event_handlers: Option<Vec<Arc<dyn EventHandler>>> = self
            .handlers
            .get(&T::TOPIC)
            .map(|entry| entry.value().clone());

        self.stats.events_emitted.fetch_add(1, Ordering::Relaxed);

        let Some(event_handlers) = event_handlers else {
            self.stats.events_unhandled.fetch_add(1, Ordering::Relaxed);
            warn!("⚠️ No handlers for event: {}", T::TOPIC);
            return Ok(0);
        };

        if cfg!(debug_assertions) {
            debug!("📤 Emitting {} to {} handlers", T::TOPIC, event_handlers.len());
        }

        let mut delivered = 0;
        for handler in event_handlers.iter() {
            match catch_unwind(AssertUnwindSafe(|| handler.handle(&data))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    self.stats.handler_failures.fetch_add(1, Ordering::Relaxed);
                    error!("❌ Handler {} failed: {}", handler.handler_name(), e);
                }
                Err(panic) => {
                    self.stats.handler_failures.fetch_add(1, Ordering::Relaxed);
                    let reason = EventError::HandlerPanicked(panic_message(panic.as_ref()));
                    error!("❌ Handler {} failed: {}", handler.handler_name(), reason);
                }
            }
        }

        Ok(delivered)
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
