/// Event handler registration methods
use crate::events::{Event, EventError, EventHandler, TypedEventHandler};
use super::core::EventSystem;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

impl EventSystem {
    /// Registers a handler for events of type `T`.
    ///
    /// The handler is invoked on the emitting task. It must not block: work
    /// that needs to await belongs in a task spawned from inside the handler.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bridge_event_system::{EventSystem, RconConnectionChangeEvent};
    ///
    /// let events = EventSystem::new();
    /// events.on(|event: RconConnectionChangeEvent| {
    ///     println!("upstream connected: {}", event.is_connected);
    ///     Ok(())
    /// }).expect("registration");
    /// ```
    pub fn on<T, F>(&self, handler: F) -> Result<(), EventError>
    where
        T: Event,
        F: Fn(T) -> Result<(), EventError> + Send + Sync + 'static,
    {
        let handler_name = format!("{}::{}", T::TOPIC, T::type_name());
        let typed_handler = TypedEventHandler::new(handler_name, handler);
        let handler_arc: Arc<dyn EventHandler> = Arc::new(typed_handler);

        self.handlers
            .entry(T::TOPIC)
            .or_insert_with(Vec::new)
            .push(handler_arc);

        self.stats.total_handlers.fetch_add(1, Ordering::Relaxed);

        info!("📝 Registered handler for {}", T::TOPIC);
        Ok(())
    }
}
