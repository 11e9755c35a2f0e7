//! The sink the scheduling engine emits lifecycle events into.

use crate::bus::{EventBus, PlatformEvent};

/// Why an event could not be handed off.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Nobody is listening; the event is lost.
    #[error("no subscribers for event {0}")]
    NoSubscribers(String),

    /// The dispatcher is down or rejected the event.
    #[error("dispatcher unavailable: {0}")]
    Unavailable(String),
}

/// Receives domain events from the engine.
///
/// `notify` must not block: the engine calls it after a write has already
/// been committed, and a failure never rolls that write back.
pub trait NotificationDispatcher: Send + Sync {
    fn notify(&self, event: PlatformEvent) -> Result<(), DispatchError>;
}

impl NotificationDispatcher for EventBus {
    fn notify(&self, event: PlatformEvent) -> Result<(), DispatchError> {
        self.try_publish(event)
            .map(|_| ())
            .map_err(|e| DispatchError::NoSubscribers(e.0.event_type))
    }
}
