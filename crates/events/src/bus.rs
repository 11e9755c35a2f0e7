//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`PlatformEvent`]s.
//! It is designed to be shared via `Arc<EventBus>` across the application.

use atelier_core::types::{DbId, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Payload key listing the users an event should reach.
pub const PAYLOAD_RECIPIENTS: &str = "recipient_user_ids";

/// Payload key carrying the human-readable notification text.
pub const PAYLOAD_MESSAGE: &str = "message";

// ---------------------------------------------------------------------------
// PlatformEvent
// ---------------------------------------------------------------------------

/// A domain event that occurred on the platform.
///
/// Constructed via [`PlatformEvent::new`] and enriched with the builder
/// methods [`with_source`](PlatformEvent::with_source),
/// [`with_actor`](PlatformEvent::with_actor),
/// [`with_payload`](PlatformEvent::with_payload) and
/// [`with_timestamp`](PlatformEvent::with_timestamp).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// Unique id; consumers use it to drop redeliveries.
    pub event_id: Uuid,

    /// Dot-separated event name, e.g. `"consultation.requested"`.
    pub event_type: String,

    /// Optional source entity kind (e.g. `"consultation"`, `"project"`).
    pub source_entity_type: Option<String>,

    /// Optional source entity database id.
    pub source_entity_id: Option<DbId>,

    /// Optional id of the user that triggered the event.
    pub actor_user_id: Option<DbId>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event occurred (UTC).
    pub timestamp: Timestamp,
}

impl PlatformEvent {
    /// Create a new event with only the required `event_type`.
    ///
    /// All optional fields default to `None` / empty object.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type: event_type.into(),
            source_entity_type: None,
            source_entity_id: None,
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Attach a source entity to the event.
    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id);
        self
    }

    /// Attach the acting user to the event.
    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Override the occurrence time (the engine stamps events from its clock).
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Users listed under `recipient_user_ids`, deduplicated in order.
    ///
    /// A missing or malformed list yields no recipients.
    pub fn recipients(&self) -> Vec<DbId> {
        let mut ids: Vec<DbId> = self
            .payload
            .get(PAYLOAD_RECIPIENTS)
            .and_then(|v| serde_json::from_value::<Vec<DbId>>(v.clone()).ok())
            .unwrap_or_default();
        let mut seen = std::collections::HashSet::new();
        ids.retain(|id| seen.insert(*id));
        ids
    }

    /// The notification text, falling back to the event type.
    pub fn message(&self) -> &str {
        self.payload
            .get(PAYLOAD_MESSAGE)
            .and_then(|v| v.as_str())
            .unwrap_or(&self.event_type)
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`PlatformEvent`].
///
/// # Usage
///
/// ```rust
/// use atelier_events::bus::{EventBus, PlatformEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(PlatformEvent::new("consultation.requested"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: PlatformEvent) {
        let _ = self.sender.send(event);
    }

    /// Publish an event, returning how many subscribers will see it.
    pub fn try_publish(
        &self,
        event: PlatformEvent,
    ) -> Result<usize, broadcast::error::SendError<PlatformEvent>> {
        self.sender.send(event)
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let event = PlatformEvent::new("consultation.requested")
            .with_source("consultation", 42)
            .with_actor(7)
            .with_payload(serde_json::json!({"designer_id": 3}));
        let id = event.event_id;

        bus.publish(event);

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_id, id);
        assert_eq!(received.event_type, "consultation.requested");
        assert_eq!(received.source_entity_type.as_deref(), Some("consultation"));
        assert_eq!(received.source_entity_id, Some(42));
        assert_eq!(received.actor_user_id, Some(7));
        assert_eq!(received.payload["designer_id"], 3);
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(PlatformEvent::new("project.status_changed"));

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");

        assert_eq!(e1, e2);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(PlatformEvent::new("orphan.event"));
        assert!(bus.try_publish(PlatformEvent::new("orphan.event")).is_err());
    }

    #[test]
    fn event_ids_are_unique() {
        let a = PlatformEvent::new("x");
        let b = PlatformEvent::new("x");
        assert_ne!(a.event_id, b.event_id);
    }

    #[test]
    fn default_event_has_empty_optional_fields() {
        let event = PlatformEvent::new("bare.event");
        assert_eq!(event.event_type, "bare.event");
        assert!(event.source_entity_type.is_none());
        assert!(event.source_entity_id.is_none());
        assert!(event.actor_user_id.is_none());
        assert!(event.payload.is_object());
        assert!(event.recipients().is_empty());
        assert_eq!(event.message(), "bare.event");
    }

    #[test]
    fn recipients_are_deduplicated_in_order() {
        let event = PlatformEvent::new("consultation.status_changed").with_payload(
            serde_json::json!({"recipient_user_ids": [5, 3, 5], "message": "Confirmed"}),
        );
        assert_eq!(event.recipients(), vec![5, 3]);
        assert_eq!(event.message(), "Confirmed");
    }

    #[test]
    fn malformed_recipients_yield_none() {
        let event = PlatformEvent::new("x")
            .with_payload(serde_json::json!({"recipient_user_ids": "nobody"}));
        assert!(event.recipients().is_empty());
    }

    #[test]
    fn explicit_timestamp_wins() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        assert_eq!(PlatformEvent::new("x").with_timestamp(at).timestamp, at);
    }
}
