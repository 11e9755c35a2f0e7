//! Event log insert payload.

use atelier_core::types::{DbId, Timestamp};
use uuid::Uuid;

/// Insert payload for the `events` table.
#[derive(Debug, Clone)]
pub struct NewEvent<'a> {
    pub event_id: Uuid,
    pub event_type: &'a str,
    pub source_entity_type: Option<&'a str>,
    pub source_entity_id: Option<DbId>,
    pub actor_user_id: Option<DbId>,
    pub payload: &'a serde_json::Value,
    pub occurred_at: Timestamp,
}
