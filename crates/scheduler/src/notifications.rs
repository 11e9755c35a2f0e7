//! Event construction and best-effort emission.
//!
//! Every event names its recipients in `recipient_user_ids` and carries a
//! `message` for the notification router. The acting user is never among the
//! recipients of their own action.

use atelier_core::consultation::{self, Consultation, ConsultationStatus};
use atelier_core::event_types;
use atelier_core::project::{self, Project, ProjectStatus};
use atelier_core::types::{DbId, Timestamp};
use atelier_events::{NotificationDispatcher, PlatformEvent};
use serde_json::json;

const ENTITY_CONSULTATION: &str = "consultation";
const ENTITY_PROJECT: &str = "project";

/// Hand an event to the dispatcher, logging and swallowing any failure.
pub fn emit(dispatcher: &dyn NotificationDispatcher, event: PlatformEvent) {
    let event_type = event.event_type.clone();
    let source_id = event.source_entity_id;
    if let Err(e) = dispatcher.notify(event) {
        tracing::warn!(
            error = %e,
            event_type = %event_type,
            source_id = ?source_id,
            "Failed to dispatch notification"
        );
    }
}

/// Client and designer of an engagement, minus the acting user.
fn parties(client_id: DbId, designer_id: Option<DbId>, actor: Option<DbId>) -> Vec<DbId> {
    std::iter::once(client_id)
        .chain(designer_id)
        .filter(|id| Some(*id) != actor)
        .collect()
}

// ---------------------------------------------------------------------------
// Consultation events
// ---------------------------------------------------------------------------

pub fn consultation_requested(c: &Consultation, at: Timestamp) -> PlatformEvent {
    PlatformEvent::new(event_types::CONSULTATION_REQUESTED)
        .with_source(ENTITY_CONSULTATION, c.id)
        .with_actor(c.client_id)
        .with_timestamp(at)
        .with_payload(json!({
            "consultation_id": c.id,
            "client_id": c.client_id,
            "designer_id": c.designer_id,
            "scheduled_start": c.scheduled_start,
            "duration_minutes": c.duration_minutes,
            "meeting_type": c.meeting_type,
            "message": consultation::status_message(ConsultationStatus::Requested),
            "recipient_user_ids": parties(c.client_id, c.designer_id, Some(c.client_id)),
        }))
}

pub fn consultation_status_changed(
    c: &Consultation,
    old_status: ConsultationStatus,
    actor: DbId,
    at: Timestamp,
) -> PlatformEvent {
    PlatformEvent::new(event_types::CONSULTATION_STATUS_CHANGED)
        .with_source(ENTITY_CONSULTATION, c.id)
        .with_actor(actor)
        .with_timestamp(at)
        .with_payload(json!({
            "consultation_id": c.id,
            "old_status": old_status,
            "new_status": c.status,
            "scheduled_start": c.scheduled_start,
            "message": consultation::status_message(c.status),
            "recipient_user_ids": parties(c.client_id, c.designer_id, Some(actor)),
        }))
}

pub fn consultation_designer_assigned(c: &Consultation, actor: DbId, at: Timestamp) -> PlatformEvent {
    PlatformEvent::new(event_types::CONSULTATION_DESIGNER_ASSIGNED)
        .with_source(ENTITY_CONSULTATION, c.id)
        .with_actor(actor)
        .with_timestamp(at)
        .with_payload(json!({
            "consultation_id": c.id,
            "designer_id": c.designer_id,
            "message": "A designer has been assigned to your consultation",
            "recipient_user_ids": parties(c.client_id, c.designer_id, Some(actor)),
        }))
}

pub fn consultation_reminder(c: &Consultation, at: Timestamp) -> PlatformEvent {
    PlatformEvent::new(event_types::CONSULTATION_REMINDER)
        .with_source(ENTITY_CONSULTATION, c.id)
        .with_timestamp(at)
        .with_payload(json!({
            "consultation_id": c.id,
            "scheduled_start": c.scheduled_start,
            "message": format!(
                "Reminder: your consultation \"{}\" starts at {}",
                c.topic,
                c.scheduled_start.format("%Y-%m-%d %H:%M UTC")
            ),
            "recipient_user_ids": parties(c.client_id, c.designer_id, None),
        }))
}

// ---------------------------------------------------------------------------
// Project events
// ---------------------------------------------------------------------------

pub fn project_status_changed(
    p: &Project,
    old_status: ProjectStatus,
    actor: DbId,
    at: Timestamp,
) -> PlatformEvent {
    PlatformEvent::new(event_types::PROJECT_STATUS_CHANGED)
        .with_source(ENTITY_PROJECT, p.id)
        .with_actor(actor)
        .with_timestamp(at)
        .with_payload(json!({
            "project_id": p.id,
            "old_status": old_status,
            "new_status": p.status,
            "progress_percentage": p.progress_percentage,
            "message": project::status_message(p.status),
            "recipient_user_ids": parties(p.client_id, p.designer_id, Some(actor)),
        }))
}
