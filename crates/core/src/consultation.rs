//! Consultation domain model, validation and state machine.
//!
//! Lives in `core` (zero internal deps) so the Postgres adapter, the
//! scheduler and the reminder sweep all share one transition table.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::availability::{self, TimeWindow};
use crate::error::CoreError;
use crate::roles::{Actor, Role};
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Shortest bookable consultation.
pub const MIN_DURATION_MINUTES: i32 = 15;

/// Longest bookable consultation (one working day).
pub const MAX_DURATION_MINUTES: i32 = 480;

/// Maximum length of a consultation topic.
pub const MAX_TOPIC_LENGTH: usize = 200;

/// Maximum length of the free-form notes attached to a request.
pub const MAX_NOTES_LENGTH: usize = 5_000;

define_str_enum! {
    /// Consultation lifecycle status.
    ConsultationStatus {
        Requested => "requested",
        Confirmed => "confirmed",
        Rescheduled => "rescheduled",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
        NoShow => "no_show",
    }
}

impl ConsultationStatus {
    /// Statuses whose bookings block the designer's schedule.
    pub const OCCUPYING: &'static [ConsultationStatus] =
        &[ConsultationStatus::Confirmed, ConsultationStatus::Rescheduled];

    pub fn occupies_slot(self) -> bool {
        Self::OCCUPYING.contains(&self)
    }

    pub fn is_terminal(self) -> bool {
        state_machine::valid_transitions(self).is_empty()
    }
}

define_str_enum! {
    /// How the consultation takes place.
    MeetingType {
        InPerson => "in_person",
        VideoCall => "video_call",
        PhoneCall => "phone_call",
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A booked (or requested) appointment between a client and a designer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consultation {
    pub id: DbId,
    pub client_id: DbId,
    pub designer_id: Option<DbId>,
    pub project_id: Option<DbId>,
    pub topic: String,
    pub notes: Option<String>,
    pub scheduled_start: Timestamp,
    pub duration_minutes: i32,
    pub status: ConsultationStatus,
    pub meeting_type: MeetingType,
    pub rating: Option<f64>,
    pub client_feedback: Option<String>,
    pub rated_at: Option<Timestamp>,
    pub reminder_sent: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Consultation {
    pub fn scheduled_end(&self) -> Timestamp {
        scheduled_end(self.scheduled_start, self.duration_minutes)
    }

    /// The booked window without buffer.
    pub fn scheduled_window(&self) -> TimeWindow {
        TimeWindow {
            start: self.scheduled_start,
            end: self.scheduled_end(),
        }
    }

    /// The window this consultation blocks on its designer's schedule.
    pub fn occupied_interval(&self) -> TimeWindow {
        availability::occupied_interval(self.scheduled_start, self.scheduled_end())
    }

    pub fn is_assigned_to(&self, designer_id: DbId) -> bool {
        self.designer_id == Some(designer_id)
    }
}

/// Insert payload handed to a [`ConsultationStore`](crate::store::ConsultationStore).
#[derive(Debug, Clone, PartialEq)]
pub struct NewConsultation {
    pub client_id: DbId,
    pub designer_id: Option<DbId>,
    pub project_id: Option<DbId>,
    pub topic: String,
    pub notes: Option<String>,
    pub scheduled_start: Timestamp,
    pub duration_minutes: i32,
    pub status: ConsultationStatus,
    pub meeting_type: MeetingType,
    pub created_at: Timestamp,
}

impl NewConsultation {
    pub fn scheduled_end(&self) -> Timestamp {
        scheduled_end(self.scheduled_start, self.duration_minutes)
    }
}

/// Client-supplied booking request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ConsultationRequest {
    pub client_id: DbId,
    pub designer_id: Option<DbId>,
    pub project_id: Option<DbId>,
    #[validate(length(min = 1, max = 200))]
    pub topic: String,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
    pub scheduled_start: Timestamp,
    #[validate(range(min = 15, max = 480))]
    pub duration_minutes: i32,
    pub meeting_type: MeetingType,
}

impl ConsultationRequest {
    /// Check field shapes, reporting every failing field at once.
    pub fn validate_shape(&self) -> Result<(), CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string().replace('\n', "; ")))?;
        if self.topic.trim().is_empty() {
            return Err(CoreError::Validation(
                "Consultation topic must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Validation functions
// ---------------------------------------------------------------------------

/// End of a booking. Saturates at the latest representable instant; new
/// schedules go through [`validate_schedule`] first.
pub fn scheduled_end(start: Timestamp, duration_minutes: i32) -> Timestamp {
    start
        .checked_add_signed(Duration::minutes(i64::from(duration_minutes)))
        .unwrap_or(Timestamp::MAX_UTC)
}

/// Check that a booking and its leading buffer fit on the timeline and
/// return its end.
pub fn validate_schedule(start: Timestamp, duration_minutes: i32) -> Result<Timestamp, CoreError> {
    let buffered = start.checked_sub_signed(availability::buffer());
    let end = start.checked_add_signed(Duration::minutes(i64::from(duration_minutes)));
    match (buffered, end) {
        (Some(_), Some(end)) => Ok(end),
        _ => Err(CoreError::Validation(format!(
            "Consultation start {start} is outside the supported range"
        ))),
    }
}

/// Validate that a duration lies within the bookable range.
pub fn validate_duration(duration_minutes: i32) -> Result<(), CoreError> {
    if (MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&duration_minutes) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Duration must be between {MIN_DURATION_MINUTES} and {MAX_DURATION_MINUTES} minutes, got {duration_minutes}"
        )))
    }
}

/// Validate that a consultation starts strictly after `now`.
pub fn validate_start_in_future(start: Timestamp, now: Timestamp) -> Result<(), CoreError> {
    if start > now {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Consultation start {start} must be in the future"
        )))
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

pub mod state_machine {
    use super::ConsultationStatus::{self, *};
    use crate::error::CoreError;

    /// Returns the set of statuses reachable from `from`.
    ///
    /// Terminal states (Completed, Cancelled, NoShow) return an empty slice.
    pub fn valid_transitions(from: ConsultationStatus) -> &'static [ConsultationStatus] {
        match from {
            Requested => &[Confirmed, Rescheduled, Cancelled],
            Confirmed => &[InProgress, Completed, NoShow, Rescheduled, Cancelled],
            Rescheduled => &[Confirmed, InProgress, Completed, NoShow, Rescheduled, Cancelled],
            InProgress => &[Completed, Cancelled],
            Completed | Cancelled | NoShow => &[],
        }
    }

    pub fn can_transition(from: ConsultationStatus, to: ConsultationStatus) -> bool {
        valid_transitions(from).contains(&to)
    }

    /// Validate a transition, returning [`CoreError::IllegalTransition`] for
    /// edges outside the table.
    pub fn validate_transition(
        from: ConsultationStatus,
        to: ConsultationStatus,
    ) -> Result<(), CoreError> {
        if can_transition(from, to) {
            Ok(())
        } else {
            Err(CoreError::IllegalTransition {
                entity: "consultation",
                from: from.to_string(),
                to: to.to_string(),
            })
        }
    }
}

/// Role gate for moving `consultation` into `target`.
///
/// Admins pass every gate. Work-state moves belong to the assigned designer;
/// cancelling and rescheduling are open to either party.
pub fn authorize_transition(
    consultation: &Consultation,
    actor: &Actor,
    target: ConsultationStatus,
) -> Result<(), CoreError> {
    if actor.is_admin() {
        return Ok(());
    }

    let is_designer =
        actor.role == Role::Designer && consultation.is_assigned_to(actor.user_id);
    let is_client = actor.role == Role::Client && consultation.client_id == actor.user_id;

    let allowed = match target {
        ConsultationStatus::Confirmed
        | ConsultationStatus::InProgress
        | ConsultationStatus::Completed
        | ConsultationStatus::NoShow => is_designer,
        ConsultationStatus::Cancelled | ConsultationStatus::Rescheduled => {
            is_designer || is_client
        }
        ConsultationStatus::Requested => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "User {} ({}) may not move consultation {} to {target}",
            actor.user_id, actor.role, consultation.id
        )))
    }
}

/// Human-readable notification text for a consultation entering `status`.
pub fn status_message(status: ConsultationStatus) -> &'static str {
    match status {
        ConsultationStatus::Requested => "A new consultation has been requested",
        ConsultationStatus::Confirmed => "Your consultation has been confirmed",
        ConsultationStatus::Rescheduled => "Your consultation has been rescheduled",
        ConsultationStatus::InProgress => "Your consultation has started",
        ConsultationStatus::Completed => "Your consultation is complete. Please rate your designer",
        ConsultationStatus::Cancelled => "Your consultation has been cancelled",
        ConsultationStatus::NoShow => "Your consultation was marked as a no-show",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
