//! Consultation row model.

use atelier_core::consultation::Consultation;
use atelier_core::error::StoreError;
use atelier_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::parse_column;

/// A row from the `consultations` table.
///
/// `scheduled_end` and `occupied_from` are derived columns kept for the
/// exclusion constraint; the domain type recomputes them.
#[derive(Debug, Clone, FromRow)]
pub struct ConsultationRow {
    pub id: DbId,
    pub client_id: DbId,
    pub designer_id: Option<DbId>,
    pub project_id: Option<DbId>,
    pub topic: String,
    pub notes: Option<String>,
    pub scheduled_start: Timestamp,
    pub duration_minutes: i32,
    pub scheduled_end: Timestamp,
    pub occupied_from: Timestamp,
    pub status: String,
    pub meeting_type: String,
    pub rating: Option<f64>,
    pub client_feedback: Option<String>,
    pub rated_at: Option<Timestamp>,
    pub reminder_sent: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<ConsultationRow> for Consultation {
    type Error = StoreError;

    fn try_from(row: ConsultationRow) -> Result<Self, Self::Error> {
        Ok(Consultation {
            id: row.id,
            client_id: row.client_id,
            designer_id: row.designer_id,
            project_id: row.project_id,
            topic: row.topic,
            notes: row.notes,
            scheduled_start: row.scheduled_start,
            duration_minutes: row.duration_minutes,
            status: parse_column(&row.status, "consultations.status")?,
            meeting_type: parse_column(&row.meeting_type, "consultations.meeting_type")?,
            rating: row.rating,
            client_feedback: row.client_feedback,
            rated_at: row.rated_at,
            reminder_sent: row.reminder_sent,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use atelier_core::consultation::{ConsultationStatus, MeetingType};
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn row(status: &str) -> ConsultationRow {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        ConsultationRow {
            id: 3,
            client_id: 1,
            designer_id: Some(2),
            project_id: None,
            topic: "Bathroom tiles".into(),
            notes: Some("Bring samples".into()),
            scheduled_start: start,
            duration_minutes: 45,
            scheduled_end: start + Duration::minutes(45),
            occupied_from: start - Duration::minutes(60),
            status: status.into(),
            meeting_type: "in_person".into(),
            rating: None,
            client_feedback: None,
            rated_at: None,
            reminder_sent: true,
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn converts_known_values() {
        let c = Consultation::try_from(row("no_show")).unwrap();
        assert_eq!(c.status, ConsultationStatus::NoShow);
        assert_eq!(c.meeting_type, MeetingType::InPerson);
        assert_eq!(c.scheduled_end(), c.scheduled_start + Duration::minutes(45));
        assert!(c.reminder_sent);
    }

    #[test]
    fn unknown_status_is_a_backend_error() {
        let err = Consultation::try_from(row("archived")).unwrap_err();
        assert_matches!(err, StoreError::Backend(msg) if msg.contains("consultations.status"));
    }
}
