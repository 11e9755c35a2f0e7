//! Persistence and directory ports injected into the scheduler.
//!
//! Implemented by `atelier_db::PgStore` (Postgres) and
//! `atelier_scheduler::memory::MemoryStore` (in-process).

use async_trait::async_trait;

use crate::availability::TimeWindow;
use crate::consultation::{Consultation, ConsultationStatus, NewConsultation};
use crate::error::StoreError;
use crate::project::{NewProject, Project};
use crate::types::{DbId, Timestamp};
use crate::users::{DesignerCriteria, UserRecord};

// ---------------------------------------------------------------------------
// Consultation query filter
// ---------------------------------------------------------------------------

/// Conjunctive filter for [`ConsultationStore::query_consultations`].
///
/// Unset fields do not constrain the result. Results are ordered by
/// `scheduled_start`, then `id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsultationFilter {
    pub designer_id: Option<DbId>,
    pub client_id: Option<DbId>,
    /// Empty means any status.
    pub statuses: Vec<ConsultationStatus>,
    /// Occupied interval (buffer included) intersects this window.
    pub occupied_overlaps: Option<TimeWindow>,
    /// Scheduled interval (no buffer) intersects this window.
    pub scheduled_overlaps: Option<TimeWindow>,
    /// `scheduled_start` lies inside this window.
    pub starts_within: Option<TimeWindow>,
    pub reminder_sent: Option<bool>,
    pub exclude_id: Option<DbId>,
}

impl ConsultationFilter {
    pub fn for_designer(designer_id: DbId) -> Self {
        Self {
            designer_id: Some(designer_id),
            ..Self::default()
        }
    }

    /// Restrict to statuses that block a designer's schedule.
    pub fn occupying(mut self) -> Self {
        self.statuses = ConsultationStatus::OCCUPYING.to_vec();
        self
    }

    pub fn with_statuses(mut self, statuses: &[ConsultationStatus]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    pub fn excluding(mut self, id: Option<DbId>) -> Self {
        self.exclude_id = id;
        self
    }

    /// Evaluate the filter against one consultation.
    ///
    /// The Postgres adapter translates the same conditions to SQL; in-memory
    /// stores call this directly.
    pub fn matches(&self, c: &Consultation) -> bool {
        if self.designer_id.is_some() && c.designer_id != self.designer_id {
            return false;
        }
        if self.client_id.is_some_and(|id| c.client_id != id) {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&c.status) {
            return false;
        }
        if self
            .occupied_overlaps
            .is_some_and(|w| !c.occupied_interval().overlaps(&w))
        {
            return false;
        }
        if self
            .scheduled_overlaps
            .is_some_and(|w| !c.scheduled_window().overlaps(&w))
        {
            return false;
        }
        if self
            .starts_within
            .is_some_and(|w| !w.contains(c.scheduled_start))
        {
            return false;
        }
        if self.reminder_sent.is_some_and(|sent| c.reminder_sent != sent) {
            return false;
        }
        if self.exclude_id == Some(c.id) {
            return false;
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Consultation persistence.
#[async_trait]
pub trait ConsultationStore: Send + Sync {
    async fn load_consultation(&self, id: DbId) -> Result<Option<Consultation>, StoreError>;

    /// Insert a consultation and return it with its assigned id.
    async fn create_consultation(
        &self,
        input: &NewConsultation,
    ) -> Result<Consultation, StoreError>;

    /// Overwrite every mutable column of an existing consultation.
    ///
    /// `reminder_sent` is merged rather than overwritten while the start is
    /// unchanged, so a copy loaded before the sweep cannot clear the flag.
    async fn save_consultation(&self, consultation: &Consultation) -> Result<(), StoreError>;

    async fn query_consultations(
        &self,
        filter: &ConsultationFilter,
    ) -> Result<Vec<Consultation>, StoreError>;

    /// Flag a reminder as sent, but only while the consultation still starts
    /// at `scheduled_start` and has not been flagged yet. Returns whether a
    /// row changed.
    async fn mark_reminder_sent(
        &self,
        id: DbId,
        scheduled_start: Timestamp,
    ) -> Result<bool, StoreError>;
}

/// Project persistence.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn load_project(&self, id: DbId) -> Result<Option<Project>, StoreError>;

    async fn create_project(&self, input: &NewProject) -> Result<Project, StoreError>;

    async fn save_project(&self, project: &Project) -> Result<(), StoreError>;

    /// Returns `true` if a row was removed.
    async fn delete_project(&self, id: DbId) -> Result<bool, StoreError>;
}

/// Read access to user accounts.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user(&self, id: DbId) -> Result<Option<UserRecord>, StoreError>;

    /// Bookable designers matching the criteria's directory-level fields,
    /// ordered by id.
    async fn list_designers(
        &self,
        criteria: &DesignerCriteria,
    ) -> Result<Vec<UserRecord>, StoreError>;
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::consultation::MeetingType;

    fn at(hour: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
    }

    fn booking(id: DbId, status: ConsultationStatus, start_hour: u32) -> Consultation {
        Consultation {
            id,
            client_id: 1,
            designer_id: Some(2),
            project_id: None,
            topic: "t".into(),
            notes: None,
            scheduled_start: at(start_hour),
            duration_minutes: 60,
            status,
            meeting_type: MeetingType::VideoCall,
            rating: None,
            client_feedback: None,
            rated_at: None,
            reminder_sent: false,
            created_at: at(0),
            updated_at: at(0),
        }
    }

    #[test]
    fn default_filter_matches_everything() {
        assert!(ConsultationFilter::default().matches(&booking(1, ConsultationStatus::Requested, 10)));
    }

    #[test]
    fn occupying_filter_skips_requested() {
        let filter = ConsultationFilter::for_designer(2).occupying();
        assert!(filter.matches(&booking(1, ConsultationStatus::Confirmed, 10)));
        assert!(filter.matches(&booking(1, ConsultationStatus::Rescheduled, 10)));
        assert!(!filter.matches(&booking(1, ConsultationStatus::Requested, 10)));
        assert!(!ConsultationFilter::for_designer(3).matches(&booking(1, ConsultationStatus::Confirmed, 10)));
    }

    #[test]
    fn occupied_overlap_includes_leading_buffer() {
        let c = booking(1, ConsultationStatus::Confirmed, 10);
        let filter = ConsultationFilter {
            occupied_overlaps: Some(TimeWindow::new(at(9) - Duration::minutes(30), at(9) + Duration::minutes(30)).unwrap()),
            ..ConsultationFilter::default()
        };
        assert!(filter.matches(&c));

        let filter = ConsultationFilter {
            scheduled_overlaps: Some(TimeWindow::new(at(9) - Duration::minutes(30), at(9) + Duration::minutes(30)).unwrap()),
            ..ConsultationFilter::default()
        };
        assert!(!filter.matches(&c));
    }

    #[test]
    fn exclude_id_and_reminder_flag() {
        let c = booking(4, ConsultationStatus::Confirmed, 10);
        assert!(!ConsultationFilter::default().excluding(Some(4)).matches(&c));
        let pending = ConsultationFilter {
            reminder_sent: Some(false),
            starts_within: Some(TimeWindow::new(at(9), at(11)).unwrap()),
            ..ConsultationFilter::default()
        };
        assert!(pending.matches(&c));
        let mut sent = c.clone();
        sent.reminder_sent = true;
        assert!(!pending.matches(&sent));
    }
}
