//! Designer availability queries over the consultation store.

use std::sync::Arc;

use atelier_core::availability::{self, TimeWindow};
use atelier_core::consultation::Consultation;
use atelier_core::error::CoreError;
use atelier_core::store::{ConsultationFilter, ConsultationStore};
use atelier_core::types::{DbId, Timestamp};
use serde::Serialize;

/// One booked slot on a designer's schedule, without buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BookedInterval {
    pub consultation_id: DbId,
    pub start: Timestamp,
    pub end: Timestamp,
}

impl From<&Consultation> for BookedInterval {
    fn from(c: &Consultation) -> Self {
        Self {
            consultation_id: c.id,
            start: c.scheduled_start,
            end: c.scheduled_end(),
        }
    }
}

/// Read-only view of which designer time is taken.
///
/// Only confirmed and rescheduled consultations occupy time. Both queries
/// are side-effect free and safe to repeat.
#[derive(Clone)]
pub struct AvailabilityIndex {
    store: Arc<dyn ConsultationStore>,
}

impl AvailabilityIndex {
    pub fn new(store: Arc<dyn ConsultationStore>) -> Self {
        Self { store }
    }

    /// Whether booking `designer_id` for `[start, end)` would collide with an
    /// existing occupying booking.
    pub async fn has_conflict(
        &self,
        designer_id: DbId,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<bool, CoreError> {
        self.has_conflict_excluding(designer_id, start, end, None)
            .await
    }

    /// As [`has_conflict`](Self::has_conflict), ignoring one consultation
    /// (the booking being moved or confirmed).
    pub async fn has_conflict_excluding(
        &self,
        designer_id: DbId,
        start: Timestamp,
        end: Timestamp,
        exclude: Option<DbId>,
    ) -> Result<bool, CoreError> {
        TimeWindow::new(start, end)?;
        let query = availability::effective_query_interval(start, end);
        let filter = ConsultationFilter {
            occupied_overlaps: Some(query),
            ..ConsultationFilter::for_designer(designer_id).occupying()
        }
        .excluding(exclude);

        let occupying = self.store.query_consultations(&filter).await?;
        Ok(availability::conflicts(
            start,
            end,
            occupying.iter().map(Consultation::occupied_interval),
        ))
    }

    /// Occupying bookings of `designer_id` whose scheduled slot overlaps
    /// `[range_start, range_end)`, ordered by start then id.
    pub async fn booked_intervals(
        &self,
        designer_id: DbId,
        range_start: Timestamp,
        range_end: Timestamp,
    ) -> Result<Vec<BookedInterval>, CoreError> {
        let range = TimeWindow::new(range_start, range_end)?;
        let filter = ConsultationFilter {
            scheduled_overlaps: Some(range),
            ..ConsultationFilter::for_designer(designer_id).occupying()
        };

        let mut intervals: Vec<BookedInterval> = self
            .store
            .query_consultations(&filter)
            .await?
            .iter()
            .map(BookedInterval::from)
            .collect();
        intervals.sort_by_key(|i| (i.start, i.consultation_id));
        Ok(intervals)
    }
}
