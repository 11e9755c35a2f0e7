//! [`ConsultationScheduler`]: booking, transitions, rating and availability.
//!
//! Lock order is always consultation, then designer. Every path that can
//! make a consultation occupy designer time (creation with a designer,
//! assignment, confirmation, rescheduling) holds the designer lock across
//! the conflict check and the write.

use std::sync::Arc;

use atelier_core::availability::TimeWindow;
use atelier_core::clock::Clock;
use atelier_core::consultation::{
    self, state_machine, Consultation, ConsultationRequest, ConsultationStatus, NewConsultation,
};
use atelier_core::error::CoreError;
use atelier_core::rating::{self, RatingSummary};
use atelier_core::roles::{Actor, Role};
use atelier_core::store::{ConsultationFilter, ConsultationStore, UserDirectory};
use atelier_core::types::{DbId, Timestamp};
use atelier_core::users::{self, DesignerCriteria, UserRecord};
use atelier_events::NotificationDispatcher;
use serde::Serialize;

use crate::availability::AvailabilityIndex;
use crate::locks::KeyedLocks;
use crate::notifications;

/// A bookable designer with their rating history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignerSummary {
    pub designer_id: DbId,
    pub display_name: String,
    pub specializations: Vec<String>,
    pub avg_rating: f64,
    pub completed_count: i64,
}

/// Owns the consultation state machine.
pub struct ConsultationScheduler {
    store: Arc<dyn ConsultationStore>,
    users: Arc<dyn UserDirectory>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    clock: Arc<dyn Clock>,
    availability: AvailabilityIndex,
    consultation_locks: KeyedLocks,
    designer_locks: KeyedLocks,
}

impl ConsultationScheduler {
    pub fn new(
        store: Arc<dyn ConsultationStore>,
        users: Arc<dyn UserDirectory>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            availability: AvailabilityIndex::new(Arc::clone(&store)),
            store,
            users,
            dispatcher,
            clock,
            consultation_locks: KeyedLocks::new(),
            designer_locks: KeyedLocks::new(),
        }
    }

    pub fn availability(&self) -> &AvailabilityIndex {
        &self.availability
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Load a consultation or fail with `NotFound`.
    pub async fn get(&self, id: DbId) -> Result<Consultation, CoreError> {
        self.store
            .load_consultation(id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Consultation",
                id,
            })
    }

    /// Bookable designers matching `criteria`, optionally free over `window`,
    /// ordered by designer id.
    pub async fn find_available_designers(
        &self,
        criteria: &DesignerCriteria,
        window: Option<TimeWindow>,
    ) -> Result<Vec<DesignerSummary>, CoreError> {
        let mut designers = self.users.list_designers(criteria).await?;
        designers.retain(|d| criteria.matches(d));
        designers.sort_by_key(|d| d.id);

        let mut summaries = Vec::with_capacity(designers.len());
        for designer in designers {
            if let Some(w) = window {
                if self
                    .availability
                    .has_conflict(designer.id, w.start, w.end)
                    .await?
                {
                    continue;
                }
            }

            let summary = self.rating_summary(designer.id).await?;
            if criteria
                .min_rating
                .is_some_and(|min| summary.avg_rating < min)
            {
                continue;
            }

            summaries.push(DesignerSummary {
                designer_id: designer.id,
                display_name: designer.display_name,
                specializations: designer.specializations,
                avg_rating: summary.avg_rating,
                completed_count: summary.completed_count,
            });
        }
        Ok(summaries)
    }

    async fn rating_summary(&self, designer_id: DbId) -> Result<RatingSummary, CoreError> {
        let completed = self
            .store
            .query_consultations(
                &ConsultationFilter::for_designer(designer_id)
                    .with_statuses(&[ConsultationStatus::Completed]),
            )
            .await?;
        Ok(RatingSummary::from_consultations(&completed))
    }

    // -----------------------------------------------------------------------
    // Booking
    // -----------------------------------------------------------------------

    /// Validate and persist a new consultation in `requested`.
    pub async fn create(&self, request: ConsultationRequest) -> Result<Consultation, CoreError> {
        request.validate_shape()?;
        consultation::validate_duration(request.duration_minutes)?;
        let now = self.clock.now();
        consultation::validate_start_in_future(request.scheduled_start, now)?;
        consultation::validate_schedule(request.scheduled_start, request.duration_minutes)?;

        let input = NewConsultation {
            client_id: request.client_id,
            designer_id: request.designer_id,
            project_id: request.project_id,
            topic: request.topic.trim().to_string(),
            notes: request.notes,
            scheduled_start: request.scheduled_start,
            duration_minutes: request.duration_minutes,
            status: ConsultationStatus::Requested,
            meeting_type: request.meeting_type,
            created_at: now,
        };

        let created = match input.designer_id {
            Some(designer_id) => {
                self.load_active_designer(designer_id).await?;
                let _designer_guard = self.designer_locks.lock(designer_id).await;
                self.ensure_free(designer_id, input.scheduled_start, input.scheduled_end(), None)
                    .await?;
                self.store.create_consultation(&input).await?
            }
            None => self.store.create_consultation(&input).await?,
        };

        tracing::info!(
            consultation_id = created.id,
            client_id = created.client_id,
            designer_id = ?created.designer_id,
            scheduled_start = %created.scheduled_start,
            "Consultation requested"
        );
        notifications::emit(
            self.dispatcher.as_ref(),
            notifications::consultation_requested(&created, now),
        );
        Ok(created)
    }

    /// Attach a designer to an unassigned consultation that is still
    /// `requested`, or was rescheduled before anyone picked it up.
    ///
    /// Admins may assign anyone; a designer may only claim it for themselves.
    pub async fn assign_designer(
        &self,
        id: DbId,
        actor: Actor,
        designer_id: DbId,
    ) -> Result<Consultation, CoreError> {
        if !actor.is_admin() && !(actor.role == Role::Designer && actor.user_id == designer_id) {
            return Err(CoreError::Forbidden(format!(
                "User {} ({}) may not assign designer {designer_id}",
                actor.user_id, actor.role
            )));
        }

        let _guard = self.consultation_locks.lock(id).await;
        let mut c = self.get(id).await?;
        let awaiting = matches!(
            c.status,
            ConsultationStatus::Requested | ConsultationStatus::Rescheduled
        );
        if !awaiting || c.designer_id.is_some() {
            return Err(CoreError::Validation(format!(
                "Consultation {id} is not awaiting a designer"
            )));
        }
        self.load_active_designer(designer_id).await?;

        let _designer_guard = self.designer_locks.lock(designer_id).await;
        self.ensure_free(designer_id, c.scheduled_start, c.scheduled_end(), Some(c.id))
            .await?;

        let now = self.clock.now();
        c.designer_id = Some(designer_id);
        c.updated_at = now;
        self.store.save_consultation(&c).await?;

        tracing::info!(
            consultation_id = c.id,
            designer_id,
            actor_id = actor.user_id,
            "Designer assigned to consultation"
        );
        notifications::emit(
            self.dispatcher.as_ref(),
            notifications::consultation_designer_assigned(&c, actor.user_id, now),
        );
        Ok(c)
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Move a consultation to `target`.
    ///
    /// Rescheduling needs a new start time and goes through
    /// [`reschedule`](Self::reschedule).
    pub async fn transition(
        &self,
        id: DbId,
        actor: Actor,
        target: ConsultationStatus,
    ) -> Result<Consultation, CoreError> {
        let _guard = self.consultation_locks.lock(id).await;
        let mut c = self.get(id).await?;
        let from = c.status;

        state_machine::validate_transition(from, target)?;
        consultation::authorize_transition(&c, &actor, target)?;
        if target == ConsultationStatus::Rescheduled {
            return Err(CoreError::Validation(
                "Rescheduling requires a new start time".to_string(),
            ));
        }

        let now = self.clock.now();
        c.status = target;
        c.updated_at = now;

        if target.occupies_slot() {
            let designer_id = require_designer(&c)?;
            let _designer_guard = self.designer_locks.lock(designer_id).await;
            self.ensure_free(designer_id, c.scheduled_start, c.scheduled_end(), Some(c.id))
                .await?;
            self.store.save_consultation(&c).await?;
        } else {
            self.store.save_consultation(&c).await?;
        }

        tracing::info!(
            consultation_id = c.id,
            designer_id = ?c.designer_id,
            actor_id = actor.user_id,
            from = %from,
            to = %target,
            "Consultation status changed"
        );
        notifications::emit(
            self.dispatcher.as_ref(),
            notifications::consultation_status_changed(&c, from, actor.user_id, now),
        );
        Ok(c)
    }

    /// Move a consultation to a new start (and optionally a new duration),
    /// entering `rescheduled` and re-arming its reminder.
    pub async fn reschedule(
        &self,
        id: DbId,
        actor: Actor,
        new_start: Timestamp,
        new_duration_minutes: Option<i32>,
    ) -> Result<Consultation, CoreError> {
        let _guard = self.consultation_locks.lock(id).await;
        let mut c = self.get(id).await?;
        let from = c.status;

        state_machine::validate_transition(from, ConsultationStatus::Rescheduled)?;
        consultation::authorize_transition(&c, &actor, ConsultationStatus::Rescheduled)?;

        let duration = new_duration_minutes.unwrap_or(c.duration_minutes);
        consultation::validate_duration(duration)?;
        let now = self.clock.now();
        consultation::validate_start_in_future(new_start, now)?;
        let new_end = consultation::validate_schedule(new_start, duration)?;

        // An unassigned request has no schedule to collide with yet; the
        // check runs when a designer is assigned.
        let _designer_guard = match c.designer_id {
            Some(designer_id) => {
                let guard = self.designer_locks.lock(designer_id).await;
                self.ensure_free(designer_id, new_start, new_end, Some(c.id))
                    .await?;
                Some(guard)
            }
            None => None,
        };

        let previous_start = c.scheduled_start;
        c.scheduled_start = new_start;
        c.duration_minutes = duration;
        c.status = ConsultationStatus::Rescheduled;
        c.reminder_sent = false;
        c.updated_at = now;
        self.store.save_consultation(&c).await?;

        tracing::info!(
            consultation_id = c.id,
            designer_id = ?c.designer_id,
            actor_id = actor.user_id,
            from = %from,
            previous_start = %previous_start,
            new_start = %new_start,
            "Consultation rescheduled"
        );
        notifications::emit(
            self.dispatcher.as_ref(),
            notifications::consultation_status_changed(&c, from, actor.user_id, now),
        );
        Ok(c)
    }

    // -----------------------------------------------------------------------
    // Rating
    // -----------------------------------------------------------------------

    /// Attach the client's rating to a completed consultation, once.
    pub async fn rate(
        &self,
        id: DbId,
        client_id: DbId,
        rating: f64,
        feedback: Option<String>,
    ) -> Result<(), CoreError> {
        rating::validate_rating(rating, feedback.as_deref())?;

        let _guard = self.consultation_locks.lock(id).await;
        let mut c = self.get(id).await?;
        if c.client_id != client_id {
            return Err(CoreError::Forbidden(format!(
                "User {client_id} is not the client of consultation {id}"
            )));
        }
        if c.status != ConsultationStatus::Completed {
            return Err(CoreError::NotEligible(format!(
                "Consultation {id} is {}, only completed consultations can be rated",
                c.status
            )));
        }
        if c.rating.is_some() {
            return Err(CoreError::AlreadyRated { consultation_id: id });
        }

        let now = self.clock.now();
        c.rating = Some(rating);
        c.client_feedback = feedback.filter(|f| !f.trim().is_empty());
        c.rated_at = Some(now);
        c.updated_at = now;
        self.store.save_consultation(&c).await?;

        tracing::info!(consultation_id = id, designer_id = ?c.designer_id, rating, "Consultation rated");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn load_active_designer(&self, designer_id: DbId) -> Result<UserRecord, CoreError> {
        let user = self
            .users
            .get_user(designer_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "User",
                id: designer_id,
            })?;
        users::ensure_active_designer(&user)?;
        Ok(user)
    }

    /// Fail with `SchedulingConflict` if the slot is taken. Caller holds the
    /// designer lock.
    async fn ensure_free(
        &self,
        designer_id: DbId,
        start: Timestamp,
        end: Timestamp,
        exclude: Option<DbId>,
    ) -> Result<(), CoreError> {
        if self
            .availability
            .has_conflict_excluding(designer_id, start, end, exclude)
            .await?
        {
            tracing::debug!(designer_id, start = %start, end = %end, "Booking conflict");
            return Err(CoreError::SchedulingConflict(format!(
                "Designer {designer_id} is not available from {start} to {end}"
            )));
        }
        Ok(())
    }
}

fn require_designer(c: &Consultation) -> Result<DbId, CoreError> {
    c.designer_id.ok_or_else(|| {
        CoreError::Validation(format!("Consultation {} has no designer assigned", c.id))
    })
}
