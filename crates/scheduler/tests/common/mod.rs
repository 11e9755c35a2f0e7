//! Shared fixtures for scheduler integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use atelier_core::clock::FixedClock;
use atelier_core::consultation::{Consultation, ConsultationRequest, ConsultationStatus, MeetingType};
use atelier_core::roles::{Actor, Role};
use atelier_core::types::{DbId, Timestamp};
use atelier_core::users::UserRecord;
use atelier_events::{DispatchError, NotificationDispatcher, PlatformEvent};
use atelier_scheduler::{ConsultationScheduler, MemoryStore, ProjectLifecycle};
use chrono::{TimeZone, Utc};

// ---------------------------------------------------------------------------
// Well-known users
// ---------------------------------------------------------------------------

pub const CLIENT: DbId = 1;
pub const OTHER_CLIENT: DbId = 2;
pub const DESIGNER: DbId = 10;
pub const OTHER_DESIGNER: DbId = 11;
pub const UNVERIFIED_DESIGNER: DbId = 12;
pub const INACTIVE_DESIGNER: DbId = 13;
pub const ADMIN: DbId = 100;

/// 2024-06-01 at the given wall-clock time (UTC).
pub fn at(hour: u32, minute: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 6, 1, hour, minute, 0).unwrap()
}

/// The harness clock starts the evening before [`at`]'s day.
pub fn start_of_tests() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 5, 31, 18, 0, 0).unwrap()
}

fn user(id: DbId, name: &str, role: Role, specializations: &[&str]) -> UserRecord {
    UserRecord {
        id,
        email: format!("{}@example.com", name.to_lowercase()),
        display_name: name.to_string(),
        role,
        is_active: true,
        email_verified: true,
        specializations: specializations.iter().map(|s| s.to_string()).collect(),
    }
}

// ---------------------------------------------------------------------------
// Dispatchers
// ---------------------------------------------------------------------------

/// Keeps every event it receives.
#[derive(Default)]
pub struct RecordingDispatcher {
    events: Mutex<Vec<PlatformEvent>>,
}

impl RecordingDispatcher {
    pub fn events(&self) -> Vec<PlatformEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn event_types(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.event_type).collect()
    }
}

impl NotificationDispatcher for RecordingDispatcher {
    fn notify(&self, event: PlatformEvent) -> Result<(), DispatchError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// Rejects every event.
pub struct FailingDispatcher;

impl NotificationDispatcher for FailingDispatcher {
    fn notify(&self, _event: PlatformEvent) -> Result<(), DispatchError> {
        Err(DispatchError::Unavailable("dispatcher offline".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
    pub events: Arc<RecordingDispatcher>,
    pub scheduler: Arc<ConsultationScheduler>,
    pub lifecycle: Arc<ProjectLifecycle>,
}

impl Harness {
    pub async fn new() -> Self {
        let events = Arc::new(RecordingDispatcher::default());
        Self::build(Arc::clone(&events) as Arc<dyn NotificationDispatcher>, events).await
    }

    /// A harness whose services emit into a dispatcher that always fails.
    pub async fn with_failing_dispatcher() -> Self {
        Self::build(
            Arc::new(FailingDispatcher),
            Arc::new(RecordingDispatcher::default()),
        )
        .await
    }

    async fn build(
        dispatcher: Arc<dyn NotificationDispatcher>,
        events: Arc<RecordingDispatcher>,
    ) -> Self {
        let store = Arc::new(MemoryStore::new());
        for u in [
            user(CLIENT, "Casey", Role::Client, &[]),
            user(OTHER_CLIENT, "Robin", Role::Client, &[]),
            user(DESIGNER, "Dana", Role::Designer, &["interior", "Kitchen"]),
            user(OTHER_DESIGNER, "Ezra", Role::Designer, &["landscape"]),
            UserRecord {
                email_verified: false,
                ..user(UNVERIFIED_DESIGNER, "Noor", Role::Designer, &["interior"])
            },
            UserRecord {
                is_active: false,
                ..user(INACTIVE_DESIGNER, "Ira", Role::Designer, &["interior"])
            },
            user(ADMIN, "Alex", Role::Admin, &[]),
        ] {
            store.insert_user(u).await;
        }

        let clock = Arc::new(FixedClock::new(start_of_tests()));
        let scheduler = Arc::new(ConsultationScheduler::new(
            store.clone(),
            store.clone(),
            Arc::clone(&dispatcher),
            clock.clone(),
        ));
        let lifecycle = Arc::new(ProjectLifecycle::new(
            store.clone(),
            store.clone(),
            dispatcher,
            clock.clone(),
        ));

        Self {
            store,
            clock,
            events,
            scheduler,
            lifecycle,
        }
    }

    /// Create a requested consultation.
    pub async fn request(
        &self,
        designer_id: Option<DbId>,
        start: Timestamp,
        minutes: i32,
    ) -> Consultation {
        self.scheduler
            .create(request(CLIENT, designer_id, start, minutes))
            .await
            .expect("request should be accepted")
    }

    /// Create and confirm a consultation for `designer_id`.
    pub async fn confirmed(&self, designer_id: DbId, start: Timestamp, minutes: i32) -> Consultation {
        let c = self.request(Some(designer_id), start, minutes).await;
        self.scheduler
            .transition(c.id, Actor::designer(designer_id), ConsultationStatus::Confirmed)
            .await
            .expect("confirmation should succeed")
    }

    /// Drive a consultation to `completed` via confirmed.
    pub async fn completed(&self, designer_id: DbId, start: Timestamp) -> Consultation {
        let c = self.confirmed(designer_id, start, 60).await;
        self.scheduler
            .transition(c.id, Actor::designer(designer_id), ConsultationStatus::Completed)
            .await
            .expect("completion should succeed")
    }
}

pub fn request(
    client_id: DbId,
    designer_id: Option<DbId>,
    start: Timestamp,
    minutes: i32,
) -> ConsultationRequest {
    ConsultationRequest {
        client_id,
        designer_id,
        project_id: None,
        topic: "Open-plan kitchen".to_string(),
        notes: None,
        scheduled_start: start,
        duration_minutes: minutes,
        meeting_type: MeetingType::VideoCall,
    }
}
