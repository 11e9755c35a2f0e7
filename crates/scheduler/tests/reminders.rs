//! The periodic reminder sweep.

mod common;

use std::sync::Arc;

use atelier_core::consultation::ConsultationStatus;
use atelier_core::roles::Actor;
use atelier_events::NotificationDispatcher;
use atelier_scheduler::{ReminderConfig, ReminderSweep};
use chrono::Duration;
use common::*;
use tokio_util::sync::CancellationToken;

fn sweep(h: &Harness, dispatcher: Arc<dyn NotificationDispatcher>) -> ReminderSweep {
    ReminderSweep::new(
        h.store.clone(),
        dispatcher,
        h.clock.clone(),
        ReminderConfig {
            horizon: Duration::hours(2),
            interval: std::time::Duration::from_millis(10),
        },
    )
}

#[tokio::test]
async fn test_sweep_reminds_upcoming_occupying_consultations_once() {
    let h = Harness::new().await;
    let soon = h.confirmed(DESIGNER, at(10, 0), 60).await;
    let later = h.confirmed(DESIGNER, at(15, 0), 60).await;
    let pending = h.request(Some(OTHER_DESIGNER), at(10, 0), 60).await;
    h.clock.set(at(8, 30));

    let recorder = Arc::new(RecordingDispatcher::default());
    let sweep = sweep(&h, recorder.clone());

    assert_eq!(sweep.sweep_once().await.unwrap(), 1);
    let reminded: Vec<_> = recorder.events().iter().map(|e| e.source_entity_id).collect();
    assert_eq!(reminded, vec![Some(soon.id)]);
    assert_eq!(recorder.events()[0].recipients(), vec![CLIENT, DESIGNER]);
    assert!(h.scheduler.get(soon.id).await.unwrap().reminder_sent);
    assert!(!h.scheduler.get(later.id).await.unwrap().reminder_sent);
    assert!(!h.scheduler.get(pending.id).await.unwrap().reminder_sent);

    // Nothing new is due.
    assert_eq!(sweep.sweep_once().await.unwrap(), 0);
    assert_eq!(recorder.events().len(), 1);
}

#[tokio::test]
async fn test_failed_dispatch_leaves_reminder_pending() {
    let h = Harness::new().await;
    let c = h.confirmed(DESIGNER, at(10, 0), 60).await;
    h.clock.set(at(9, 0));

    let failing = sweep(&h, Arc::new(FailingDispatcher));
    assert_eq!(failing.sweep_once().await.unwrap(), 0);
    assert!(!h.scheduler.get(c.id).await.unwrap().reminder_sent);

    let recorder = Arc::new(RecordingDispatcher::default());
    assert_eq!(sweep(&h, recorder).sweep_once().await.unwrap(), 1);
}

#[tokio::test]
async fn test_reschedule_rearms_reminder() {
    let h = Harness::new().await;
    let c = h.confirmed(DESIGNER, at(10, 0), 60).await;
    h.clock.set(at(9, 0));
    let recorder = Arc::new(RecordingDispatcher::default());
    let sweep = sweep(&h, recorder.clone());
    assert_eq!(sweep.sweep_once().await.unwrap(), 1);

    h.scheduler
        .reschedule(c.id, Actor::client(CLIENT), at(10, 30), None)
        .await
        .unwrap();
    assert_eq!(sweep.sweep_once().await.unwrap(), 1);
    assert_eq!(recorder.events().len(), 2);
}

#[tokio::test]
async fn test_started_or_cancelled_consultations_are_not_reminded() {
    let h = Harness::new().await;
    h.confirmed(DESIGNER, at(10, 0), 60).await;
    let cancelled = h.confirmed(DESIGNER, at(11, 30), 30).await;
    h.scheduler
        .transition(cancelled.id, Actor::client(CLIENT), ConsultationStatus::Cancelled)
        .await
        .unwrap();
    h.clock.set(at(10, 1));

    let recorder = Arc::new(RecordingDispatcher::default());
    assert_eq!(sweep(&h, recorder.clone()).sweep_once().await.unwrap(), 0);
    assert!(recorder.events().is_empty());
}

#[tokio::test]
async fn test_run_stops_on_cancel() {
    let h = Harness::new().await;
    h.confirmed(DESIGNER, at(10, 0), 60).await;
    h.clock.set(at(9, 0));

    let recorder = Arc::new(RecordingDispatcher::default());
    let sweep = Arc::new(sweep(&h, recorder.clone()));
    let cancel = CancellationToken::new();

    let handle = {
        let sweep = Arc::clone(&sweep);
        let cancel = cancel.clone();
        tokio::spawn(async move { sweep.run(cancel).await })
    };

    // The first tick fires immediately.
    for _ in 0..100 {
        if !recorder.events().is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    cancel.cancel();
    handle.await.unwrap();

    assert_eq!(recorder.events().len(), 1);
}
