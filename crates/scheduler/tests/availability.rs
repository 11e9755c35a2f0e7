//! Conflict checks, booked-interval listing and the designer search.

mod common;

use assert_matches::assert_matches;
use atelier_core::availability::TimeWindow;
use atelier_core::consultation::ConsultationStatus;
use atelier_core::error::CoreError;
use atelier_core::roles::Actor;
use atelier_core::users::DesignerCriteria;
use atelier_scheduler::BookedInterval;
use common::*;

// ---------------------------------------------------------------------------
// Confirmed booking 10:00-11:00: only a start at 12:00 or later is free
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_buffer_rule_around_confirmed_booking() {
    let h = Harness::new().await;
    h.confirmed(DESIGNER, at(10, 0), 60).await;
    let index = h.scheduler.availability();

    assert!(index.has_conflict(DESIGNER, at(10, 30), at(11, 30)).await.unwrap());
    // Effective window [10:05, 12:00) overlaps the booking.
    assert!(index.has_conflict(DESIGNER, at(11, 5), at(12, 0)).await.unwrap());
    assert!(index.has_conflict(DESIGNER, at(11, 59), at(12, 30)).await.unwrap());
    assert!(!index.has_conflict(DESIGNER, at(12, 0), at(13, 0)).await.unwrap());
    // Ends exactly where the booking's own buffer starts.
    assert!(!index.has_conflict(DESIGNER, at(8, 0), at(9, 0)).await.unwrap());
    assert!(index.has_conflict(DESIGNER, at(8, 0), at(9, 1)).await.unwrap());
    assert!(!index.has_conflict(OTHER_DESIGNER, at(10, 0), at(11, 0)).await.unwrap());
}

#[tokio::test]
async fn test_buffer_rule_applies_to_booking() {
    let h = Harness::new().await;
    h.confirmed(DESIGNER, at(10, 0), 60).await;

    for (start, minutes) in [(at(10, 30), 60), (at(11, 5), 55)] {
        assert_matches!(
            h.scheduler
                .create(request(OTHER_CLIENT, Some(DESIGNER), start, minutes))
                .await,
            Err(CoreError::SchedulingConflict(_))
        );
    }
    h.scheduler
        .create(request(OTHER_CLIENT, Some(DESIGNER), at(12, 0), 60))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_only_confirmed_and_rescheduled_occupy() {
    let h = Harness::new().await;
    let requested = h.request(Some(DESIGNER), at(10, 0), 60).await;
    let cancelled = h.confirmed(DESIGNER, at(14, 0), 60).await;
    h.scheduler
        .transition(cancelled.id, Actor::client(CLIENT), ConsultationStatus::Cancelled)
        .await
        .unwrap();
    let completed = h.completed(DESIGNER, at(17, 0)).await;
    let index = h.scheduler.availability();

    for c in [&requested, &cancelled, &completed] {
        assert!(
            !index
                .has_conflict(DESIGNER, c.scheduled_start, c.scheduled_end())
                .await
                .unwrap(),
            "consultation {} ({}) should not occupy",
            c.id,
            c.status
        );
    }
}

#[tokio::test]
async fn test_has_conflict_rejects_empty_window() {
    let h = Harness::new().await;
    assert_matches!(
        h.scheduler
            .availability()
            .has_conflict(DESIGNER, at(10, 0), at(10, 0))
            .await,
        Err(CoreError::Validation(_))
    );
}

// ---------------------------------------------------------------------------
// booked_intervals
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_booked_intervals_are_sorted_and_unbuffered() {
    let h = Harness::new().await;
    let late = h.confirmed(DESIGNER, at(15, 0), 30).await;
    let early = h.confirmed(DESIGNER, at(9, 0), 60).await;
    h.request(Some(DESIGNER), at(12, 0), 60).await;
    h.confirmed(OTHER_DESIGNER, at(12, 0), 60).await;
    let index = h.scheduler.availability();

    let all = index.booked_intervals(DESIGNER, at(0, 0), at(23, 0)).await.unwrap();
    assert_eq!(
        all,
        vec![
            BookedInterval { consultation_id: early.id, start: at(9, 0), end: at(10, 0) },
            BookedInterval { consultation_id: late.id, start: at(15, 0), end: at(15, 30) },
        ]
    );

    // The leading buffer of the 15:00 booking is not part of its slot.
    let morning = index.booked_intervals(DESIGNER, at(14, 0), at(15, 0)).await.unwrap();
    assert!(morning.is_empty());

    // Repeating the query gives the same answer.
    assert_eq!(
        index.booked_intervals(DESIGNER, at(0, 0), at(23, 0)).await.unwrap(),
        all
    );
}

// ---------------------------------------------------------------------------
// find_available_designers
// ---------------------------------------------------------------------------

/// Dana: confirmed 10:00-11:00 plus completed consultations rated 4, 5, 4
/// and one unrated. Ezra: no history.
async fn rated_history(h: &Harness) {
    h.confirmed(DESIGNER, at(10, 0), 60).await;
    for (hour, rating) in [(13, Some(4.0)), (15, Some(5.0)), (17, Some(4.0)), (19, None)] {
        let c = h.completed(DESIGNER, at(hour, 0)).await;
        if let Some(r) = rating {
            h.scheduler.rate(c.id, CLIENT, r, None).await.unwrap();
        }
    }
}

#[tokio::test]
async fn test_search_without_window_lists_bookable_designers() {
    let h = Harness::new().await;
    rated_history(&h).await;

    let found = h
        .scheduler
        .find_available_designers(&DesignerCriteria::default(), None)
        .await
        .unwrap();

    let ids: Vec<_> = found.iter().map(|d| d.designer_id).collect();
    assert_eq!(ids, vec![DESIGNER, OTHER_DESIGNER]);
    assert_eq!(found[0].avg_rating, 4.3);
    assert_eq!(found[0].completed_count, 4);
    assert_eq!(found[0].display_name, "Dana");
    assert_eq!(found[1].avg_rating, 0.0);
    assert_eq!(found[1].completed_count, 0);
}

#[tokio::test]
async fn test_search_with_window_drops_conflicting_designers() {
    let h = Harness::new().await;
    rated_history(&h).await;

    let busy = TimeWindow::new(at(10, 30), at(11, 30)).unwrap();
    let found = h
        .scheduler
        .find_available_designers(&DesignerCriteria::default(), Some(busy))
        .await
        .unwrap();
    let ids: Vec<_> = found.iter().map(|d| d.designer_id).collect();
    assert_eq!(ids, vec![OTHER_DESIGNER]);

    let free = TimeWindow::new(at(21, 0), at(22, 0)).unwrap();
    let found = h
        .scheduler
        .find_available_designers(&DesignerCriteria::default(), Some(free))
        .await
        .unwrap();
    assert_eq!(found.len(), 2);
}

#[tokio::test]
async fn test_search_filters_by_specialization_and_rating() {
    let h = Harness::new().await;
    rated_history(&h).await;

    let interior = DesignerCriteria {
        specialization: Some("INTERIOR".to_string()),
        min_rating: None,
    };
    let found = h
        .scheduler
        .find_available_designers(&interior, None)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].designer_id, DESIGNER);

    let picky = DesignerCriteria {
        specialization: None,
        min_rating: Some(4.0),
    };
    let found = h.scheduler.find_available_designers(&picky, None).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].designer_id, DESIGNER);

    let pickier = DesignerCriteria {
        specialization: None,
        min_rating: Some(4.5),
    };
    assert!(h
        .scheduler
        .find_available_designers(&pickier, None)
        .await
        .unwrap()
        .is_empty());
}
