//! Durable event persistence service.
//!
//! [`EventPersistence`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! broadcast channel and writes every received [`PlatformEvent`] to the
//! `events` table. It runs as a long-lived background task and shuts down
//! when the bus sender is dropped.

use atelier_db::models::event::NewEvent;
use atelier_db::repositories::EventRepo;
use atelier_db::DbPool;
use tokio::sync::broadcast;

use crate::bus::PlatformEvent;

/// Background service that persists platform events to the database.
pub struct EventPersistence;

impl EventPersistence {
    /// Run the persistence loop.
    ///
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](crate::bus::EventBus) is dropped).
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => match Self::persist(&pool, &event).await {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::debug!(event_id = %event.event_id, "Duplicate event ignored");
                    }
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to persist event"
                        );
                    }
                },
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Event persistence lagged, some events were not persisted"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, persistence shutting down");
                    break;
                }
            }
        }
    }

    /// Write a single event. Returns `false` for an already-recorded id.
    pub async fn persist(pool: &DbPool, event: &PlatformEvent) -> Result<bool, sqlx::Error> {
        EventRepo::insert(pool, &Self::to_row(event)).await
    }

    fn to_row(event: &PlatformEvent) -> NewEvent<'_> {
        NewEvent {
            event_id: event.event_id,
            event_type: &event.event_type,
            source_entity_type: event.source_entity_type.as_deref(),
            source_entity_id: event.source_entity_id,
            actor_user_id: event.actor_user_id,
            payload: &event.payload,
            occurred_at: event.timestamp,
        }
    }
}
