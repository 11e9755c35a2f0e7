//! Repository for the `events` table.

use sqlx::PgPool;

use crate::models::event::NewEvent;

/// Append-only access to the event log.
pub struct EventRepo;

impl EventRepo {
    /// Insert an event row.
    ///
    /// Returns `false` when an event with the same `event_id` was already
    /// recorded.
    pub async fn insert(pool: &PgPool, event: &NewEvent<'_>) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO events
                (event_id, event_type, source_entity_type, source_entity_id,
                 actor_user_id, payload, occurred_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (event_id) DO NOTHING",
        )
        .bind(event.event_id)
        .bind(event.event_type)
        .bind(event.source_entity_type)
        .bind(event.source_entity_id)
        .bind(event.actor_user_id)
        .bind(event.payload)
        .bind(event.occurred_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
