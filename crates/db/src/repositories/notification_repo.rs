//! Repository for the `notifications` table.

use atelier_core::types::DbId;
use sqlx::PgPool;
use uuid::Uuid;

/// Records per-user delivery of an event.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Create a notification for a user.
    ///
    /// Returns `None` if this event was already delivered to the user on
    /// the channel.
    pub async fn create(
        pool: &PgPool,
        event_id: Uuid,
        user_id: DbId,
        channel: &str,
        message: &str,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO notifications (event_id, user_id, channel, message) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (event_id, user_id, channel) DO NOTHING \
             RETURNING id",
        )
        .bind(event_id)
        .bind(user_id)
        .bind(channel)
        .bind(message)
        .fetch_optional(pool)
        .await
    }
}
