//! Event-to-notification routing.
//!
//! [`NotificationRouter`] subscribes to the event bus and, for each event,
//! writes an in-app notification for every user listed in the payload's
//! `recipient_user_ids`. When SMTP is configured it also emails them.
//! Both channels are deduplicated by `(event_id, user_id, channel)`, so a
//! redelivered event is not sent twice.

use atelier_core::channels::{CHANNEL_EMAIL, CHANNEL_IN_APP};
use atelier_core::types::DbId;
use atelier_db::repositories::{NotificationRepo, UserRepo};
use atelier_db::DbPool;
use tokio::sync::broadcast;

use crate::bus::PlatformEvent;
use crate::delivery::email::EmailDelivery;

/// Routes platform events to user notifications.
pub struct NotificationRouter {
    pool: DbPool,
    email: Option<EmailDelivery>,
}

impl NotificationRouter {
    /// Create a router. Pass `None` for `email` to disable the email channel.
    pub fn new(pool: DbPool, email: Option<EmailDelivery>) -> Self {
        Self { pool, email }
    }

    /// Run the main routing loop.
    ///
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](crate::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.route_event(&event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to route event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Route a single event to all of its recipients.
    async fn route_event(&self, event: &PlatformEvent) -> Result<(), sqlx::Error> {
        for user_id in event.recipients() {
            NotificationRepo::create(
                &self.pool,
                event.event_id,
                user_id,
                CHANNEL_IN_APP,
                event.message(),
            )
            .await?;

            if let Some(email) = &self.email {
                self.deliver_email(email, user_id, event).await?;
            }
        }
        Ok(())
    }

    /// Claim the email slot for this user, then send.
    ///
    /// A send failure is logged; the claimed row stays so the message is
    /// not retried on redelivery.
    async fn deliver_email(
        &self,
        email: &EmailDelivery,
        user_id: DbId,
        event: &PlatformEvent,
    ) -> Result<(), sqlx::Error> {
        let Some(user) = UserRepo::find_by_id(&self.pool, user_id).await? else {
            tracing::warn!(user_id, "Notification recipient not found, skipping email");
            return Ok(());
        };
        if !user.is_active || !user.email_verified {
            return Ok(());
        }

        let claimed = NotificationRepo::create(
            &self.pool,
            event.event_id,
            user_id,
            CHANNEL_EMAIL,
            event.message(),
        )
        .await?;
        if claimed.is_none() {
            return Ok(());
        }

        if let Err(e) = email.deliver(&user.email, event).await {
            tracing::error!(
                user_id,
                error = %e,
                event_type = %event.event_type,
                "Failed to send notification email"
            );
        }
        Ok(())
    }
}
