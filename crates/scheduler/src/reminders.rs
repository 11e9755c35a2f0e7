//! Periodic reminder dispatch for upcoming consultations.
//!
//! [`ReminderSweep`] runs as a background task. Each tick it looks for
//! confirmed or rescheduled consultations starting within the horizon whose
//! reminder has not gone out, emits a reminder event, and flags them.
//! Delivery is at-least-once: the flag is only set after the dispatcher
//! accepted the event.

use std::sync::Arc;
use std::time::Duration;

use atelier_core::availability::TimeWindow;
use atelier_core::clock::Clock;
use atelier_core::error::CoreError;
use atelier_core::store::{ConsultationFilter, ConsultationStore};
use atelier_events::NotificationDispatcher;
use tokio_util::sync::CancellationToken;

use crate::notifications;

/// Default look-ahead for reminders (24 hours).
const DEFAULT_HORIZON_MINUTES: i64 = 1440;

/// Default time between sweeps.
const DEFAULT_INTERVAL_SECS: u64 = 300;

// ---------------------------------------------------------------------------
// ReminderConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ReminderConfig {
    /// How far ahead of `now` a consultation becomes due for a reminder.
    pub horizon: chrono::Duration,
    /// How often the sweep runs.
    pub interval: Duration,
}

impl ReminderConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable                   | Default |
    /// |----------------------------|---------|
    /// | `REMINDER_HORIZON_MINUTES` | `1440`  |
    /// | `REMINDER_INTERVAL_SECS`   | `300`   |
    ///
    /// Unparseable or non-positive values fall back to the default.
    pub fn from_env() -> Self {
        let horizon_minutes = std::env::var("REMINDER_HORIZON_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_HORIZON_MINUTES);
        let interval_secs = std::env::var("REMINDER_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_INTERVAL_SECS);
        Self {
            horizon: chrono::Duration::minutes(horizon_minutes),
            interval: Duration::from_secs(interval_secs),
        }
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            horizon: chrono::Duration::minutes(DEFAULT_HORIZON_MINUTES),
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
        }
    }
}

// ---------------------------------------------------------------------------
// ReminderSweep
// ---------------------------------------------------------------------------

pub struct ReminderSweep {
    store: Arc<dyn ConsultationStore>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    clock: Arc<dyn Clock>,
    config: ReminderConfig,
}

impl ReminderSweep {
    pub fn new(
        store: Arc<dyn ConsultationStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        clock: Arc<dyn Clock>,
        config: ReminderConfig,
    ) -> Self {
        Self {
            store,
            dispatcher,
            clock,
            config,
        }
    }

    /// Run the sweep loop until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Reminder sweep cancelled");
                    break;
                }
                _ = interval.tick() => {
                    match self.sweep_once().await {
                        Ok(0) => {}
                        Ok(sent) => tracing::info!(sent, "Consultation reminders sent"),
                        Err(e) => tracing::error!(error = %e, "Reminder sweep failed"),
                    }
                }
            }
        }
    }

    /// Run one pass. Returns how many consultations were flagged.
    pub async fn sweep_once(&self) -> Result<usize, CoreError> {
        let now = self.clock.now();
        let horizon = TimeWindow::new(now, now + self.config.horizon)?;
        let filter = ConsultationFilter {
            starts_within: Some(horizon),
            reminder_sent: Some(false),
            ..ConsultationFilter::default().occupying()
        };

        let due = self.store.query_consultations(&filter).await?;
        let mut sent = 0;
        for c in &due {
            if let Err(e) = self
                .dispatcher
                .notify(notifications::consultation_reminder(c, now))
            {
                tracing::warn!(consultation_id = c.id, error = %e, "Reminder not dispatched, will retry");
                continue;
            }
            match self.store.mark_reminder_sent(c.id, c.scheduled_start).await {
                Ok(true) => sent += 1,
                Ok(false) => {
                    tracing::debug!(consultation_id = c.id, "Consultation moved during sweep");
                }
                Err(e) => {
                    tracing::error!(consultation_id = c.id, error = %e, "Failed to flag reminder");
                }
            }
        }
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ReminderConfig::default();
        assert_eq!(config.horizon, chrono::Duration::hours(24));
        assert_eq!(config.interval, Duration::from_secs(300));
    }
}
