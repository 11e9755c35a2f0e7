//! SMTP delivery of notification emails.

use atelier_core::types::Timestamp;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::bus::PlatformEvent;

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(#[from] lettre::error::Error),
}

/// SMTP settings. Email is disabled when `SMTP_HOST` is unset.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from_address: String,
    pub credentials: Option<(String, String)>,
}

impl EmailConfig {
    /// Reads `SMTP_HOST`, `SMTP_PORT` (587), `SMTP_FROM`, `SMTP_USER` and
    /// `SMTP_PASSWORD`.
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        let credentials = match (std::env::var("SMTP_USER"), std::env::var("SMTP_PASSWORD")) {
            (Ok(user), Ok(password)) => Some((user, password)),
            _ => None,
        };
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| "noreply@atelier.local".to_string()),
            credentials,
        })
    }
}

pub struct EmailDelivery {
    config: EmailConfig,
}

fn format_time(t: Timestamp) -> String {
    t.format("%a %d %b %Y, %H:%M UTC").to_string()
}

/// Human label for the entity an event is about, e.g. `Consultation #7`.
fn subject_label(event: &PlatformEvent) -> Option<String> {
    let kind = match event.source_entity_type.as_deref()? {
        "consultation" => "Consultation",
        "project" => "Project",
        other => other,
    };
    Some(match event.source_entity_id {
        Some(id) => format!("{kind} #{id}"),
        None => kind.to_string(),
    })
}

impl EmailDelivery {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Subject line and plain-text body for an event.
    ///
    /// The body carries the schedule and status transition when the payload
    /// has them, so the mail stands on its own without opening the app.
    pub fn compose(event: &PlatformEvent) -> (String, String) {
        let message = event.message();
        let subject = match subject_label(event) {
            Some(label) => format!("[Atelier] {label}: {message}"),
            None => format!("[Atelier] {message}"),
        };

        let payload = &event.payload;
        let mut body = format!("{message}\n");
        if let Some(start) = payload
            .get("scheduled_start")
            .and_then(|v| serde_json::from_value::<Timestamp>(v.clone()).ok())
        {
            body.push_str(&format!("\nScheduled for: {}", format_time(start)));
            if let Some(minutes) = payload.get("duration_minutes").and_then(|v| v.as_i64()) {
                body.push_str(&format!(" ({minutes} min)"));
            }
        }
        if let (Some(old), Some(new)) = (
            payload.get("old_status").and_then(|v| v.as_str()),
            payload.get("new_status").and_then(|v| v.as_str()),
        ) {
            body.push_str(&format!("\nStatus: {old} -> {new}"));
        }
        if let Some(progress) = payload.get("progress_percentage").and_then(|v| v.as_i64()) {
            body.push_str(&format!("\nProgress: {progress}%"));
        }
        body.push_str(&format!(
            "\n\nSent {} ({})",
            format_time(event.timestamp),
            event.event_type
        ));
        (subject, body)
    }

    pub async fn deliver(&self, to_email: &str, event: &PlatformEvent) -> Result<(), EmailError> {
        let (subject, body) = Self::compose(event);
        let email = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(to_email.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        let mut transport =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);
        if let Some((user, password)) = &self.config.credentials {
            transport = transport.credentials(Credentials::new(user.clone(), password.clone()));
        }
        transport.build().send(email).await?;

        tracing::info!(to = to_email, event_type = %event.event_type, "Notification email sent");
        Ok(())
    }
}
