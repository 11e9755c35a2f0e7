//! Dot-separated event type names published on the event bus.
//!
//! Stored verbatim in `events.event_type`.

/// A client requested a new consultation.
pub const CONSULTATION_REQUESTED: &str = "consultation.requested";

/// A consultation moved between two statuses.
pub const CONSULTATION_STATUS_CHANGED: &str = "consultation.status_changed";

/// A designer was attached to a previously unassigned consultation.
pub const CONSULTATION_DESIGNER_ASSIGNED: &str = "consultation.designer_assigned";

/// An upcoming consultation entered the reminder horizon.
pub const CONSULTATION_REMINDER: &str = "consultation.reminder";

/// A project moved between two statuses.
pub const PROJECT_STATUS_CHANGED: &str = "project.status_changed";
