//! Project lifecycle: status graph, role gates and notification messages.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::roles::{Actor, Role};
use crate::types::{DbId, Timestamp};

/// Maximum length of a project title.
pub const MAX_TITLE_LENGTH: usize = 200;

define_str_enum! {
    /// Project lifecycle status.
    ProjectStatus {
        Draft => "draft",
        Submitted => "submitted",
        InReview => "in_review",
        Assigned => "assigned",
        InProgress => "in_progress",
        DesignReview => "design_review",
        RevisionRequested => "revision_requested",
        Approved => "approved",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

impl ProjectStatus {
    pub fn is_terminal(self) -> bool {
        state_machine::valid_transitions(self).is_empty()
    }

    /// Statuses in which the owning client may still withdraw the project.
    pub fn is_inactive(self) -> bool {
        matches!(
            self,
            ProjectStatus::Draft | ProjectStatus::Submitted | ProjectStatus::InReview
        )
    }
}

/// A longer-running engagement owned by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: DbId,
    pub client_id: DbId,
    pub designer_id: Option<DbId>,
    pub title: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub progress_percentage: i16,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    pub fn is_owned_by(&self, user_id: DbId) -> bool {
        self.client_id == user_id
    }

    pub fn is_assigned_to(&self, designer_id: DbId) -> bool {
        self.designer_id == Some(designer_id)
    }
}

/// Insert payload handed to a [`ProjectStore`](crate::store::ProjectStore).
#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub client_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
}

/// Validate a project title.
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Project title must not be blank".to_string(),
        ));
    }
    if trimmed.len() > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Project title exceeds maximum length of {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Clamp a progress value into `[0, 100]`.
pub fn clamp_progress(percentage: i32) -> i16 {
    // The clamp guarantees the value fits.
    percentage.clamp(0, 100) as i16
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

pub mod state_machine {
    use super::ProjectStatus::{self, *};
    use crate::error::CoreError;

    /// Returns the set of statuses reachable from `from`.
    ///
    /// `Cancelled` is reachable from every non-terminal status.
    pub fn valid_transitions(from: ProjectStatus) -> &'static [ProjectStatus] {
        match from {
            Draft => &[Submitted, Cancelled],
            Submitted => &[InReview, Cancelled],
            InReview => &[Assigned, Cancelled],
            Assigned => &[InProgress, Cancelled],
            InProgress => &[DesignReview, Cancelled],
            DesignReview => &[RevisionRequested, Approved, Cancelled],
            RevisionRequested => &[DesignReview, Cancelled],
            Approved => &[Completed, Cancelled],
            Completed | Cancelled => &[],
        }
    }

    pub fn can_transition(from: ProjectStatus, to: ProjectStatus) -> bool {
        valid_transitions(from).contains(&to)
    }

    pub fn validate_transition(from: ProjectStatus, to: ProjectStatus) -> Result<(), CoreError> {
        if can_transition(from, to) {
            Ok(())
        } else {
            Err(CoreError::IllegalTransition {
                entity: "project",
                from: from.to_string(),
                to: to.to_string(),
            })
        }
    }
}

/// Role gate for moving `project` into `target`.
///
/// The owning client drives submission and review decisions, the assigned
/// designer drives work states, intake belongs to admins. Admins may take any
/// legal edge.
pub fn authorize_transition(
    project: &Project,
    actor: &Actor,
    target: ProjectStatus,
) -> Result<(), CoreError> {
    if actor.is_admin() {
        return Ok(());
    }

    let is_owner = actor.role == Role::Client && project.is_owned_by(actor.user_id);
    let is_designer = actor.role == Role::Designer && project.is_assigned_to(actor.user_id);

    let allowed = match target {
        ProjectStatus::Submitted
        | ProjectStatus::RevisionRequested
        | ProjectStatus::Approved => is_owner,
        ProjectStatus::InProgress | ProjectStatus::DesignReview | ProjectStatus::Completed => {
            is_designer
        }
        ProjectStatus::Cancelled => is_owner && project.status.is_inactive(),
        ProjectStatus::Draft | ProjectStatus::InReview | ProjectStatus::Assigned => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "User {} ({}) may not move project {} from {} to {target}",
            actor.user_id, actor.role, project.id, project.status
        )))
    }
}

/// Human-readable notification text for a project entering `status`.
pub fn status_message(status: ProjectStatus) -> &'static str {
    match status {
        ProjectStatus::Draft => "Your project has been saved as a draft",
        ProjectStatus::Submitted => "Your project has been submitted for review",
        ProjectStatus::InReview => "Our team is reviewing your project",
        ProjectStatus::Assigned => "A designer has been assigned to your project",
        ProjectStatus::InProgress => "Your designer has started working on your project",
        ProjectStatus::DesignReview => "New designs are ready for your review",
        ProjectStatus::RevisionRequested => "Revisions have been requested on the latest designs",
        ProjectStatus::Approved => "The designs for your project have been approved",
        ProjectStatus::Completed => "Your project has been completed",
        ProjectStatus::Cancelled => "Your project has been cancelled",
    }
}
