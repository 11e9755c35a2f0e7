//! Directory view of platform users.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;

/// The subset of a user account the scheduling engine relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: DbId,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub is_active: bool,
    pub email_verified: bool,
    pub specializations: Vec<String>,
}

impl UserRecord {
    /// Active, email-verified designer.
    pub fn is_bookable_designer(&self) -> bool {
        self.role == Role::Designer && self.is_active && self.email_verified
    }

    pub fn has_specialization(&self, wanted: &str) -> bool {
        self.specializations
            .iter()
            .any(|s| s.eq_ignore_ascii_case(wanted.trim()))
    }
}

/// Ensure a user may be booked or assigned as a designer.
///
/// Email verification only gates the public designer listing
/// ([`UserRecord::is_bookable_designer`]); a named, active designer can be
/// booked directly.
pub fn ensure_active_designer(user: &UserRecord) -> Result<(), CoreError> {
    if user.role != Role::Designer {
        return Err(CoreError::Validation(format!(
            "User {} is not a designer",
            user.id
        )));
    }
    if !user.is_active {
        return Err(CoreError::Validation(format!(
            "Designer {} is not active",
            user.id
        )));
    }
    Ok(())
}

/// Filters for the designer availability listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignerCriteria {
    /// Case-insensitive specialization tag, e.g. `"interior"`.
    pub specialization: Option<String>,
    /// Drop designers whose average rating is below this value.
    pub min_rating: Option<f64>,
}

impl DesignerCriteria {
    /// Directory-level match (everything except rating, which needs history).
    pub fn matches(&self, user: &UserRecord) -> bool {
        user.is_bookable_designer()
            && self
                .specialization
                .as_deref()
                .map_or(true, |wanted| user.has_specialization(wanted))
    }
}
