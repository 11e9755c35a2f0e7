//! User row model.

use atelier_core::error::StoreError;
use atelier_core::types::{DbId, Timestamp};
use atelier_core::users::UserRecord;
use sqlx::FromRow;

use super::parse_column;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: DbId,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub is_active: bool,
    pub email_verified: bool,
    pub specializations: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(UserRecord {
            id: row.id,
            email: row.email,
            display_name: row.display_name,
            role: parse_column(&row.role, "users.role")?,
            is_active: row.is_active,
            email_verified: row.email_verified,
            specializations: row.specializations,
        })
    }
}

/// DTO for inserting a user (seeding, admin tooling, tests).
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub email_verified: bool,
    pub specializations: Vec<String>,
}
