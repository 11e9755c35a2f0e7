//! Well-known roles and the acting-user envelope.
//!
//! The string values must match the `users.role` CHECK constraint in
//! `20260301000001_create_users_table.sql`.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

pub const ROLE_CLIENT: &str = "client";
pub const ROLE_DESIGNER: &str = "designer";
pub const ROLE_ADMIN: &str = "admin";

define_str_enum! {
    /// Platform role of a user.
    Role {
        Client => "client",
        Designer => "designer",
        Admin => "admin",
    }
}

/// The user performing an operation, as resolved by the caller's auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: DbId,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: DbId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn client(user_id: DbId) -> Self {
        Self::new(user_id, Role::Client)
    }

    pub fn designer(user_id: DbId) -> Self {
        Self::new(user_id, Role::Designer)
    }

    pub fn admin(user_id: DbId) -> Self {
        Self::new(user_id, Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_strings_match_constants() {
        assert_eq!(Role::Client.as_str(), ROLE_CLIENT);
        assert_eq!(Role::Designer.as_str(), ROLE_DESIGNER);
        assert_eq!(Role::Admin.as_str(), ROLE_ADMIN);
    }

    #[test]
    fn parse_unknown_role_is_rejected() {
        let err = "superuser".parse::<Role>().unwrap_err();
        assert!(err.to_string().contains("Invalid Role 'superuser'"));
    }

    #[test]
    fn serde_uses_snake_case_values() {
        let json = serde_json::to_string(&Role::Designer).unwrap();
        assert_eq!(json, "\"designer\"");
    }
}
