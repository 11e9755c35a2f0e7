//! Repository for the `users` table.

use atelier_core::roles::ROLE_DESIGNER;
use atelier_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{CreateUser, UserRow};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, email, display_name, role, is_active, email_verified, \
                        specializations, created_at, updated_at";

/// Provides read access and seeding for user accounts.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<UserRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, display_name, role, email_verified, specializations)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserRow>(&query)
            .bind(&input.email)
            .bind(&input.display_name)
            .bind(&input.role)
            .bind(input.email_verified)
            .bind(&input.specializations)
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<UserRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List active, verified designers ordered by ID.
    ///
    /// When `specialization` is given, only designers listing it
    /// (case-insensitively) are returned.
    pub async fn list_designers(
        pool: &PgPool,
        specialization: Option<&str>,
    ) -> Result<Vec<UserRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users
             WHERE role = $1
               AND is_active = true
               AND email_verified = true
               AND ($2::TEXT IS NULL OR EXISTS (
                     SELECT 1 FROM unnest(specializations) AS s
                     WHERE lower(s) = lower($2)))
             ORDER BY id"
        );
        sqlx::query_as::<_, UserRow>(&query)
            .bind(ROLE_DESIGNER)
            .bind(specialization)
            .fetch_all(pool)
            .await
    }
}
