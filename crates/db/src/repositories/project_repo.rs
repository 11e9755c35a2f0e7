//! Repository for the `projects` table.

use atelier_core::project::{NewProject, Project};
use atelier_core::types::DbId;
use sqlx::PgPool;

use crate::models::project::ProjectRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, client_id, designer_id, title, description, status, \
                        progress_percentage, created_at, updated_at";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project in `draft`, returning the created row.
    pub async fn create(pool: &PgPool, input: &NewProject) -> Result<ProjectRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (client_id, title, description, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(input.client_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.created_at)
            .fetch_one(pool)
            .await
    }

    /// Find a project by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ProjectRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Overwrite every mutable column. Returns `false` if no row matched.
    pub async fn update(pool: &PgPool, project: &Project) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET
                designer_id = $2,
                title = $3,
                description = $4,
                status = $5,
                progress_percentage = $6,
                updated_at = $7
             WHERE id = $1",
        )
        .bind(project.id)
        .bind(project.designer_id)
        .bind(&project.title)
        .bind(&project.description)
        .bind(project.status.as_str())
        .bind(project.progress_percentage)
        .bind(project.updated_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a project by ID. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
