//! Project row model.

use atelier_core::error::StoreError;
use atelier_core::project::Project;
use atelier_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::parse_column;

/// A row from the `projects` table.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    pub id: DbId,
    pub client_id: DbId,
    pub designer_id: Option<DbId>,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub progress_percentage: i16,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<ProjectRow> for Project {
    type Error = StoreError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        Ok(Project {
            id: row.id,
            client_id: row.client_id,
            designer_id: row.designer_id,
            title: row.title,
            description: row.description,
            status: parse_column(&row.status, "projects.status")?,
            progress_percentage: row.progress_percentage,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
