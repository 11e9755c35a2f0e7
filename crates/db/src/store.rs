//! [`PgStore`]: the Postgres adapter behind the core store ports.

use async_trait::async_trait;
use atelier_core::consultation::{Consultation, NewConsultation};
use atelier_core::error::StoreError;
use atelier_core::project::{NewProject, Project};
use atelier_core::store::{ConsultationFilter, ConsultationStore, ProjectStore, UserDirectory};
use atelier_core::types::{DbId, Timestamp};
use atelier_core::users::{DesignerCriteria, UserRecord};

use crate::repositories::{ConsultationRepo, ProjectRepo, UserRepo};
use crate::DbPool;

/// SQLSTATE raised by an `EXCLUDE` constraint.
const EXCLUSION_VIOLATION: &str = "23P01";

/// Shared handle implementing every store port on one pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Map a driver error into the adapter taxonomy.
///
/// Exclusion-constraint violations become [`StoreError::Overlap`] so a
/// booking race lost at the database still surfaces as a scheduling
/// conflict.
pub fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(EXCLUSION_VIOLATION) {
            tracing::debug!(error = %db_err, "Exclusion constraint rejected booking");
            return StoreError::Overlap(db_err.message().to_string());
        }
    }
    tracing::error!(error = %err, "Database operation failed");
    StoreError::Backend(err.to_string())
}

#[async_trait]
impl ConsultationStore for PgStore {
    async fn load_consultation(&self, id: DbId) -> Result<Option<Consultation>, StoreError> {
        ConsultationRepo::find_by_id(&self.pool, id)
            .await
            .map_err(classify)?
            .map(Consultation::try_from)
            .transpose()
    }

    async fn create_consultation(
        &self,
        input: &NewConsultation,
    ) -> Result<Consultation, StoreError> {
        let row = ConsultationRepo::create(&self.pool, input)
            .await
            .map_err(classify)?;
        Consultation::try_from(row)
    }

    async fn save_consultation(&self, consultation: &Consultation) -> Result<(), StoreError> {
        let updated = ConsultationRepo::update(&self.pool, consultation)
            .await
            .map_err(classify)?;
        if !updated {
            return Err(StoreError::Missing {
                entity: "Consultation",
                id: consultation.id,
            });
        }
        Ok(())
    }

    async fn query_consultations(
        &self,
        filter: &ConsultationFilter,
    ) -> Result<Vec<Consultation>, StoreError> {
        ConsultationRepo::query(&self.pool, filter)
            .await
            .map_err(classify)?
            .into_iter()
            .map(Consultation::try_from)
            .collect()
    }

    async fn mark_reminder_sent(
        &self,
        id: DbId,
        scheduled_start: Timestamp,
    ) -> Result<bool, StoreError> {
        ConsultationRepo::mark_reminder_sent(&self.pool, id, scheduled_start)
            .await
            .map_err(classify)
    }
}

#[async_trait]
impl ProjectStore for PgStore {
    async fn load_project(&self, id: DbId) -> Result<Option<Project>, StoreError> {
        ProjectRepo::find_by_id(&self.pool, id)
            .await
            .map_err(classify)?
            .map(Project::try_from)
            .transpose()
    }

    async fn create_project(&self, input: &NewProject) -> Result<Project, StoreError> {
        let row = ProjectRepo::create(&self.pool, input)
            .await
            .map_err(classify)?;
        Project::try_from(row)
    }

    async fn save_project(&self, project: &Project) -> Result<(), StoreError> {
        let updated = ProjectRepo::update(&self.pool, project)
            .await
            .map_err(classify)?;
        if !updated {
            return Err(StoreError::Missing {
                entity: "Project",
                id: project.id,
            });
        }
        Ok(())
    }

    async fn delete_project(&self, id: DbId) -> Result<bool, StoreError> {
        ProjectRepo::delete(&self.pool, id).await.map_err(classify)
    }
}

#[async_trait]
impl UserDirectory for PgStore {
    async fn get_user(&self, id: DbId) -> Result<Option<UserRecord>, StoreError> {
        UserRepo::find_by_id(&self.pool, id)
            .await
            .map_err(classify)?
            .map(UserRecord::try_from)
            .transpose()
    }

    async fn list_designers(
        &self,
        criteria: &DesignerCriteria,
    ) -> Result<Vec<UserRecord>, StoreError> {
        UserRepo::list_designers(&self.pool, criteria.specialization.as_deref())
            .await
            .map_err(classify)?
            .into_iter()
            .map(UserRecord::try_from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn non_database_errors_are_backend_failures() {
        assert_matches!(classify(sqlx::Error::RowNotFound), StoreError::Backend(_));
        assert_matches!(classify(sqlx::Error::PoolTimedOut), StoreError::Backend(_));
    }
}
