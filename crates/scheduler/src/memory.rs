//! In-process store for tests, demos and single-node deployments.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use atelier_core::consultation::{Consultation, NewConsultation};
use atelier_core::error::StoreError;
use atelier_core::project::{NewProject, Project, ProjectStatus};
use atelier_core::store::{ConsultationFilter, ConsultationStore, ProjectStore, UserDirectory};
use atelier_core::types::{DbId, Timestamp};
use atelier_core::users::{DesignerCriteria, UserRecord};
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    consultations: BTreeMap<DbId, Consultation>,
    projects: BTreeMap<DbId, Project>,
    users: BTreeMap<DbId, UserRecord>,
    last_consultation_id: DbId,
    last_project_id: DbId,
}

impl State {
    /// Reject a write that would put two occupying bookings of one designer
    /// on top of each other.
    fn check_overlap(&self, candidate: &Consultation) -> Result<(), StoreError> {
        let Some(designer_id) = candidate.designer_id else {
            return Ok(());
        };
        if !candidate.status.occupies_slot() {
            return Ok(());
        }
        let occupied = candidate.occupied_interval();
        let clash = self.consultations.values().find(|other| {
            other.id != candidate.id
                && other.designer_id == Some(designer_id)
                && other.status.occupies_slot()
                && other.occupied_interval().overlaps(&occupied)
        });
        match clash {
            Some(other) => Err(StoreError::Overlap(format!(
                "consultation {} overlaps consultation {} for designer {designer_id}",
                candidate.id, other.id
            ))),
            None => Ok(()),
        }
    }
}

/// [`ConsultationStore`], [`ProjectStore`] and [`UserDirectory`] over maps
/// behind a `tokio::sync::RwLock`.
///
/// Reads share the lock. Writes are checked against the same overlap rule
/// the Postgres exclusion constraint enforces.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a directory entry.
    pub async fn insert_user(&self, user: UserRecord) {
        self.state.write().await.users.insert(user.id, user);
    }

    /// Make every subsequent write fail with [`StoreError::Backend`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn consultation_count(&self) -> usize {
        self.state.read().await.consultations.len()
    }

    pub async fn all_consultations(&self) -> Vec<Consultation> {
        self.state.read().await.consultations.values().cloned().collect()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("write rejected: store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ConsultationStore for MemoryStore {
    async fn load_consultation(&self, id: DbId) -> Result<Option<Consultation>, StoreError> {
        Ok(self.state.read().await.consultations.get(&id).cloned())
    }

    async fn create_consultation(
        &self,
        input: &NewConsultation,
    ) -> Result<Consultation, StoreError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        let consultation = Consultation {
            id: state.last_consultation_id + 1,
            client_id: input.client_id,
            designer_id: input.designer_id,
            project_id: input.project_id,
            topic: input.topic.clone(),
            notes: input.notes.clone(),
            scheduled_start: input.scheduled_start,
            duration_minutes: input.duration_minutes,
            status: input.status,
            meeting_type: input.meeting_type,
            rating: None,
            client_feedback: None,
            rated_at: None,
            reminder_sent: false,
            created_at: input.created_at,
            updated_at: input.created_at,
        };
        state.check_overlap(&consultation)?;
        state.last_consultation_id = consultation.id;
        state
            .consultations
            .insert(consultation.id, consultation.clone());
        Ok(consultation)
    }

    async fn save_consultation(&self, consultation: &Consultation) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        if !state.consultations.contains_key(&consultation.id) {
            return Err(StoreError::Missing {
                entity: "Consultation",
                id: consultation.id,
            });
        }
        state.check_overlap(consultation)?;
        let mut next = consultation.clone();
        if let Some(stored) = state.consultations.get(&consultation.id) {
            if stored.scheduled_start == next.scheduled_start {
                next.reminder_sent |= stored.reminder_sent;
            }
        }
        state.consultations.insert(next.id, next);
        Ok(())
    }

    async fn query_consultations(
        &self,
        filter: &ConsultationFilter,
    ) -> Result<Vec<Consultation>, StoreError> {
        let state = self.state.read().await;
        let mut hits: Vec<Consultation> = state
            .consultations
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        hits.sort_by_key(|c| (c.scheduled_start, c.id));
        Ok(hits)
    }

    async fn mark_reminder_sent(
        &self,
        id: DbId,
        scheduled_start: Timestamp,
    ) -> Result<bool, StoreError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        match state.consultations.get_mut(&id) {
            Some(c) if c.scheduled_start == scheduled_start && !c.reminder_sent => {
                c.reminder_sent = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn load_project(&self, id: DbId) -> Result<Option<Project>, StoreError> {
        Ok(self.state.read().await.projects.get(&id).cloned())
    }

    async fn create_project(&self, input: &NewProject) -> Result<Project, StoreError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        state.last_project_id += 1;
        let project = Project {
            id: state.last_project_id,
            client_id: input.client_id,
            designer_id: None,
            title: input.title.clone(),
            description: input.description.clone(),
            status: ProjectStatus::Draft,
            progress_percentage: 0,
            created_at: input.created_at,
            updated_at: input.created_at,
        };
        state.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn save_project(&self, project: &Project) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        match state.projects.get_mut(&project.id) {
            Some(slot) => {
                *slot = project.clone();
                Ok(())
            }
            None => Err(StoreError::Missing {
                entity: "Project",
                id: project.id,
            }),
        }
    }

    async fn delete_project(&self, id: DbId) -> Result<bool, StoreError> {
        self.check_writable()?;
        Ok(self.state.write().await.projects.remove(&id).is_some())
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn get_user(&self, id: DbId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn list_designers(
        &self,
        criteria: &DesignerCriteria,
    ) -> Result<Vec<UserRecord>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .filter(|u| criteria.matches(u))
            .cloned()
            .collect())
    }
}
