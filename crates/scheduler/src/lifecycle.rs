//! [`ProjectLifecycle`]: the project status machine.
//!
//! Callers identify themselves by user id only; the role comes from the
//! [`UserDirectory`] so a stale role claim cannot widen access.

use std::sync::Arc;

use atelier_core::clock::Clock;
use atelier_core::error::CoreError;
use atelier_core::project::{self, state_machine, NewProject, Project, ProjectStatus};
use atelier_core::roles::{Actor, Role};
use atelier_core::store::{ProjectStore, UserDirectory};
use atelier_core::types::DbId;
use atelier_core::users;
use atelier_events::NotificationDispatcher;
use serde::Deserialize;

use crate::locks::KeyedLocks;
use crate::notifications;

/// Input for [`ProjectLifecycle::create_project`].
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectDraft {
    /// Owning client. Must equal the acting user unless an admin creates the
    /// project on the client's behalf.
    pub client_id: DbId,
    pub title: String,
    pub description: Option<String>,
}

pub struct ProjectLifecycle {
    store: Arc<dyn ProjectStore>,
    users: Arc<dyn UserDirectory>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    clock: Arc<dyn Clock>,
    locks: KeyedLocks,
}

impl ProjectLifecycle {
    pub fn new(
        store: Arc<dyn ProjectStore>,
        users: Arc<dyn UserDirectory>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            users,
            dispatcher,
            clock,
            locks: KeyedLocks::new(),
        }
    }

    pub async fn get(&self, id: DbId) -> Result<Project, CoreError> {
        self.store
            .load_project(id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Project",
                id,
            })
    }

    /// Create a project in `draft` with zero progress.
    pub async fn create_project(
        &self,
        acting_user_id: DbId,
        draft: ProjectDraft,
    ) -> Result<Project, CoreError> {
        let actor = self.resolve_actor(acting_user_id).await?;
        match actor.role {
            Role::Client if actor.user_id == draft.client_id => {}
            Role::Admin => {
                let owner = self.resolve_actor(draft.client_id).await?;
                if owner.role != Role::Client {
                    return Err(CoreError::Validation(format!(
                        "User {} is not a client",
                        draft.client_id
                    )));
                }
            }
            _ => {
                return Err(CoreError::Forbidden(format!(
                    "User {acting_user_id} ({}) may not create a project for client {}",
                    actor.role, draft.client_id
                )));
            }
        }
        project::validate_title(&draft.title)?;

        let created = self
            .store
            .create_project(&NewProject {
                client_id: draft.client_id,
                title: draft.title.trim().to_string(),
                description: draft.description,
                created_at: self.clock.now(),
            })
            .await?;

        tracing::info!(
            project_id = created.id,
            client_id = created.client_id,
            actor_id = acting_user_id,
            "Project created"
        );
        Ok(created)
    }

    /// Attach a designer while the project is in intake. Admin only.
    pub async fn assign_designer(
        &self,
        project_id: DbId,
        acting_user_id: DbId,
        designer_id: DbId,
    ) -> Result<Project, CoreError> {
        let _guard = self.locks.lock(project_id).await;
        let actor = self.resolve_actor(acting_user_id).await?;
        let mut p = self.get(project_id).await?;

        if !actor.is_admin() {
            return Err(CoreError::Forbidden(format!(
                "Only admins may assign designers to projects (user {acting_user_id})"
            )));
        }
        if !matches!(
            p.status,
            ProjectStatus::Submitted | ProjectStatus::InReview | ProjectStatus::Assigned
        ) {
            return Err(CoreError::Validation(format!(
                "Cannot assign a designer to a project in status {}",
                p.status
            )));
        }
        let designer = self
            .users
            .get_user(designer_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "User",
                id: designer_id,
            })?;
        users::ensure_active_designer(&designer)?;

        p.designer_id = Some(designer_id);
        p.updated_at = self.clock.now();
        self.store.save_project(&p).await?;

        tracing::info!(project_id, designer_id, actor_id = acting_user_id, "Designer assigned to project");
        Ok(p)
    }

    /// Move a project along the status graph.
    pub async fn change_status(
        &self,
        project_id: DbId,
        acting_user_id: DbId,
        new_status: ProjectStatus,
    ) -> Result<Project, CoreError> {
        let _guard = self.locks.lock(project_id).await;
        let actor = self.resolve_actor(acting_user_id).await?;
        let mut p = self.get(project_id).await?;
        let from = p.status;

        state_machine::validate_transition(from, new_status)?;
        project::authorize_transition(&p, &actor, new_status)?;
        if new_status == ProjectStatus::Assigned && p.designer_id.is_none() {
            return Err(CoreError::Validation(format!(
                "Project {project_id} has no designer to assign"
            )));
        }

        let now = self.clock.now();
        p.status = new_status;
        if new_status == ProjectStatus::Completed {
            p.progress_percentage = 100;
        }
        p.updated_at = now;
        self.store.save_project(&p).await?;

        tracing::info!(
            project_id,
            actor_id = acting_user_id,
            from = %from,
            to = %new_status,
            "Project status changed"
        );
        notifications::emit(
            self.dispatcher.as_ref(),
            notifications::project_status_changed(&p, from, acting_user_id, now),
        );
        Ok(p)
    }

    /// Set progress, clamped to `[0, 100]`. Any non-terminal status.
    pub async fn update_progress(
        &self,
        project_id: DbId,
        acting_user_id: DbId,
        percentage: i32,
    ) -> Result<Project, CoreError> {
        let _guard = self.locks.lock(project_id).await;
        let actor = self.resolve_actor(acting_user_id).await?;
        let mut p = self.get(project_id).await?;

        let is_designer = actor.role == Role::Designer && p.is_assigned_to(actor.user_id);
        if !(is_designer || actor.is_admin()) {
            return Err(CoreError::Forbidden(format!(
                "User {acting_user_id} may not update progress on project {project_id}"
            )));
        }
        if p.status.is_terminal() {
            return Err(CoreError::Validation(format!(
                "Project {project_id} is {} and can no longer change",
                p.status
            )));
        }

        p.progress_percentage = project::clamp_progress(percentage);
        p.updated_at = self.clock.now();
        self.store.save_project(&p).await?;

        tracing::debug!(project_id, progress = p.progress_percentage, "Project progress updated");
        Ok(p)
    }

    /// Delete an inactive project. The owner may delete drafts and cancelled
    /// projects; admins may delete any.
    pub async fn delete_project(&self, project_id: DbId, acting_user_id: DbId) -> Result<(), CoreError> {
        let _guard = self.locks.lock(project_id).await;
        let actor = self.resolve_actor(acting_user_id).await?;
        let p = self.get(project_id).await?;

        if !actor.is_admin() {
            if !(actor.role == Role::Client && p.is_owned_by(actor.user_id)) {
                return Err(CoreError::Forbidden(format!(
                    "User {acting_user_id} may not delete project {project_id}"
                )));
            }
            if !matches!(p.status, ProjectStatus::Draft | ProjectStatus::Cancelled) {
                return Err(CoreError::Validation(format!(
                    "Project {project_id} is {}; only draft or cancelled projects can be deleted",
                    p.status
                )));
            }
        }

        if !self.store.delete_project(project_id).await? {
            return Err(CoreError::NotFound {
                entity: "Project",
                id: project_id,
            });
        }
        tracing::info!(project_id, actor_id = acting_user_id, "Project deleted");
        Ok(())
    }

    async fn resolve_actor(&self, user_id: DbId) -> Result<Actor, CoreError> {
        let user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "User",
                id: user_id,
            })?;
        if !user.is_active {
            return Err(CoreError::Forbidden(format!("User {user_id} is not active")));
        }
        Ok(Actor::new(user.id, user.role))
    }
}
