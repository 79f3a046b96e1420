//! Project persistence seam for the job lifecycle.

use async_trait::async_trait;
use inflio_core::error::CoreError;
use inflio_core::task::ProcessingTask;
use inflio_core::types::DbId;
use inflio_db::models::project::{CreateProject, Project, ProjectLifecycle, UpdateProject};
use inflio_db::repositories::ProjectRepo;
use inflio_db::DbPool;

use crate::error::PipelineError;

/// An edit applied to a project's lifecycle fields while its row is locked.
/// Returning an error discards the edit.
pub type LifecycleEdit = Box<dyn FnOnce(&mut ProjectLifecycle) -> Result<(), CoreError> + Send>;

/// Storage for projects.
///
/// `edit_lifecycle` is the only way the lifecycle fields change. It must be
/// atomic with respect to other `edit_lifecycle` calls on the same project:
/// the edit sees the latest committed state and nobody else writes the row
/// until it is saved or discarded.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn create(
        &self,
        user_id: &str,
        input: &CreateProject,
        tasks: Vec<ProcessingTask>,
    ) -> Result<Project, PipelineError>;

    async fn find(&self, id: DbId) -> Result<Option<Project>, PipelineError>;

    async fn list_by_user(
        &self,
        user_id: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Project>, PipelineError>;

    async fn update(&self, id: DbId, input: &UpdateProject)
        -> Result<Option<Project>, PipelineError>;

    async fn delete(&self, id: DbId) -> Result<bool, PipelineError>;

    /// Apply `edit` under the project's lock and return the saved row.
    /// Fails with `NotFound` when the project does not exist.
    async fn edit_lifecycle(&self, id: DbId, edit: LifecycleEdit)
        -> Result<Project, PipelineError>;

    /// Projects with a stored external job whose clips task is processing.
    async fn list_in_flight(&self, limit: i64) -> Result<Vec<Project>, PipelineError>;
}

/// [`ProjectStore`] backed by the `projects` table.
#[derive(Clone)]
pub struct PgProjectStore {
    pool: DbPool,
}

impl PgProjectStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectStore for PgProjectStore {
    async fn create(
        &self,
        user_id: &str,
        input: &CreateProject,
        tasks: Vec<ProcessingTask>,
    ) -> Result<Project, PipelineError> {
        Ok(ProjectRepo::create(&self.pool, user_id, input, &tasks).await?)
    }

    async fn find(&self, id: DbId) -> Result<Option<Project>, PipelineError> {
        Ok(ProjectRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Project>, PipelineError> {
        Ok(ProjectRepo::list_by_user(&self.pool, user_id, limit, offset).await?)
    }

    async fn update(
        &self,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, PipelineError> {
        Ok(ProjectRepo::update(&self.pool, id, input).await?)
    }

    async fn delete(&self, id: DbId) -> Result<bool, PipelineError> {
        Ok(ProjectRepo::delete(&self.pool, id).await?)
    }

    async fn edit_lifecycle(
        &self,
        id: DbId,
        edit: LifecycleEdit,
    ) -> Result<Project, PipelineError> {
        let mut tx = self.pool.begin().await?;

        let project = ProjectRepo::find_for_update(&mut *tx, id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Project",
                id,
            })?;

        let before = project.lifecycle();
        let mut after = before.clone();
        // Dropping `tx` on the error path rolls back and releases the lock.
        edit(&mut after)?;

        // Rows carrying duplicate task entries are rewritten normalized.
        let normalized = before.tasks.len() != project.tasks.len();
        if after == before && !normalized {
            tx.commit().await?;
            return Ok(project);
        }

        let saved = ProjectRepo::save_lifecycle(&mut *tx, id, &after).await?;
        tx.commit().await?;
        Ok(saved)
    }

    async fn list_in_flight(&self, limit: i64) -> Result<Vec<Project>, PipelineError> {
        Ok(ProjectRepo::list_in_flight(&self.pool, limit).await?)
    }
}
