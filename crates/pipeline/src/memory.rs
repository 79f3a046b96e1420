//! In-process [`ProjectStore`] for tests and local runs without Postgres.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use inflio_core::error::CoreError;
use inflio_core::project::{ProjectFolders, ProjectStatus};
use inflio_core::task::{ProcessingTask, TaskStatus, TaskType};
use inflio_core::types::DbId;
use inflio_db::models::project::{CreateProject, Project, UpdateProject};
use inflio_db::repositories::project_repo::{clamp_limit, clamp_offset};
use sqlx::types::Json;

use crate::error::PipelineError;
use crate::store::{LifecycleEdit, ProjectStore};

#[derive(Default)]
struct Inner {
    next_id: DbId,
    projects: HashMap<DbId, Project>,
}

/// Projects kept in a mutex-guarded map. Lifecycle edits run while the
/// mutex is held, which gives the same serialization as a row lock.
#[derive(Default)]
pub struct MemoryProjectStore {
    inner: Mutex<Inner>,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, PipelineError> {
        self.inner
            .lock()
            .map_err(|_| CoreError::Internal("project store mutex poisoned".into()).into())
    }
}

#[async_trait]
impl ProjectStore for MemoryProjectStore {
    async fn create(
        &self,
        user_id: &str,
        input: &CreateProject,
        tasks: Vec<ProcessingTask>,
    ) -> Result<Project, PipelineError> {
        let mut inner = self.lock()?;
        inner.next_id += 1;
        let now = Utc::now();
        let project = Project {
            id: inner.next_id,
            user_id: user_id.to_string(),
            title: input.title.trim().to_string(),
            description: input.description.clone(),
            video_url: input.video_url.clone(),
            thumbnail_url: input.thumbnail_url.clone(),
            status_id: ProjectStatus::Draft.id(),
            tasks: Json(tasks),
            folders: Json(ProjectFolders::default()),
            content_analysis: None,
            klap_project_id: None,
            klap_folder_id: None,
            klap_dispatch_started_at: None,
            created_at: now,
            updated_at: now,
        };
        inner.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn find(&self, id: DbId) -> Result<Option<Project>, PipelineError> {
        Ok(self.lock()?.projects.get(&id).cloned())
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Project>, PipelineError> {
        let inner = self.lock()?;
        let mut projects: Vec<Project> = inner
            .projects
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(projects
            .into_iter()
            .skip(clamp_offset(offset) as usize)
            .take(clamp_limit(limit) as usize)
            .collect())
    }

    async fn update(
        &self,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, PipelineError> {
        let mut inner = self.lock()?;
        let Some(project) = inner.projects.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = &input.title {
            project.title = title.trim().to_string();
        }
        if let Some(description) = &input.description {
            project.description = Some(description.clone());
        }
        if let Some(thumbnail_url) = &input.thumbnail_url {
            project.thumbnail_url = Some(thumbnail_url.clone());
        }
        if let Some(analysis) = &input.content_analysis {
            project.content_analysis = Some(analysis.clone());
        }
        project.updated_at = Utc::now();
        Ok(Some(project.clone()))
    }

    async fn delete(&self, id: DbId) -> Result<bool, PipelineError> {
        Ok(self.lock()?.projects.remove(&id).is_some())
    }

    async fn edit_lifecycle(
        &self,
        id: DbId,
        edit: LifecycleEdit,
    ) -> Result<Project, PipelineError> {
        let mut inner = self.lock()?;
        let project = inner.projects.get_mut(&id).ok_or(CoreError::NotFound {
            entity: "Project",
            id,
        })?;

        let before = project.lifecycle();
        let mut after = before.clone();
        edit(&mut after)?;

        let normalized = before.tasks.len() != project.tasks.len();
        if after != before || normalized {
            project.apply_lifecycle(after);
            project.updated_at = Utc::now();
        }
        Ok(project.clone())
    }

    async fn list_in_flight(&self, limit: i64) -> Result<Vec<Project>, PipelineError> {
        let inner = self.lock()?;
        let mut projects: Vec<Project> = inner
            .projects
            .values()
            .filter(|p| {
                p.klap_project_id.is_some()
                    && p.task(TaskType::Clips)
                        .is_some_and(|t| t.status == TaskStatus::Processing)
            })
            .cloned()
            .collect();
        projects.sort_by_key(|p| (p.updated_at, p.id));
        projects.truncate(limit.max(1) as usize);
        Ok(projects)
    }
}
