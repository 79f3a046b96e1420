//! Project entity model and DTOs.

use inflio_core::clip::Clip;
use inflio_core::project::{ProjectFolders, ProjectStatus, StatusId};
use inflio_core::task::{find_task, normalize_tasks, ProcessingTask, TaskType};
use inflio_core::types::{DbId, Timestamp, UserId};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use sqlx::types::Json;
use sqlx::FromRow;

/// A project row from the `projects` table.
///
/// Serializes with the status name next to `status_id`, and with duplicate
/// task entries dropped.
#[derive(Debug, Clone, FromRow)]
pub struct Project {
    pub id: DbId,
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub status_id: StatusId,
    pub tasks: Json<Vec<ProcessingTask>>,
    pub folders: Json<ProjectFolders>,
    pub content_analysis: Option<serde_json::Value>,
    pub klap_project_id: Option<String>,
    pub klap_folder_id: Option<String>,
    pub klap_dispatch_started_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    pub fn task(&self, task_type: TaskType) -> Option<&ProcessingTask> {
        find_task(&self.tasks, task_type)
    }

    pub fn clips(&self) -> &[Clip] {
        &self.folders.clips
    }

    /// Copy out the fields the job lifecycle is allowed to change.
    pub fn lifecycle(&self) -> ProjectLifecycle {
        ProjectLifecycle {
            status: ProjectStatus::from_id(self.status_id).unwrap_or(ProjectStatus::Draft),
            tasks: normalize_tasks(self.tasks.0.clone()),
            folders: self.folders.0.clone(),
            klap_project_id: self.klap_project_id.clone(),
            klap_folder_id: self.klap_folder_id.clone(),
            klap_dispatch_started_at: self.klap_dispatch_started_at,
        }
    }

    /// Write a lifecycle snapshot back onto the row.
    pub fn apply_lifecycle(&mut self, lifecycle: ProjectLifecycle) {
        self.status_id = lifecycle.status.id();
        self.tasks = Json(lifecycle.tasks);
        self.folders = Json(lifecycle.folders);
        self.klap_project_id = lifecycle.klap_project_id;
        self.klap_folder_id = lifecycle.klap_folder_id;
        self.klap_dispatch_started_at = lifecycle.klap_dispatch_started_at;
    }
}

impl Serialize for Project {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let status = ProjectStatus::from_id(self.status_id).ok();
        let tasks = normalize_tasks(self.tasks.0.clone());

        let mut state = serializer.serialize_struct("Project", 16)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("user_id", &self.user_id)?;
        state.serialize_field("title", &self.title)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("video_url", &self.video_url)?;
        state.serialize_field("thumbnail_url", &self.thumbnail_url)?;
        state.serialize_field("status_id", &self.status_id)?;
        state.serialize_field("status", &status)?;
        state.serialize_field("tasks", &tasks)?;
        state.serialize_field("folders", &self.folders.0)?;
        state.serialize_field("content_analysis", &self.content_analysis)?;
        state.serialize_field("klap_project_id", &self.klap_project_id)?;
        state.serialize_field("klap_folder_id", &self.klap_folder_id)?;
        state.serialize_field("klap_dispatch_started_at", &self.klap_dispatch_started_at)?;
        state.serialize_field("created_at", &self.created_at)?;
        state.serialize_field("updated_at", &self.updated_at)?;
        state.end()
    }
}

/// The mutable lifecycle slice of a project, edited under a row lock.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectLifecycle {
    pub status: ProjectStatus,
    pub tasks: Vec<ProcessingTask>,
    pub folders: ProjectFolders,
    pub klap_project_id: Option<String>,
    pub klap_folder_id: Option<String>,
    pub klap_dispatch_started_at: Option<Timestamp>,
}

/// DTO for creating a new project.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub title: String,
    pub description: Option<String>,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    /// Task set to track. Defaults to transcription, clips, blog and social.
    pub tasks: Option<Vec<TaskType>>,
}

/// DTO for updating an existing project. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub content_analysis: Option<serde_json::Value>,
}
