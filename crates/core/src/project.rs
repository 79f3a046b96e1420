//! Project-level rules: status derivation, folders, validation and ownership.

use serde::{Deserialize, Serialize};

use crate::clip::Clip;
use crate::error::CoreError;
use crate::task::{ProcessingTask, TaskStatus, TaskType};

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 5_000;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Project lifecycle status. Discriminants match the `project_statuses`
/// seed rows.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Draft = 1,
    Processing = 2,
    Ready = 3,
    Published = 4,
}

impl ProjectStatus {
    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    pub fn from_id(id: StatusId) -> Result<Self, CoreError> {
        match id {
            1 => Ok(ProjectStatus::Draft),
            2 => Ok(ProjectStatus::Processing),
            3 => Ok(ProjectStatus::Ready),
            4 => Ok(ProjectStatus::Published),
            other => Err(CoreError::Internal(format!(
                "Unknown project status id {other}"
            ))),
        }
    }
}

impl From<ProjectStatus> for StatusId {
    fn from(value: ProjectStatus) -> Self {
        value as StatusId
    }
}

/// Recompute a project's status from its tasks.
///
/// `published` is sticky. Otherwise any processing task makes the project
/// `processing`, a non-empty all-completed task list makes it `ready`, and
/// everything else is `draft`.
pub fn derive_status(current: ProjectStatus, tasks: &[ProcessingTask]) -> ProjectStatus {
    if current == ProjectStatus::Published {
        return current;
    }
    if tasks.iter().any(|t| t.status == TaskStatus::Processing) {
        return ProjectStatus::Processing;
    }
    if !tasks.is_empty() && tasks.iter().all(|t| t.status == TaskStatus::Completed) {
        return ProjectStatus::Ready;
    }
    ProjectStatus::Draft
}

// ---------------------------------------------------------------------------
// Folders
// ---------------------------------------------------------------------------

/// Derived artifacts grouped by kind (`folders` JSONB column).
///
/// Blog and social entries are produced by the content generators and
/// stored verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectFolders {
    #[serde(default)]
    pub clips: Vec<Clip>,
    #[serde(default)]
    pub blog: Vec<serde_json::Value>,
    #[serde(default)]
    pub social: Vec<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate_title(title: &str) -> Result<(), CoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Title must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::Validation(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_description(description: Option<&str>) -> Result<(), CoreError> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LEN => Err(CoreError::Validation(format!(
            "Description must be at most {MAX_DESCRIPTION_LEN} characters"
        ))),
        _ => Ok(()),
    }
}

/// Source and asset URLs must be absolute http(s) URLs with a host.
pub fn validate_http_url(field: &str, value: &str) -> Result<(), CoreError> {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"))
        .ok_or_else(|| CoreError::Validation(format!("{field} must be an http(s) URL")))?;
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() || value.chars().any(char::is_whitespace) {
        return Err(CoreError::Validation(format!(
            "{field} must be an absolute URL with a host"
        )));
    }
    Ok(())
}

/// The clips task is driven by the clip pipeline only.
pub fn ensure_manually_updatable(task_type: TaskType) -> Result<(), CoreError> {
    if task_type == TaskType::Clips {
        return Err(CoreError::Validation(
            "The clips task is managed by the clip pipeline; use the clips endpoints".into(),
        ));
    }
    Ok(())
}

/// Reject access to a resource owned by another user.
pub fn ensure_owner(owner_id: &str, user_id: &str, entity: &str) -> Result<(), CoreError> {
    if owner_id != user_id {
        return Err(CoreError::Forbidden(format!(
            "Cannot access another user's {entity}"
        )));
    }
    Ok(())
}
