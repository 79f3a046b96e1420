//! Per-capability processing tasks embedded in a project row.
//!
//! A project carries at most one [`ProcessingTask`] per [`TaskType`]. Tasks
//! move through `pending -> processing -> completed`, with `failed`
//! reachable from `pending` and `processing`. Progress is monotonic while a
//! task is processing and reaches 100 only on completion.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Highest progress value a task may report before it is completed.
pub const MAX_IN_FLIGHT_PROGRESS: u8 = 99;

/// Progress value of a completed task.
pub const COMPLETE_PROGRESS: u8 = 100;

// ---------------------------------------------------------------------------
// Task type
// ---------------------------------------------------------------------------

/// The capability a task tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Transcription,
    Clips,
    Blog,
    Social,
    Podcast,
}

impl TaskType {
    pub const ALL: [TaskType; 5] = [
        TaskType::Transcription,
        TaskType::Clips,
        TaskType::Blog,
        TaskType::Social,
        TaskType::Podcast,
    ];

    /// Task set created for a project when the caller does not pick one.
    pub const DEFAULT_SET: [TaskType; 4] = [
        TaskType::Transcription,
        TaskType::Clips,
        TaskType::Blog,
        TaskType::Social,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::Transcription => "transcription",
            TaskType::Clips => "clips",
            TaskType::Blog => "blog",
            TaskType::Social => "social",
            TaskType::Podcast => "podcast",
        }
    }

    /// Parse a path or query segment into a task type.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == value)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Unknown task type '{value}'. Expected one of: transcription, clips, blog, social, podcast"
                ))
            })
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Task status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Processing task
// ---------------------------------------------------------------------------

/// One entry of a project's `tasks` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingTask {
    pub id: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessingTask {
    /// A fresh pending task with zero progress.
    pub fn new(task_type: TaskType) -> Self {
        Self {
            id: format!("{task_type}-{}", uuid::Uuid::new_v4()),
            task_type,
            status: TaskStatus::Pending,
            progress: 0,
            started_at: None,
            completed_at: None,
            error: None,
        }
    }

    /// `pending | failed -> processing`.
    pub fn begin(&mut self) -> Result<(), CoreError> {
        match self.status {
            TaskStatus::Pending | TaskStatus::Failed => {
                self.status = TaskStatus::Processing;
                self.started_at = Some(chrono::Utc::now());
                self.completed_at = None;
                self.error = None;
                Ok(())
            }
            TaskStatus::Processing => Err(CoreError::Conflict(format!(
                "Task '{}' is already processing",
                self.task_type
            ))),
            TaskStatus::Completed => Err(CoreError::Conflict(format!(
                "Task '{}' is already completed; reset it before starting again",
                self.task_type
            ))),
        }
    }

    /// Raise progress of a processing task.
    ///
    /// Values at or below the current progress are ignored and reported as
    /// `Ok(false)`. Values are clamped to [`MAX_IN_FLIGHT_PROGRESS`].
    pub fn advance_progress(&mut self, progress: u8) -> Result<bool, CoreError> {
        if progress > COMPLETE_PROGRESS {
            return Err(CoreError::Validation(format!(
                "Progress must be between 0 and 100, got {progress}"
            )));
        }
        if self.status != TaskStatus::Processing {
            return Err(CoreError::Conflict(format!(
                "Cannot update progress of task '{}' in status '{}'",
                self.task_type, self.status
            )));
        }
        let clamped = progress.min(MAX_IN_FLIGHT_PROGRESS);
        if clamped <= self.progress {
            return Ok(false);
        }
        self.progress = clamped;
        Ok(true)
    }

    /// `processing -> completed`. Completing a completed task is a no-op.
    pub fn complete(&mut self) -> Result<(), CoreError> {
        match self.status {
            TaskStatus::Processing => {
                self.status = TaskStatus::Completed;
                self.progress = COMPLETE_PROGRESS;
                self.completed_at = Some(chrono::Utc::now());
                self.error = None;
                Ok(())
            }
            TaskStatus::Completed => Ok(()),
            other => Err(CoreError::Conflict(format!(
                "Cannot complete task '{}' from status '{other}'",
                self.task_type
            ))),
        }
    }

    /// `pending | processing -> failed`. Progress is kept as a record of how
    /// far the task got.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), CoreError> {
        match self.status {
            TaskStatus::Pending | TaskStatus::Processing => {
                self.status = TaskStatus::Failed;
                self.error = Some(message.into());
                Ok(())
            }
            TaskStatus::Failed => Ok(()),
            TaskStatus::Completed => Err(CoreError::Conflict(format!(
                "Cannot fail task '{}' after it completed",
                self.task_type
            ))),
        }
    }

    /// Return to `pending` with no progress, from any status.
    pub fn reset(&mut self) {
        self.status = TaskStatus::Pending;
        self.progress = 0;
        self.started_at = None;
        self.completed_at = None;
        self.error = None;
    }
}

// ---------------------------------------------------------------------------
// Task collections
// ---------------------------------------------------------------------------

/// Build one pending task per distinct type, preserving first-seen order.
pub fn default_tasks(types: &[TaskType]) -> Vec<ProcessingTask> {
    let mut tasks: Vec<ProcessingTask> = Vec::with_capacity(types.len());
    for &task_type in types {
        if find_task(&tasks, task_type).is_none() {
            tasks.push(ProcessingTask::new(task_type));
        }
    }
    tasks
}

pub fn find_task(tasks: &[ProcessingTask], task_type: TaskType) -> Option<&ProcessingTask> {
    tasks.iter().find(|t| t.task_type == task_type)
}

/// Mutable access to the task of `task_type`, inserting a pending one if the
/// project does not carry it yet.
pub fn task_entry(tasks: &mut Vec<ProcessingTask>, task_type: TaskType) -> &mut ProcessingTask {
    let index = match tasks.iter().position(|t| t.task_type == task_type) {
        Some(index) => index,
        None => {
            tasks.push(ProcessingTask::new(task_type));
            tasks.len() - 1
        }
    };
    &mut tasks[index]
}

/// Drop every task whose type already appeared earlier in the list.
///
/// Rows written before the one-task-per-type rule may carry duplicates; the
/// first occurrence wins.
pub fn normalize_tasks(tasks: Vec<ProcessingTask>) -> Vec<ProcessingTask> {
    let mut normalized: Vec<ProcessingTask> = Vec::with_capacity(tasks.len());
    for task in tasks {
        if find_task(&normalized, task.task_type).is_none() {
            normalized.push(task);
        }
    }
    normalized
}

// ---------------------------------------------------------------------------
// Manual updates
// ---------------------------------------------------------------------------

/// A client-requested change to a task (`PATCH /projects/{id}/tasks/{type}`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskUpdate {
    pub status: Option<TaskStatus>,
    pub progress: Option<u8>,
    pub error: Option<String>,
}

/// Apply a [`TaskUpdate`] through the lifecycle transitions.
///
/// The status change runs first, then the progress bump, so
/// `{status: processing, progress: 20}` starts a pending task at 20%.
pub fn apply_update(task: &mut ProcessingTask, update: &TaskUpdate) -> Result<(), CoreError> {
    if update.status.is_none() && update.progress.is_none() {
        return Err(CoreError::Validation(
            "Task update must set status or progress".into(),
        ));
    }

    match update.status {
        Some(TaskStatus::Pending) => task.reset(),
        Some(TaskStatus::Processing) if task.status != TaskStatus::Processing => task.begin()?,
        Some(TaskStatus::Processing) => {}
        Some(TaskStatus::Completed) => task.complete()?,
        Some(TaskStatus::Failed) => {
            let message = update
                .error
                .clone()
                .unwrap_or_else(|| format!("Task '{}' failed", task.task_type));
            task.fail(message)?;
        }
        None => {}
    }

    if let Some(progress) = update.progress {
        if task.status == TaskStatus::Completed {
            if progress != COMPLETE_PROGRESS {
                return Err(CoreError::Conflict(format!(
                    "Task '{}' is completed; progress is fixed at 100",
                    task.task_type
                )));
            }
        } else {
            task.advance_progress(progress)?;
        }
    }

    Ok(())
}
