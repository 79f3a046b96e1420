//! Repository for the `projects` table.

use inflio_core::project::ProjectStatus;
use inflio_core::task::{ProcessingTask, TaskStatus, TaskType};
use inflio_core::types::DbId;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::models::project::{CreateProject, Project, ProjectLifecycle, UpdateProject};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "\
    id, user_id, title, description, video_url, thumbnail_url, status_id, \
    tasks, folders, content_analysis, \
    klap_project_id, klap_folder_id, klap_dispatch_started_at, \
    created_at, updated_at";

/// Maximum page size for project listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for project listing.
const DEFAULT_LIMIT: i64 = 50;

/// Clamp a caller-supplied page size into `1..=MAX_LIMIT`.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Clamp a caller-supplied offset to be non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

/// Provides CRUD and lifecycle persistence for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new draft project owned by `user_id`.
    pub async fn create(
        pool: &PgPool,
        user_id: &str,
        input: &CreateProject,
        tasks: &[ProcessingTask],
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (user_id, title, description, video_url, thumbnail_url, status_id, tasks) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(user_id)
            .bind(input.title.trim())
            .bind(&input.description)
            .bind(&input.video_url)
            .bind(&input.thumbnail_url)
            .bind(ProjectStatus::Draft.id())
            .bind(Json(tasks))
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's projects, most recently created first.
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(user_id)
            .bind(clamp_limit(limit))
            .bind(clamp_offset(offset))
            .fetch_all(pool)
            .await
    }

    /// Update descriptive fields. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                thumbnail_url = COALESCE($4, thumbnail_url),
                content_analysis = COALESCE($5, content_analysis)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(input.title.as_deref().map(str::trim))
            .bind(&input.description)
            .bind(&input.thumbnail_url)
            .bind(&input.content_analysis)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a project. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Load a project and lock its row until the surrounding transaction ends.
    ///
    /// Every lifecycle write goes through this lock so concurrent dispatches
    /// and materializations serialize on the row.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Persist a lifecycle snapshot taken from a row locked with
    /// [`find_for_update`](Self::find_for_update).
    pub async fn save_lifecycle(
        conn: &mut PgConnection,
        id: DbId,
        lifecycle: &ProjectLifecycle,
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET \
                status_id = $2, tasks = $3, folders = $4, \
                klap_project_id = $5, klap_folder_id = $6, klap_dispatch_started_at = $7 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(lifecycle.status.id())
            .bind(Json(&lifecycle.tasks))
            .bind(Json(&lifecycle.folders))
            .bind(&lifecycle.klap_project_id)
            .bind(&lifecycle.klap_folder_id)
            .bind(lifecycle.klap_dispatch_started_at)
            .fetch_one(conn)
            .await
    }

    /// Projects whose clips task is processing with a stored vendor job id,
    /// least recently touched first.
    pub async fn list_in_flight(pool: &PgPool, limit: i64) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects \
             WHERE klap_project_id IS NOT NULL \
               AND EXISTS ( \
                   SELECT 1 FROM jsonb_array_elements(tasks) AS t \
                   WHERE t->>'type' = $1 AND t->>'status' = $2 \
               ) \
             ORDER BY updated_at ASC, id ASC \
             LIMIT $3"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(TaskType::Clips.as_str())
            .bind(TaskStatus::Processing.as_str())
            .bind(limit.clamp(1, MAX_LIMIT))
            .fetch_all(pool)
            .await
    }
}
