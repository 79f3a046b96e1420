//! Handlers for a project's clip folder and its extraction job.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use inflio_core::clip::find_duplicate_ids;
use inflio_core::error::CoreError;
use inflio_core::task::{TaskStatus, TaskType};
use inflio_core::types::{DbId, Timestamp};
use inflio_db::models::project::Project;
use inflio_pipeline::{PipelineError, SyncOutcome};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::handlers::project::load_owned_project;
use crate::middleware::auth::AuthUser;
use crate::query::RefreshParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Optional body of the start and restart endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct StartClipsRequest {
    /// Video to process. Defaults to the project's `video_url`.
    pub source_url: Option<String>,
}

/// Read-only projection of a project's clip job.
#[derive(Debug, Serialize)]
pub struct ClipJobStatus {
    pub project_id: DbId,
    pub status: TaskStatus,
    pub progress: u8,
    pub external_job_id: Option<String>,
    pub result_ref: Option<String>,
    pub clip_count: usize,
    pub error: Option<String>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}

impl From<&Project> for ClipJobStatus {
    fn from(project: &Project) -> Self {
        let task = project.task(TaskType::Clips);
        Self {
            project_id: project.id,
            status: task.map_or(TaskStatus::Pending, |t| t.status),
            progress: task.map_or(0, |t| t.progress),
            external_job_id: project.klap_project_id.clone(),
            result_ref: project.klap_folder_id.clone(),
            clip_count: project.clips().len(),
            error: task.and_then(|t| t.error.clone()),
            started_at: task.and_then(|t| t.started_at),
            completed_at: task.and_then(|t| t.completed_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub outcome: SyncOutcome,
    pub job: ClipJobStatus,
}

#[derive(Debug, Serialize)]
pub struct DuplicateReport {
    pub total: usize,
    pub unique: usize,
    pub duplicate_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DedupeResponse {
    pub removed: usize,
    pub clip_count: usize,
}

async fn job_status(state: &AppState, id: DbId) -> AppResult<ClipJobStatus> {
    let project = state
        .projects()
        .find(id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Project",
            id,
        })?;
    Ok(ClipJobStatus::from(&project))
}

/// GET /api/v1/projects/{id}/clips
pub async fn list(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let project = load_owned_project(&state, id, &user).await?;
    Ok(Json(DataResponse {
        data: project.folders.0.clips,
    }))
}

/// POST /api/v1/projects/{id}/clips/start
///
/// Dispatches the clip extraction job. Fails with 409 if one already exists.
pub async fn start(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<StartClipsRequest>>,
) -> AppResult<impl IntoResponse> {
    let project = load_owned_project(&state, id, &user).await?;
    let source_url = body
        .and_then(|Json(b)| b.source_url)
        .unwrap_or(project.video_url);

    state.lifecycle.start_job(id, &source_url).await?;

    let status = job_status(&state, id).await?;
    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: status })))
}

/// GET /api/v1/projects/{id}/clips/status
///
/// With `?refresh=true` an in-flight job is polled first. A failed vendor
/// call is logged and the stored state returned.
pub async fn status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<RefreshParams>,
) -> AppResult<impl IntoResponse> {
    let project = load_owned_project(&state, id, &user).await?;

    let in_flight = project.klap_project_id.is_some()
        && project
            .task(TaskType::Clips)
            .is_some_and(|t| t.status == TaskStatus::Processing);

    if !(params.refresh && in_flight) {
        return Ok(Json(DataResponse {
            data: ClipJobStatus::from(&project),
        }));
    }

    match state.lifecycle.sync_project(id).await {
        Ok(_) => {}
        Err(PipelineError::Vendor(e)) => {
            tracing::warn!(project_id = id, error = %e, "Status refresh could not reach the clip vendor");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Json(DataResponse {
        data: job_status(&state, id).await?,
    }))
}

/// POST /api/v1/projects/{id}/clips/restart
///
/// Clears the stored job and dispatches again. Existing clips are kept.
pub async fn restart(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<StartClipsRequest>>,
) -> AppResult<impl IntoResponse> {
    let project = load_owned_project(&state, id, &user).await?;
    let source_url = body
        .and_then(|Json(b)| b.source_url)
        .unwrap_or(project.video_url);

    state.lifecycle.restart_job(id, &source_url).await?;
    tracing::info!(project_id = id, user_id = %user.user_id, "Clip extraction restarted");

    let status = job_status(&state, id).await?;
    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: status })))
}

/// POST /api/v1/projects/{id}/clips/process
///
/// Polls the vendor now and applies the result.
pub async fn process(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    load_owned_project(&state, id, &user).await?;

    let outcome = state.lifecycle.sync_project(id).await?;
    let job = job_status(&state, id).await?;
    Ok(Json(DataResponse {
        data: ProcessResponse { outcome, job },
    }))
}

/// GET /api/v1/projects/{id}/clips/duplicates
pub async fn duplicates(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let project = load_owned_project(&state, id, &user).await?;
    let clips = project.clips();
    let duplicate_ids = find_duplicate_ids(clips);
    let unique = clips
        .iter()
        .map(|c| c.id.as_str())
        .collect::<std::collections::HashSet<_>>()
        .len();

    Ok(Json(DataResponse {
        data: DuplicateReport {
            total: clips.len(),
            unique,
            duplicate_ids,
        },
    }))
}

/// POST /api/v1/projects/{id}/clips/dedupe
pub async fn dedupe(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    load_owned_project(&state, id, &user).await?;

    let removed = state.lifecycle.dedupe_folder(id).await?;
    let clip_count = job_status(&state, id).await?.clip_count;
    Ok(Json(DataResponse {
        data: DedupeResponse {
            removed,
            clip_count,
        },
    }))
}
