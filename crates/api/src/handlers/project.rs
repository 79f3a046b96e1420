//! Handlers for the `/projects` resource and its task tracker.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use inflio_core::error::CoreError;
use inflio_core::project::{ensure_owner, validate_description, validate_http_url, validate_title};
use inflio_core::task::{default_tasks, TaskType, TaskUpdate};
use inflio_core::types::DbId;
use inflio_db::models::project::{CreateProject, Project, UpdateProject};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Load a project and check that `user` owns it.
pub(crate) async fn load_owned_project(
    state: &AppState,
    id: DbId,
    user: &AuthUser,
) -> AppResult<Project> {
    let project = state
        .projects()
        .find(id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;
    ensure_owner(&project.user_id, &user.user_id, "project")?;
    Ok(project)
}

/// GET /api/v1/projects
pub async fn list(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let projects = state
        .projects()
        .list_by_user(&user.user_id, params.limit, params.offset)
        .await?;
    Ok(Json(DataResponse { data: projects }))
}

/// POST /api/v1/projects
pub async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateProject>,
) -> AppResult<impl IntoResponse> {
    validate_title(&input.title)?;
    validate_description(input.description.as_deref())?;
    validate_http_url("video_url", &input.video_url)?;
    if let Some(thumbnail_url) = &input.thumbnail_url {
        validate_http_url("thumbnail_url", thumbnail_url)?;
    }

    let task_types: Vec<TaskType> = match &input.tasks {
        Some(types) if types.is_empty() => {
            return Err(AppError::BadRequest(
                "tasks must name at least one task type".into(),
            ));
        }
        Some(types) => types.clone(),
        None => TaskType::DEFAULT_SET.to_vec(),
    };

    let project = state
        .projects()
        .create(&user.user_id, &input, default_tasks(&task_types))
        .await?;

    tracing::info!(
        project_id = project.id,
        user_id = %user.user_id,
        task_count = project.tasks.len(),
        "Project created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let project = load_owned_project(&state, id, &user).await?;
    Ok(Json(DataResponse { data: project }))
}

/// PUT /api/v1/projects/{id}
pub async fn update(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProject>,
) -> AppResult<impl IntoResponse> {
    load_owned_project(&state, id, &user).await?;

    if let Some(title) = &input.title {
        validate_title(title)?;
    }
    validate_description(input.description.as_deref())?;
    if let Some(thumbnail_url) = &input.thumbnail_url {
        validate_http_url("thumbnail_url", thumbnail_url)?;
    }

    let project = state
        .projects()
        .update(id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;
    Ok(Json(DataResponse { data: project }))
}

/// DELETE /api/v1/projects/{id}
pub async fn delete(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    load_owned_project(&state, id, &user).await?;

    if state.projects().delete(id).await? {
        tracing::info!(project_id = id, user_id = %user.user_id, "Project deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))
    }
}

/// PATCH /api/v1/projects/{id}/tasks/{task_type}
///
/// Progress and status updates pushed by the non-clip integrations
/// (transcription, blog, social, podcast).
pub async fn update_task(
    user: AuthUser,
    State(state): State<AppState>,
    Path((id, task_type)): Path<(DbId, String)>,
    Json(update): Json<TaskUpdate>,
) -> AppResult<impl IntoResponse> {
    let task_type = TaskType::parse(&task_type)?;
    load_owned_project(&state, id, &user).await?;

    let project = state.lifecycle.update_task(id, task_type, update).await?;
    Ok(Json(DataResponse { data: project }))
}
