//! Handlers for the `/personas` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use inflio_core::error::CoreError;
use inflio_core::persona::{validate_name, validate_status, MAX_IMAGES_PER_PERSONA};
use inflio_core::project::{ensure_owner, validate_http_url};
use inflio_core::types::DbId;
use inflio_db::models::persona::{
    CreatePersona, CreatePersonaImage, Persona, PersonaWithImages, UpdatePersonaStatus,
};
use inflio_db::repositories::PersonaRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

async fn load_owned_persona(state: &AppState, id: DbId, user: &AuthUser) -> AppResult<Persona> {
    let persona = PersonaRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Persona",
            id,
        }))?;
    ensure_owner(&persona.user_id, &user.user_id, "persona")?;
    Ok(persona)
}

/// GET /api/v1/personas
pub async fn list(user: AuthUser, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let personas = PersonaRepo::list_by_user(&state.pool, &user.user_id).await?;
    Ok(Json(DataResponse { data: personas }))
}

/// POST /api/v1/personas
pub async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePersona>,
) -> AppResult<impl IntoResponse> {
    validate_name(&input.name)?;

    let persona = PersonaRepo::create(&state.pool, &user.user_id, &input).await?;
    tracing::info!(persona_id = persona.id, user_id = %user.user_id, "Persona created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: persona })))
}

/// GET /api/v1/personas/{id}
pub async fn get_by_id(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let persona = load_owned_persona(&state, id, &user).await?;
    let images = PersonaRepo::list_images(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: PersonaWithImages { persona, images },
    }))
}

/// PATCH /api/v1/personas/{id}
pub async fn update_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdatePersonaStatus>,
) -> AppResult<impl IntoResponse> {
    validate_status(&input.status)?;
    load_owned_persona(&state, id, &user).await?;

    let persona = PersonaRepo::update_status(&state.pool, id, &input.status)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Persona",
            id,
        }))?;
    Ok(Json(DataResponse { data: persona }))
}

/// DELETE /api/v1/personas/{id}
///
/// Portraits are removed with the persona.
pub async fn delete(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    load_owned_persona(&state, id, &user).await?;

    if PersonaRepo::delete(&state.pool, id).await? {
        tracing::info!(persona_id = id, user_id = %user.user_id, "Persona deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Persona",
            id,
        }))
    }
}

/// POST /api/v1/personas/{id}/images
pub async fn add_image(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreatePersonaImage>,
) -> AppResult<impl IntoResponse> {
    validate_http_url("image_url", &input.image_url)?;
    load_owned_persona(&state, id, &user).await?;

    let image = PersonaRepo::add_image(&state.pool, id, &input, MAX_IMAGES_PER_PERSONA)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(format!(
                "Persona {id} already has {MAX_IMAGES_PER_PERSONA} images"
            )))
        })?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: image })))
}
