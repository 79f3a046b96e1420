//! Route definitions for the `/projects` resource.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::{clips, project};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                          -> list
/// POST   /                          -> create
/// GET    /{id}                      -> get_by_id
/// PUT    /{id}                      -> update
/// DELETE /{id}                      -> delete
/// PATCH  /{id}/tasks/{task_type}    -> update_task
///
/// GET    /{id}/clips                -> clips::list
/// POST   /{id}/clips/start          -> clips::start
/// GET    /{id}/clips/status         -> clips::status
/// POST   /{id}/clips/restart        -> clips::restart
/// POST   /{id}/clips/process        -> clips::process
/// GET    /{id}/clips/duplicates     -> clips::duplicates
/// POST   /{id}/clips/dedupe         -> clips::dedupe
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list).post(project::create))
        .route(
            "/{id}",
            get(project::get_by_id)
                .put(project::update)
                .delete(project::delete),
        )
        .route("/{id}/tasks/{task_type}", patch(project::update_task))
        .route("/{id}/clips", get(clips::list))
        .route("/{id}/clips/start", post(clips::start))
        .route("/{id}/clips/status", get(clips::status))
        .route("/{id}/clips/restart", post(clips::restart))
        .route("/{id}/clips/process", post(clips::process))
        .route("/{id}/clips/duplicates", get(clips::duplicates))
        .route("/{id}/clips/dedupe", post(clips::dedupe))
}
