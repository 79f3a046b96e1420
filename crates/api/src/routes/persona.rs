//! Route definitions for the `/personas` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::persona;
use crate::state::AppState;

/// Routes mounted at `/personas`.
///
/// ```text
/// GET    /               -> list
/// POST   /               -> create
/// GET    /{id}           -> get_by_id
/// PATCH  /{id}           -> update_status
/// DELETE /{id}           -> delete
/// POST   /{id}/images    -> add_image
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(persona::list).post(persona::create))
        .route(
            "/{id}",
            get(persona::get_by_id)
                .patch(persona::update_status)
                .delete(persona::delete),
        )
        .route("/{id}/images", post(persona::add_image))
}
