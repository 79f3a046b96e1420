pub mod health;
pub mod persona;
pub mod project;
pub mod trigger;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /projects                                  list, create
/// /projects/{id}                             get, update, delete
/// /projects/{id}/tasks/{task_type}           task progress/status (PATCH)
/// /projects/{id}/clips                       list clips
/// /projects/{id}/clips/start                 dispatch extraction job (POST)
/// /projects/{id}/clips/status                job status (?refresh=true)
/// /projects/{id}/clips/restart               clear job and dispatch again (POST)
/// /projects/{id}/clips/process               poll vendor now (POST)
/// /projects/{id}/clips/duplicates            duplicate clip ids (GET)
/// /projects/{id}/clips/dedupe                remove duplicate clips (POST)
///
/// /personas                                  list, create
/// /personas/{id}                             get, update status, delete
/// /personas/{id}/images                      add portrait (POST)
///
/// /worker/klap                               sweep (Bearer WORKER_SECRET)
/// /cron/klap                                 sweep (Bearer CRON_SECRET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/projects", project::router())
        .nest("/personas", persona::router())
        .merge(trigger::router())
}
