//! Worker and cron trigger routes.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::worker;
use crate::state::AppState;

/// ```text
/// POST     /worker/klap    -> run_sweep
/// GET|POST /cron/klap      -> cron
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/worker/klap", post(worker::run_sweep))
        .route("/cron/klap", get(worker::cron).post(worker::cron))
}
