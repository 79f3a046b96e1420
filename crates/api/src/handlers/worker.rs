//! Trigger endpoints for the clip job sweep.
//!
//! Both run [`inflio_pipeline::JobLifecycle::process_pending`] in-process;
//! they differ only in which shared secret they accept.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::{CronAuth, WorkerAuth};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/worker/klap
pub async fn run_sweep(
    _auth: WorkerAuth,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let summary = state
        .lifecycle
        .process_pending(state.config.sweep_batch_size)
        .await?;
    Ok(Json(DataResponse { data: summary }))
}

/// GET|POST /api/v1/cron/klap
pub async fn cron(_auth: CronAuth, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    tracing::info!("Cron trigger received for clip job sweep");
    let summary = state
        .lifecycle
        .process_pending(state.config.sweep_batch_size)
        .await?;
    Ok(Json(DataResponse { data: summary }))
}
