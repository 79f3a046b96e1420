use std::sync::Arc;

use inflio_pipeline::{JobLifecycle, ProjectStore};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; inner data is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (personas, health check).
    pub pool: inflio_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Clip job lifecycle; also owns the project store.
    pub lifecycle: Arc<JobLifecycle>,
}

impl AppState {
    pub fn projects(&self) -> &Arc<dyn ProjectStore> {
        self.lifecycle.store()
    }
}
