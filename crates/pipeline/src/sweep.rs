//! Batch reconciliation of in-flight clip extraction jobs.

use serde::Serialize;

use crate::error::PipelineError;
use crate::lifecycle::{JobLifecycle, SyncOutcome};

/// Tally of one [`JobLifecycle::process_pending`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    /// Projects picked up by the sweep.
    pub checked: usize,
    pub completed: usize,
    pub failed: usize,
    /// Still running at the vendor.
    pub processing: usize,
    /// Projects whose sync returned an error; they are retried next sweep.
    pub errors: usize,
}

impl JobLifecycle {
    /// Sync up to `limit` projects with a running external job.
    ///
    /// Each project is synced independently: an error on one is logged and
    /// counted, and the sweep moves on to the next.
    pub async fn process_pending(&self, limit: i64) -> Result<SweepSummary, PipelineError> {
        if !self.vendor_configured() {
            return Err(PipelineError::VendorNotConfigured);
        }

        let projects = self.store().list_in_flight(limit).await?;
        let mut summary = SweepSummary {
            checked: projects.len(),
            ..Default::default()
        };

        for project in projects {
            match self.sync_project(project.id).await {
                Ok(SyncOutcome::Completed { clip_count }) => {
                    tracing::debug!(project_id = project.id, clip_count, "Sweep completed project");
                    summary.completed += 1;
                }
                Ok(SyncOutcome::Failed { .. }) => summary.failed += 1,
                Ok(SyncOutcome::Processing { .. }) => summary.processing += 1,
                Err(e) => {
                    tracing::warn!(project_id = project.id, error = %e, "Sweep failed to sync project");
                    summary.errors += 1;
                }
            }
        }

        if summary.checked > 0 {
            tracing::info!(
                checked = summary.checked,
                completed = summary.completed,
                failed = summary.failed,
                processing = summary.processing,
                errors = summary.errors,
                "Clip job sweep finished",
            );
        }
        Ok(summary)
    }
}
