//! Dispatch, poll and materialize external clip-extraction jobs.
//!
//! State lives on the project row:
//!
//! ```text
//! klap_dispatch_started_at   claim taken before the vendor call
//! klap_project_id            vendor job id, set once dispatch succeeds
//! klap_folder_id             vendor result folder, set on materialization
//! tasks[type = clips]        pending -> processing -> completed | failed
//! ```
//!
//! There is no automatic retry and no job expiry. A failed job stays failed
//! until [`JobLifecycle::restart_job`] is called. A vendor error that cannot
//! clear on its own (see [`KlapError::is_transient`]) fails the task.
//! Transient ones leave the project untouched for the next sweep.

use std::sync::Arc;
use std::time::Duration;

use inflio_core::clip::{dedupe_clips, merge_clips, Clip};
use inflio_core::error::CoreError;
use inflio_core::project::{derive_status, ensure_manually_updatable, validate_http_url};
use inflio_core::task::{apply_update, task_entry, TaskStatus, TaskType, TaskUpdate};
use inflio_core::types::DbId;
use inflio_db::models::project::{Project, ProjectLifecycle};
use inflio_klap::{ClipVendor, JobPoll, JobState, KlapError};
use serde::Serialize;

use crate::error::PipelineError;
use crate::store::ProjectStore;

/// Progress recorded once the vendor accepts a job.
pub const DISPATCH_PROGRESS: u8 = 10;

/// Progress added per poll when the vendor does not report a percentage.
pub const POLL_PROGRESS_STEP: u8 = 10;

/// Estimated progress never passes this value without a vendor report.
pub const POLL_PROGRESS_CEILING: u8 = 90;

/// A dispatch claim younger than this belongs to a caller still waiting on
/// the vendor, and blocks a restart.
pub const DEFAULT_DISPATCH_CLAIM_TTL: Duration = Duration::from_secs(120);

/// Claim TTL for a vendor client with the given request timeout. Twice the
/// timeout, never below [`DEFAULT_DISPATCH_CLAIM_TTL`].
pub fn claim_ttl_for(vendor_timeout: Duration) -> Duration {
    vendor_timeout
        .saturating_mul(2)
        .max(DEFAULT_DISPATCH_CLAIM_TTL)
}

/// What a single [`JobLifecycle::sync_project`] call observed and applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SyncOutcome {
    Processing { progress: u8 },
    Completed { clip_count: usize },
    Failed { error: String },
}

/// Drives a project's clips task through the external vendor.
pub struct JobLifecycle {
    store: Arc<dyn ProjectStore>,
    vendor: Option<Arc<dyn ClipVendor>>,
    claim_ttl: Duration,
}

impl JobLifecycle {
    /// `vendor` is `None` when no clip vendor is configured; every vendor
    /// operation then fails with [`PipelineError::VendorNotConfigured`].
    pub fn new(store: Arc<dyn ProjectStore>, vendor: Option<Arc<dyn ClipVendor>>) -> Self {
        Self {
            store,
            vendor,
            claim_ttl: DEFAULT_DISPATCH_CLAIM_TTL,
        }
    }

    /// Override how long a dispatch claim without a job id is honoured.
    /// Should exceed the vendor request timeout.
    pub fn with_claim_ttl(mut self, claim_ttl: Duration) -> Self {
        self.claim_ttl = claim_ttl;
        self
    }

    pub fn store(&self) -> &Arc<dyn ProjectStore> {
        &self.store
    }

    pub fn vendor_configured(&self) -> bool {
        self.vendor.is_some()
    }

    fn vendor(&self) -> Result<&Arc<dyn ClipVendor>, PipelineError> {
        self.vendor.as_ref().ok_or(PipelineError::VendorNotConfigured)
    }

    async fn require_project(&self, project_id: DbId) -> Result<Project, PipelineError> {
        self.store.find(project_id).await?.ok_or_else(|| {
            PipelineError::Core(CoreError::NotFound {
                entity: "Project",
                id: project_id,
            })
        })
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Submit `source_url` to the vendor and record the returned job id.
    ///
    /// The project is claimed before the vendor is called, so of two
    /// concurrent callers only one dispatches; the other gets `Conflict`.
    /// A vendor failure releases the claim and marks the clips task failed.
    pub async fn start_job(
        &self,
        project_id: DbId,
        source_url: &str,
    ) -> Result<String, PipelineError> {
        let vendor = self.vendor()?;
        validate_http_url("source_url", source_url)?;

        self.store
            .edit_lifecycle(project_id, Box::new(claim_dispatch))
            .await?;

        match vendor.submit_job(source_url).await {
            Ok(external_job_id) => {
                let job_id = external_job_id.clone();
                let recorded = self
                    .store
                    .edit_lifecycle(
                        project_id,
                        Box::new(move |lc: &mut ProjectLifecycle| record_dispatch(lc, job_id)),
                    )
                    .await;

                if let Err(e) = recorded {
                    // The vendor job exists but is not linked; restart clears the claim.
                    tracing::error!(
                        project_id,
                        external_job_id = %external_job_id,
                        error = %e,
                        "Failed to record dispatched job",
                    );
                    return Err(e);
                }

                tracing::info!(
                    project_id,
                    external_job_id = %external_job_id,
                    "Clip extraction job dispatched",
                );
                Ok(external_job_id)
            }
            Err(vendor_err) => {
                let message = format!("Dispatch failed: {vendor_err}");
                tracing::warn!(project_id, error = %vendor_err, "Clip extraction dispatch failed");

                if let Err(e) = self
                    .store
                    .edit_lifecycle(
                        project_id,
                        Box::new(move |lc: &mut ProjectLifecycle| release_dispatch(lc, message)),
                    )
                    .await
                {
                    tracing::error!(project_id, error = %e, "Failed to release dispatch claim");
                }
                Err(vendor_err.into())
            }
        }
    }

    /// Clear the stored job, reset the clips task and dispatch again.
    ///
    /// Clips already in the folder are kept.
    pub async fn restart_job(
        &self,
        project_id: DbId,
        source_url: &str,
    ) -> Result<String, PipelineError> {
        self.vendor()?;
        validate_http_url("source_url", source_url)?;

        let claim_ttl = self.claim_ttl;
        self.store
            .edit_lifecycle(
                project_id,
                Box::new(move |lc: &mut ProjectLifecycle| reset_job(lc, claim_ttl)),
            )
            .await?;
        tracing::info!(project_id, "Clip extraction job reset for restart");

        self.start_job(project_id, source_url).await
    }

    // -----------------------------------------------------------------------
    // Poll
    // -----------------------------------------------------------------------

    /// Ask the vendor for the state of an external job. Writes nothing.
    pub async fn poll_job(&self, external_job_id: &str) -> Result<JobPoll, PipelineError> {
        Ok(self.vendor()?.poll_job(external_job_id).await?)
    }

    /// Poll the project's external job and apply what the vendor reports.
    ///
    /// A vendor call that fails (as opposed to reporting a failed job)
    /// returns an error and leaves the project untouched.
    pub async fn sync_project(&self, project_id: DbId) -> Result<SyncOutcome, PipelineError> {
        let project = self.require_project(project_id).await?;

        let external_job_id = project.klap_project_id.clone().ok_or_else(|| {
            CoreError::Validation(format!(
                "Project {project_id} has no clip extraction job to poll"
            ))
        })?;

        if let Some(task) = project.task(TaskType::Clips) {
            if task.status == TaskStatus::Completed && project.klap_folder_id.is_some() {
                return Ok(SyncOutcome::Completed {
                    clip_count: project.clips().len(),
                });
            }
        }

        let poll = match self.poll_job(&external_job_id).await {
            Ok(poll) => poll,
            Err(PipelineError::Vendor(e)) if !e.is_transient() => {
                return self
                    .fail_on_vendor_error(project_id, &external_job_id, "Polling", e)
                    .await;
            }
            Err(e) => return Err(e),
        };

        match poll.state {
            JobState::Processing => {
                let reported = poll.progress;
                let saved = self
                    .store
                    .edit_lifecycle(
                        project_id,
                        Box::new(move |lc: &mut ProjectLifecycle| record_progress(lc, reported)),
                    )
                    .await?;
                let progress = saved.task(TaskType::Clips).map_or(0, |t| t.progress);
                tracing::debug!(project_id, progress, "Clip extraction still processing");
                Ok(SyncOutcome::Processing { progress })
            }
            JobState::Done => {
                let result_ref = poll.result_ref.ok_or_else(|| {
                    CoreError::Internal(format!(
                        "Vendor job {external_job_id} finished without a result reference"
                    ))
                })?;
                match self.materialize_results(project_id, &result_ref).await {
                    Ok(clips) => Ok(SyncOutcome::Completed {
                        clip_count: clips.len(),
                    }),
                    Err(PipelineError::Vendor(e)) if !e.is_transient() => {
                        self.fail_on_vendor_error(
                            project_id,
                            &external_job_id,
                            "Fetching results",
                            e,
                        )
                        .await
                    }
                    Err(e) => Err(e),
                }
            }
            JobState::Failed => {
                let error = poll
                    .error
                    .unwrap_or_else(|| "Clip extraction failed at the vendor".to_string());
                let message = error.clone();
                self.store
                    .edit_lifecycle(
                        project_id,
                        Box::new(move |lc: &mut ProjectLifecycle| record_failure(lc, message)),
                    )
                    .await?;
                tracing::warn!(
                    project_id,
                    external_job_id = %external_job_id,
                    error = %error,
                    "Clip extraction job failed",
                );
                Ok(SyncOutcome::Failed { error })
            }
        }
    }

    /// Record a vendor error that will not clear on retry as a job failure.
    async fn fail_on_vendor_error(
        &self,
        project_id: DbId,
        external_job_id: &str,
        stage: &str,
        vendor_err: KlapError,
    ) -> Result<SyncOutcome, PipelineError> {
        let error = format!("{stage} failed: {vendor_err}");
        let message = error.clone();
        self.store
            .edit_lifecycle(
                project_id,
                Box::new(move |lc: &mut ProjectLifecycle| record_failure(lc, message)),
            )
            .await?;
        tracing::warn!(
            project_id,
            external_job_id = %external_job_id,
            error = %vendor_err,
            "Clip extraction job failed on a permanent vendor error",
        );
        Ok(SyncOutcome::Failed { error })
    }

    // -----------------------------------------------------------------------
    // Materialize
    // -----------------------------------------------------------------------

    /// Fetch the vendor's clips under `result_ref` and append them to the
    /// project's clip folder, then complete the clips task.
    ///
    /// Clips already present (by id) are skipped, so repeated calls with the
    /// same result set leave the folder unchanged. Returns the full folder.
    pub async fn materialize_results(
        &self,
        project_id: DbId,
        result_ref: &str,
    ) -> Result<Vec<Clip>, PipelineError> {
        let vendor = self.vendor()?;
        let project = self.require_project(project_id).await?;
        if project.klap_project_id.is_none() {
            return Err(no_external_job(project_id).into());
        }

        let incoming = vendor.fetch_results(result_ref).await?;
        let fetched = incoming.len();
        let before = project.clips().len();

        let folder_id = result_ref.to_string();
        let saved = self
            .store
            .edit_lifecycle(
                project_id,
                Box::new(move |lc: &mut ProjectLifecycle| {
                    append_results(lc, project_id, folder_id, incoming)
                }),
            )
            .await?;

        tracing::info!(
            project_id,
            result_ref,
            fetched,
            clip_count = saved.clips().len(),
            previously = before,
            "Clip extraction results materialized",
        );
        Ok(saved.folders.0.clips)
    }

    // -----------------------------------------------------------------------
    // Task tracker and folder maintenance
    // -----------------------------------------------------------------------

    /// Apply a manual status/progress change to a non-clips task.
    pub async fn update_task(
        &self,
        project_id: DbId,
        task_type: TaskType,
        update: TaskUpdate,
    ) -> Result<Project, PipelineError> {
        ensure_manually_updatable(task_type)?;
        self.store
            .edit_lifecycle(
                project_id,
                Box::new(move |lc: &mut ProjectLifecycle| {
                    apply_update(task_entry(&mut lc.tasks, task_type), &update)?;
                    lc.status = derive_status(lc.status, &lc.tasks);
                    Ok(())
                }),
            )
            .await
    }

    /// Remove repeated clip ids from the folder, keeping first occurrences.
    /// Returns the number of clips removed.
    pub async fn dedupe_folder(&self, project_id: DbId) -> Result<usize, PipelineError> {
        let before = self.require_project(project_id).await?.clips().len();
        let saved = self
            .store
            .edit_lifecycle(
                project_id,
                Box::new(|lc: &mut ProjectLifecycle| {
                    let (clips, _) = dedupe_clips(std::mem::take(&mut lc.folders.clips));
                    lc.folders.clips = clips;
                    Ok(())
                }),
            )
            .await?;
        let removed = before.saturating_sub(saved.clips().len());
        if removed > 0 {
            tracing::info!(project_id, removed, "Removed duplicate clips");
        }
        Ok(removed)
    }
}

// ---------------------------------------------------------------------------
// Lifecycle edits (run under the row lock)
// ---------------------------------------------------------------------------

fn no_external_job(project_id: DbId) -> CoreError {
    CoreError::Validation(format!(
        "Project {project_id} has no clip extraction job; start one first"
    ))
}

fn claim_dispatch(lc: &mut ProjectLifecycle) -> Result<(), CoreError> {
    if let Some(existing) = &lc.klap_project_id {
        return Err(CoreError::Conflict(format!(
            "Clip extraction job {existing} already exists; restart it instead"
        )));
    }
    if lc.klap_dispatch_started_at.is_some() {
        return Err(CoreError::Conflict(
            "Clip extraction dispatch is already in progress".into(),
        ));
    }
    let task = task_entry(&mut lc.tasks, TaskType::Clips);
    if task.status == TaskStatus::Processing {
        return Err(CoreError::Conflict(
            "Clips task is already processing".into(),
        ));
    }
    lc.klap_dispatch_started_at = Some(chrono::Utc::now());
    Ok(())
}

fn record_dispatch(lc: &mut ProjectLifecycle, external_job_id: String) -> Result<(), CoreError> {
    lc.klap_project_id = Some(external_job_id);
    lc.klap_folder_id = None;
    let task = task_entry(&mut lc.tasks, TaskType::Clips);
    if task.status == TaskStatus::Completed {
        task.reset();
    }
    task.begin()?;
    task.advance_progress(DISPATCH_PROGRESS)?;
    lc.status = derive_status(lc.status, &lc.tasks);
    Ok(())
}

fn release_dispatch(lc: &mut ProjectLifecycle, message: String) -> Result<(), CoreError> {
    lc.klap_dispatch_started_at = None;
    let task = task_entry(&mut lc.tasks, TaskType::Clips);
    if task.status != TaskStatus::Completed {
        task.fail(message)?;
    }
    lc.status = derive_status(lc.status, &lc.tasks);
    Ok(())
}

fn reset_job(lc: &mut ProjectLifecycle, claim_ttl: Duration) -> Result<(), CoreError> {
    if lc.klap_project_id.is_none() {
        if let Some(claimed_at) = lc.klap_dispatch_started_at {
            // A negative age (clock skew) counts as fresh.
            let fresh = (chrono::Utc::now() - claimed_at)
                .to_std()
                .map_or(true, |age| age < claim_ttl);
            if fresh {
                return Err(CoreError::Conflict(
                    "Clip extraction dispatch is in progress; retry once it finishes".into(),
                ));
            }
        }
    }
    lc.klap_project_id = None;
    lc.klap_folder_id = None;
    lc.klap_dispatch_started_at = None;
    task_entry(&mut lc.tasks, TaskType::Clips).reset();
    lc.status = derive_status(lc.status, &lc.tasks);
    Ok(())
}

fn record_progress(lc: &mut ProjectLifecycle, reported: Option<u8>) -> Result<(), CoreError> {
    let task = task_entry(&mut lc.tasks, TaskType::Clips);
    if task.status != TaskStatus::Processing {
        return Ok(());
    }
    let target = reported.unwrap_or_else(|| {
        task.progress
            .saturating_add(POLL_PROGRESS_STEP)
            .min(POLL_PROGRESS_CEILING)
    });
    task.advance_progress(target)?;
    Ok(())
}

fn record_failure(lc: &mut ProjectLifecycle, message: String) -> Result<(), CoreError> {
    let task = task_entry(&mut lc.tasks, TaskType::Clips);
    if task.status == TaskStatus::Completed {
        return Ok(());
    }
    task.fail(message)?;
    lc.status = derive_status(lc.status, &lc.tasks);
    Ok(())
}

fn append_results(
    lc: &mut ProjectLifecycle,
    project_id: DbId,
    folder_id: String,
    incoming: Vec<Clip>,
) -> Result<(), CoreError> {
    // Re-checked under the lock: a restart may have cleared the job.
    if lc.klap_project_id.is_none() {
        return Err(no_external_job(project_id));
    }

    let merged = merge_clips(std::mem::take(&mut lc.folders.clips), incoming);
    lc.folders.clips = merged.clips;
    lc.klap_folder_id = Some(folder_id);

    let task = task_entry(&mut lc.tasks, TaskType::Clips);
    if task.status != TaskStatus::Completed {
        if task.status != TaskStatus::Processing {
            task.begin()?;
        }
        task.complete()?;
    }
    lc.status = derive_status(lc.status, &lc.tasks);
    Ok(())
}
