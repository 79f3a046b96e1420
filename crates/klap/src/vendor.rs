//! The clip-extraction seam used by the job lifecycle.

use async_trait::async_trait;
use inflio_core::clip::Clip;

use crate::api::KlapError;

/// Vendor-side state of an external job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Processing,
    Done,
    Failed,
}

/// Snapshot returned by [`ClipVendor::poll_job`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPoll {
    pub state: JobState,
    /// Where the results live; set only when `state` is `Done`.
    pub result_ref: Option<String>,
    /// Vendor-reported completion percentage, if any.
    pub progress: Option<u8>,
    /// Vendor failure message; set only when `state` is `Failed`.
    pub error: Option<String>,
}

/// A service that turns a source video into short clips asynchronously.
///
/// Implementations must not retry internally: a failed call is reported to
/// the caller, which decides whether state changes.
#[async_trait]
pub trait ClipVendor: Send + Sync {
    /// Start processing `source_url`; returns the vendor job id.
    async fn submit_job(&self, source_url: &str) -> Result<String, KlapError>;

    /// Read the current state of a job. Must be side-effect free.
    async fn poll_job(&self, external_job_id: &str) -> Result<JobPoll, KlapError>;

    /// Fetch and validate the clips stored under `result_ref`.
    async fn fetch_results(&self, result_ref: &str) -> Result<Vec<Clip>, KlapError>;
}
