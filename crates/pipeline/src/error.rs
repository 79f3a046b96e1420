use inflio_core::error::CoreError;
use inflio_klap::KlapError;

/// Errors raised while driving a project's external job.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A domain rule rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The clip vendor call failed. Project state was left unchanged unless
    /// the vendor reported an explicit failure.
    #[error("Clip vendor error: {0}")]
    Vendor(#[from] KlapError),

    /// No vendor credentials are configured.
    #[error("Clip extraction is not configured")]
    VendorNotConfigured,
}
