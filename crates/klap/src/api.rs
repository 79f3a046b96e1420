//! REST API client for the Klap HTTP endpoints.
//!
//! Wraps task submission, task status and result-folder retrieval using
//! [`reqwest`], authenticating every call with the configured bearer key.

use async_trait::async_trait;
use inflio_core::clip::Clip;

use crate::config::KlapConfig;
use crate::types::{clips_from_vendor, CreateShortsTask, EditingOptions, VendorClip, VendorTask};
use crate::vendor::{ClipVendor, JobPoll};

/// HTTP client for the Klap API.
pub struct KlapApi {
    client: reqwest::Client,
    config: KlapConfig,
}

/// Errors from the Klap REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum KlapError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Klap returned a non-2xx status code.
    #[error("Klap API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response parsed but violates the expected contract.
    #[error("Invalid Klap payload: {0}")]
    InvalidPayload(String),
}

impl KlapError {
    /// Whether a later call may succeed without any change on our side.
    pub fn is_transient(&self) -> bool {
        match self {
            KlapError::Request(_) => true,
            KlapError::ApiError { status, .. } => *status == 429 || *status >= 500,
            KlapError::InvalidPayload(_) => false,
        }
    }
}

impl KlapApi {
    /// Build a client with the configured request timeout.
    pub fn new(config: KlapConfig) -> Result<Self, KlapError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Submit a video-to-shorts task for `source_url`.
    ///
    /// Sends `POST /tasks/video-to-shorts` and returns the created task.
    pub async fn create_shorts_task(&self, source_url: &str) -> Result<VendorTask, KlapError> {
        let body = CreateShortsTask {
            source_video_url: source_url,
            language: &self.config.language,
            max_duration: self.config.max_clip_duration_secs,
            max_clip_count: self.config.max_clip_count,
            editing_options: EditingOptions::default(),
        };

        let response = self
            .client
            .post(format!("{}/tasks/video-to-shorts", self.config.api_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Retrieve a task by id (`GET /tasks/{id}`).
    pub async fn get_task(&self, task_id: &str) -> Result<VendorTask, KlapError> {
        let response = self
            .client
            .get(format!("{}/tasks/{}", self.config.api_url, task_id))
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// List the clips stored in a result folder (`GET /projects/{folder_id}`).
    pub async fn list_folder_clips(&self, folder_id: &str) -> Result<Vec<VendorClip>, KlapError> {
        let response = self
            .client
            .get(format!("{}/projects/{}", self.config.api_url, folder_id))
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`KlapError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, KlapError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(KlapError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, KlapError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| KlapError::InvalidPayload(e.to_string()))
    }
}

#[async_trait]
impl ClipVendor for KlapApi {
    async fn submit_job(&self, source_url: &str) -> Result<String, KlapError> {
        let task = self.create_shorts_task(source_url).await?;
        if task.id.trim().is_empty() {
            return Err(KlapError::InvalidPayload(
                "task creation returned an empty id".into(),
            ));
        }
        tracing::debug!(external_job_id = %task.id, status = %task.status, "Klap task created");
        Ok(task.id)
    }

    async fn poll_job(&self, external_job_id: &str) -> Result<JobPoll, KlapError> {
        self.get_task(external_job_id).await?.into_poll()
    }

    async fn fetch_results(&self, result_ref: &str) -> Result<Vec<Clip>, KlapError> {
        let items = self.list_folder_clips(result_ref).await?;
        tracing::debug!(result_ref, count = items.len(), "Fetched Klap result folder");
        clips_from_vendor(items)
    }
}
