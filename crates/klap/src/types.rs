//! Typed Klap payloads and their validation into domain values.
//!
//! Nothing from the vendor is persisted as raw JSON: task responses become
//! [`JobPoll`] values and clip listings become [`Clip`]s, or the call fails
//! with [`KlapError::InvalidPayload`].

use inflio_core::clip::Clip;
use serde::{Deserialize, Serialize};

use crate::api::KlapError;
use crate::vendor::{JobPoll, JobState};

/// Body of `POST /tasks/video-to-shorts`.
#[derive(Debug, Serialize)]
pub struct CreateShortsTask<'a> {
    pub source_video_url: &'a str,
    pub language: &'a str,
    pub max_duration: u32,
    pub max_clip_count: u32,
    pub editing_options: EditingOptions,
}

#[derive(Debug, Default, Serialize)]
pub struct EditingOptions {
    pub intro_title: bool,
}

/// Response of `POST /tasks/video-to-shorts` and `GET /tasks/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct VendorTask {
    pub id: String,
    pub status: String,
    /// Result folder, present once the task is ready.
    #[serde(default)]
    pub output_id: Option<String>,
    /// Completion percentage, when the vendor reports one.
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default, alias = "error_message")]
    pub error: Option<String>,
}

impl VendorTask {
    /// Map the vendor status vocabulary onto [`JobState`].
    pub fn into_poll(self) -> Result<JobPoll, KlapError> {
        let progress = self
            .progress
            .filter(|p| p.is_finite())
            .map(|p| p.clamp(0.0, 100.0).round() as u8);

        let state = match self.status.to_ascii_lowercase().as_str() {
            "ready" | "done" | "completed" | "succeeded" => JobState::Done,
            "error" | "failed" | "cancelled" => JobState::Failed,
            "processing" | "pending" | "queued" | "in_progress" | "running" => JobState::Processing,
            other => {
                return Err(KlapError::InvalidPayload(format!(
                    "task {} has unknown status '{other}'",
                    self.id
                )))
            }
        };

        if state == JobState::Done && self.output_id.as_deref().map_or(true, str::is_empty) {
            return Err(KlapError::InvalidPayload(format!(
                "task {} is ready but has no output folder",
                self.id
            )));
        }

        Ok(JobPoll {
            state,
            result_ref: self.output_id.filter(|_| state == JobState::Done),
            progress,
            error: self.error.filter(|_| state == JobState::Failed),
        })
    }
}

/// One entry of `GET /projects/{folder_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct VendorClip {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "caption")]
    pub description: Option<String>,
    #[serde(default)]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub end_time: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
    /// Vendor score on a 0-100 scale.
    #[serde(default)]
    pub virality_score: Option<f64>,
    #[serde(default)]
    pub virality_score_explanation: Option<String>,
    #[serde(default, alias = "thumbnail_url")]
    pub thumbnail: Option<String>,
    #[serde(default, alias = "src_url")]
    pub export_url: Option<String>,
}

impl VendorClip {
    /// Validate and convert into the stored clip shape.
    ///
    /// Missing timing falls back to `start = 0`, `end = start + duration`.
    /// The 0-100 virality score is rescaled to `0.0..=1.0`.
    pub fn into_clip(self, index: usize) -> Result<Clip, KlapError> {
        let start_time = self.start_time.unwrap_or(0.0);
        let end_time = match (self.end_time, self.duration) {
            (Some(end), _) => end,
            (None, Some(duration)) => start_time + duration,
            (None, None) => start_time,
        };
        let score = self
            .virality_score
            .filter(|s| s.is_finite())
            .map(|s| (s / 100.0).clamp(0.0, 1.0))
            .unwrap_or(0.0);

        let clip = Clip {
            title: self
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("Clip {}", index + 1)),
            id: self.id,
            description: self.description,
            start_time,
            end_time,
            duration: end_time - start_time,
            thumbnail: self.thumbnail,
            score,
            score_explanation: self.virality_score_explanation,
            export_url: self.export_url,
            created_at: chrono::Utc::now(),
        };

        clip.validate()
            .map_err(|e| KlapError::InvalidPayload(e.to_string()))?;
        Ok(clip)
    }
}

/// Convert a whole result listing. One invalid entry rejects the listing so
/// materialization stays all-or-nothing.
pub fn clips_from_vendor(items: Vec<VendorClip>) -> Result<Vec<Clip>, KlapError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| item.into_clip(index))
        .collect()
}
