//! Short-form clips extracted from a project's source video.
//!
//! A clip's identity is the id assigned by the extraction vendor. The
//! helpers here keep that id unique within a project's clip folder.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// A clip stored in `folders.clips`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Offset into the source video, in seconds.
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Vendor virality score, normalized to `0.0..=1.0`.
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_url: Option<String>,
    pub created_at: Timestamp,
}

impl Clip {
    /// Check the invariants a clip must hold before it is persisted.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.id.trim().is_empty() {
            return Err(CoreError::Validation("Clip id must not be empty".into()));
        }
        if !self.start_time.is_finite() || self.start_time < 0.0 {
            return Err(CoreError::Validation(format!(
                "Clip '{}' has an invalid start time {}",
                self.id, self.start_time
            )));
        }
        if !self.end_time.is_finite() || self.end_time < self.start_time {
            return Err(CoreError::Validation(format!(
                "Clip '{}' ends ({}) before it starts ({})",
                self.id, self.end_time, self.start_time
            )));
        }
        if !(0.0..=1.0).contains(&self.score) {
            return Err(CoreError::Validation(format!(
                "Clip '{}' score {} is outside 0..=1",
                self.id, self.score
            )));
        }
        Ok(())
    }
}

/// Result of appending vendor clips to an existing folder.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub clips: Vec<Clip>,
    pub added: usize,
    pub skipped: usize,
}

/// Append `incoming` to `existing`, skipping every clip whose id is already
/// present (in `existing` or earlier in `incoming`). Existing clips are
/// never removed or reordered.
pub fn merge_clips(existing: Vec<Clip>, incoming: Vec<Clip>) -> MergeOutcome {
    let mut seen: HashSet<String> = existing.iter().map(|c| c.id.clone()).collect();
    let mut clips = existing;
    let mut added = 0;
    let mut skipped = 0;

    for clip in incoming {
        if seen.insert(clip.id.clone()) {
            clips.push(clip);
            added += 1;
        } else {
            skipped += 1;
        }
    }

    MergeOutcome {
        clips,
        added,
        skipped,
    }
}

/// Ids that occur more than once, in order of their second occurrence.
pub fn find_duplicate_ids(clips: &[Clip]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();
    for clip in clips {
        if !seen.insert(clip.id.as_str()) && reported.insert(clip.id.as_str()) {
            duplicates.push(clip.id.clone());
        }
    }
    duplicates
}

/// Keep the first occurrence of every clip id. Returns the clips and the
/// number removed.
pub fn dedupe_clips(clips: Vec<Clip>) -> (Vec<Clip>, usize) {
    let outcome = merge_clips(Vec::new(), clips);
    (outcome.clips, outcome.skipped)
}
