//! Client for the Klap video-to-shorts API.
//!
//! Provides the REST wrapper ([`api::KlapApi`]), environment configuration,
//! typed vendor payloads with validation into domain clips, and the
//! [`vendor::ClipVendor`] seam the job lifecycle is written against.

pub mod api;
pub mod config;
pub mod types;
pub mod vendor;

pub use api::{KlapApi, KlapError};
pub use config::KlapConfig;
pub use vendor::{ClipVendor, JobPoll, JobState};
