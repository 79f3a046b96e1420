//! Persona (user-trained avatar) constants and validation.

use crate::error::CoreError;

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_TRAINING: &str = "training";
pub const STATUS_READY: &str = "ready";
pub const STATUS_FAILED: &str = "failed";
pub const VALID_STATUSES: &[&str] = &[STATUS_PENDING, STATUS_TRAINING, STATUS_READY, STATUS_FAILED];

pub const MAX_NAME_LEN: usize = 100;

/// Maximum number of portraits kept per persona.
pub const MAX_IMAGES_PER_PERSONA: i64 = 50;

pub fn validate_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Persona name must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Persona name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_status(status: &str) -> Result<(), CoreError> {
    if VALID_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid persona status '{status}'. Must be one of: {}",
            VALID_STATUSES.join(", ")
        )))
    }
}
