//! Persona and persona image models.

use inflio_core::types::{DbId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `personas` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Persona {
    pub id: DbId,
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePersona {
    pub name: String,
    pub description: Option<String>,
}

/// Body of `PATCH /personas/{id}`, sent by the training integration.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePersonaStatus {
    pub status: String,
}

/// A generated portrait from the `persona_images` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PersonaImage {
    pub id: DbId,
    pub persona_id: DbId,
    pub image_url: String,
    pub prompt: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePersonaImage {
    pub image_url: String,
    pub prompt: Option<String>,
}

/// A persona with its portraits, as returned by `GET /personas/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct PersonaWithImages {
    #[serde(flatten)]
    pub persona: Persona,
    pub images: Vec<PersonaImage>,
}
