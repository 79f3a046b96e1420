//! Repository for the `personas` and `persona_images` tables.

use inflio_core::persona::STATUS_PENDING;
use inflio_core::types::DbId;
use sqlx::PgPool;

use crate::models::persona::{CreatePersona, CreatePersonaImage, Persona, PersonaImage};

const COLUMNS: &str = "id, user_id, name, description, status, created_at, updated_at";

const IMAGE_COLUMNS: &str = "id, persona_id, image_url, prompt, created_at";

pub struct PersonaRepo;

impl PersonaRepo {
    pub async fn create(
        pool: &PgPool,
        user_id: &str,
        input: &CreatePersona,
    ) -> Result<Persona, sqlx::Error> {
        let query = format!(
            "INSERT INTO personas (user_id, name, description, status) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Persona>(&query)
            .bind(user_id)
            .bind(input.name.trim())
            .bind(&input.description)
            .bind(STATUS_PENDING)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Persona>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM personas WHERE id = $1");
        sqlx::query_as::<_, Persona>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_user(pool: &PgPool, user_id: &str) -> Result<Vec<Persona>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM personas WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Persona>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Set the training status. Returns `None` if the persona does not exist.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Option<Persona>, sqlx::Error> {
        let query = format!("UPDATE personas SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Persona>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Delete a persona and (via cascade) its images.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM personas WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Attach an image unless the persona already holds `max_images`.
    ///
    /// The persona row is locked for the count and insert, so concurrent
    /// uploads cannot overshoot the cap. Returns `None` when the cap is
    /// reached.
    pub async fn add_image(
        pool: &PgPool,
        persona_id: DbId,
        input: &CreatePersonaImage,
        max_images: i64,
    ) -> Result<Option<PersonaImage>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT id FROM personas WHERE id = $1 FOR UPDATE")
            .bind(persona_id)
            .execute(&mut *tx)
            .await?;

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM persona_images WHERE persona_id = $1")
                .bind(persona_id)
                .fetch_one(&mut *tx)
                .await?;
        if count >= max_images {
            return Ok(None);
        }

        let query = format!(
            "INSERT INTO persona_images (persona_id, image_url, prompt) \
             VALUES ($1, $2, $3) \
             RETURNING {IMAGE_COLUMNS}"
        );
        let image = sqlx::query_as::<_, PersonaImage>(&query)
            .bind(persona_id)
            .bind(&input.image_url)
            .bind(&input.prompt)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(image))
    }

    pub async fn list_images(
        pool: &PgPool,
        persona_id: DbId,
    ) -> Result<Vec<PersonaImage>, sqlx::Error> {
        let query = format!(
            "SELECT {IMAGE_COLUMNS} FROM persona_images WHERE persona_id = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, PersonaImage>(&query)
            .bind(persona_id)
            .fetch_all(pool)
            .await
    }

    pub async fn count_images(pool: &PgPool, persona_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM persona_images WHERE persona_id = $1")
            .bind(persona_id)
            .fetch_one(pool)
            .await
    }
}
