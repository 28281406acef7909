//! Repository for transformed image records

use retouch_core::{AppError, ImagePayload, ImageRecord};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const IMAGE_COLUMNS: &str = "id, title, transformation_type, public_id, secure_url, width, height, \
     config, transformation_url, aspect_ratio, color, prompt, author_id, created_at, updated_at";

/// Repository for managing image records
#[derive(Clone)]
pub struct ImageRepository {
    pool: PgPool,
}

impl ImageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new image record owned by `author_id`
    #[tracing::instrument(skip(self, payload), fields(db.table = "images", db.operation = "insert"))]
    pub async fn create(
        &self,
        author_id: Uuid,
        payload: ImagePayload,
        revalidate_path: &str,
    ) -> Result<ImageRecord, AppError> {
        let record = sqlx::query_as::<Postgres, ImageRecord>(&format!(
            r#"
            INSERT INTO images (
                id, title, transformation_type, public_id, secure_url, width, height,
                config, transformation_url, aspect_ratio, color, prompt, author_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            IMAGE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&payload.title)
        .bind(payload.transformation_type)
        .bind(&payload.public_id)
        .bind(&payload.secure_url)
        .bind(payload.width)
        .bind(payload.height)
        .bind(&payload.config)
        .bind(&payload.transformation_url)
        .bind(&payload.aspect_ratio)
        .bind(&payload.color)
        .bind(&payload.prompt)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            image_id = %record.id,
            author_id = %author_id,
            revalidate_path = %revalidate_path,
            "Image record created"
        );

        Ok(record)
    }

    /// Overwrite an existing record. Scoped to its author; other users' records
    /// are reported as not found.
    #[tracing::instrument(skip(self, payload), fields(db.table = "images", db.operation = "update", db.record_id = %id))]
    pub async fn update(
        &self,
        id: Uuid,
        author_id: Uuid,
        payload: ImagePayload,
        revalidate_path: &str,
    ) -> Result<ImageRecord, AppError> {
        let record = sqlx::query_as::<Postgres, ImageRecord>(&format!(
            r#"
            UPDATE images
            SET title = $1, transformation_type = $2, public_id = $3, secure_url = $4,
                width = $5, height = $6, config = $7, transformation_url = $8,
                aspect_ratio = $9, color = $10, prompt = $11, updated_at = NOW()
            WHERE id = $12 AND author_id = $13
            RETURNING {}
            "#,
            IMAGE_COLUMNS
        ))
        .bind(&payload.title)
        .bind(payload.transformation_type)
        .bind(&payload.public_id)
        .bind(&payload.secure_url)
        .bind(payload.width)
        .bind(payload.height)
        .bind(&payload.config)
        .bind(&payload.transformation_url)
        .bind(&payload.aspect_ratio)
        .bind(&payload.color)
        .bind(&payload.prompt)
        .bind(id)
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;

        tracing::info!(
            image_id = %record.id,
            revalidate_path = %revalidate_path,
            "Image record updated"
        );

        Ok(record)
    }

    /// Get an image record by ID
    #[tracing::instrument(skip(self), fields(db.table = "images", db.operation = "select", db.record_id = %id))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<ImageRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, ImageRecord>(&format!(
            "SELECT {} FROM images WHERE id = $1",
            IMAGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// List an author's records, newest first
    #[tracing::instrument(skip(self), fields(db.table = "images", db.operation = "select"))]
    pub async fn list_by_author(
        &self,
        author_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ImageRecord>, AppError> {
        let records = sqlx::query_as::<Postgres, ImageRecord>(&format!(
            r#"
            SELECT {}
            FROM images
            WHERE author_id = $1
            ORDER BY updated_at DESC
            LIMIT $2 OFFSET $3
            "#,
            IMAGE_COLUMNS
        ))
        .bind(author_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
