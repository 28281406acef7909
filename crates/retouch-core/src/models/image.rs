//! Transformed image records and their write/response DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

use super::TransformationType;

/// Persisted record of one transformed image.
///
/// `config` is stored untyped; its shape is expected to match `transformation_type`
/// but mismatched keys are accepted and ignored when URLs are built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct ImageRecord {
    pub id: Uuid,
    pub title: String,
    pub transformation_type: TransformationType,
    pub public_id: String,
    pub secure_url: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub config: JsonValue,
    pub transformation_url: Option<String>,
    pub aspect_ratio: Option<String>,
    pub color: Option<String>,
    pub prompt: Option<String>,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields written on create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ImagePayload {
    pub title: String,
    pub transformation_type: TransformationType,
    pub public_id: String,
    pub secure_url: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    #[schema(value_type = Object)]
    pub config: JsonValue,
    pub transformation_url: Option<String>,
    pub aspect_ratio: Option<String>,
    pub color: Option<String>,
    pub prompt: Option<String>,
}

/// Result of an upload to the hosted image service, handed to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UploadedImage {
    pub public_id: String,
    pub secure_url: String,
    pub width: u32,
    pub height: u32,
}

/// Image response
#[derive(Debug, Serialize, ToSchema)]
pub struct ImageResponse {
    pub id: Uuid,
    pub title: String,
    pub transformation_type: TransformationType,
    pub public_id: String,
    pub secure_url: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    #[schema(value_type = Object)]
    pub config: JsonValue,
    pub transformation_url: Option<String>,
    pub aspect_ratio: Option<String>,
    pub color: Option<String>,
    pub prompt: Option<String>,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ImageRecord> for ImageResponse {
    fn from(record: ImageRecord) -> Self {
        ImageResponse {
            id: record.id,
            title: record.title,
            transformation_type: record.transformation_type,
            public_id: record.public_id,
            secure_url: record.secure_url,
            width: record.width,
            height: record.height,
            config: record.config,
            transformation_url: record.transformation_url,
            aspect_ratio: record.aspect_ratio,
            color: record.color,
            prompt: record.prompt,
            author_id: record.author_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl ImageRecord {
    /// Build the record a store would return for a freshly created payload.
    pub fn from_payload(id: Uuid, author_id: Uuid, payload: ImagePayload) -> Self {
        let now = Utc::now();
        ImageRecord {
            id,
            title: payload.title,
            transformation_type: payload.transformation_type,
            public_id: payload.public_id,
            secure_url: payload.secure_url,
            width: payload.width,
            height: payload.height,
            config: payload.config,
            transformation_url: payload.transformation_url,
            aspect_ratio: payload.aspect_ratio,
            color: payload.color,
            prompt: payload.prompt,
            author_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite every writable field, bumping `updated_at`.
    pub fn apply_payload(&mut self, payload: ImagePayload) {
        self.title = payload.title;
        self.transformation_type = payload.transformation_type;
        self.public_id = payload.public_id;
        self.secure_url = payload.secure_url;
        self.width = payload.width;
        self.height = payload.height;
        self.config = payload.config;
        self.transformation_url = payload.transformation_url;
        self.aspect_ratio = payload.aspect_ratio;
        self.color = payload.color;
        self.prompt = payload.prompt;
        self.updated_at = Utc::now();
    }

    /// Uploaded image view of this record, used when a session edits it.
    pub fn uploaded_image(&self) -> UploadedImage {
        UploadedImage {
            public_id: self.public_id.clone(),
            secure_url: self.secure_url.clone(),
            width: self.width.unwrap_or_default().max(0) as u32,
            height: self.height.unwrap_or_default().max(0) as u32,
        }
    }
}
