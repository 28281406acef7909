//! Saved image handlers

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::auth::UserContext;
use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::error::HttpAppError;
use crate::state::AppState;
use retouch_core::{AppError, ImageResponse};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListImagesQuery {
    /// 1-based page number
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListImagesQuery {
    fn limit_offset(&self) -> (i64, i64) {
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE) as i64;
        let page = self.page.unwrap_or(1).max(1) as i64;
        (limit, (page - 1) * limit)
    }
}

/// Get a saved image
#[utoipa::path(
    get,
    path = "/api/v0/images/{id}",
    params(("id" = Uuid, Path, description = "Image ID")),
    responses(
        (status = 200, description = "Image record", body = ImageResponse),
        (status = 404, description = "Image not found"),
    ),
    tag = "images"
)]
#[tracing::instrument(skip(state, _user))]
pub async fn get_image(
    State(state): State<Arc<AppState>>,
    _user: UserContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = state
        .images
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;
    Ok(Json(ImageResponse::from(record)))
}

/// List the caller's saved images, most recently updated first
#[utoipa::path(
    get,
    path = "/api/v0/images",
    params(ListImagesQuery),
    responses(
        (status = 200, description = "Images", body = Vec<ImageResponse>),
    ),
    tag = "images"
)]
#[tracing::instrument(skip(state, user))]
pub async fn list_images(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Query(query): Query<ListImagesQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let (limit, offset) = query.limit_offset();
    let records = state
        .images
        .list_by_author(user.user_id, limit, offset)
        .await?;

    let responses: Vec<ImageResponse> = records.into_iter().map(ImageResponse::from).collect();
    Ok(Json(responses))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paging_defaults_and_bounds() {
        let query = ListImagesQuery { page: None, limit: None };
        assert_eq!(query.limit_offset(), (20, 0));

        let query = ListImagesQuery { page: Some(3), limit: Some(500) };
        assert_eq!(query.limit_offset(), (100, 200));

        let query = ListImagesQuery { page: Some(0), limit: Some(0) };
        assert_eq!(query.limit_offset(), (1, 0));
    }
}
