//! Transformation session handlers
//!
//! A session is the server-side form state of one "add" or "update" page: the
//! client opens it, streams edits into it, applies transformations and saves.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::UserContext;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use retouch_core::models::UploadedImage;
use retouch_core::validation::InputField;
use retouch_core::{FormAction, ImageResponse, TransformationType};
use retouch_editor::{DeductionView, OpenSession, SessionView, SubmitOutcome, TransformationSession};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    pub action: FormAction,
    pub transformation_type: TransformationType,
    /// Image to edit; required when `action` is `Update`
    pub image_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TitleRequest {
    pub title: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AspectRatioRequest {
    /// Preset key: "1:1", "3:4" or "9:16"
    pub aspect_ratio: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FieldRequest {
    pub value: String,
    /// Type to stage under; defaults to the session's type
    pub transformation_type: Option<TransformationType>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransformResponse {
    pub session: SessionView,
    pub deduction: DeductionView,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitResponse {
    pub image: ImageResponse,
    pub redirect_path: String,
}

/// Open a transformation session
#[utoipa::path(
    post,
    path = "/api/v0/sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session opened", body = SessionView),
        (status = 400, description = "Invalid action/image combination"),
        (status = 404, description = "Image or user not found"),
    ),
    tag = "sessions"
)]
#[tracing::instrument(skip(state, user, request))]
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    ValidatedJson(request): ValidatedJson<CreateSessionRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let session = TransformationSession::open(
        OpenSession {
            action: request.action,
            transformation_type: request.transformation_type,
            user_id: user.user_id,
            image_id: request.image_id,
        },
        Arc::clone(&state.images),
        Arc::clone(&state.ledger),
        state.session_settings.clone(),
    )
    .await?;

    let session = state.sessions.insert(session).await;
    Ok((StatusCode::CREATED, Json(session.view())))
}

/// Get the current state of a session
#[utoipa::path(
    get,
    path = "/api/v0/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session state", body = SessionView),
        (status = 404, description = "Session not found"),
    ),
    tag = "sessions"
)]
#[tracing::instrument(skip(state, user))]
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let session = state.sessions.get(id, user.user_id).await?;
    Ok(Json(session.view()))
}

/// Close a session, discarding unsaved edits
#[utoipa::path(
    delete,
    path = "/api/v0/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 204, description = "Session closed"),
        (status = 404, description = "Session not found"),
    ),
    tag = "sessions"
)]
#[tracing::instrument(skip(state, user))]
pub async fn close_session(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.sessions.remove(id, user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Attach an uploaded image to a session
#[utoipa::path(
    put,
    path = "/api/v0/sessions/{id}/image",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = UploadedImage,
    responses(
        (status = 200, description = "Image attached", body = SessionView),
        (status = 404, description = "Session not found"),
    ),
    tag = "sessions"
)]
#[tracing::instrument(skip(state, user, upload))]
pub async fn set_image(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<Uuid>,
    ValidatedJson(upload): ValidatedJson<UploadedImage>,
) -> Result<impl IntoResponse, HttpAppError> {
    let session = state.sessions.get(id, user.user_id).await?;
    session.set_image(upload)?;
    Ok(Json(session.view()))
}

/// Set the image title
#[utoipa::path(
    put,
    path = "/api/v0/sessions/{id}/title",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = TitleRequest,
    responses(
        (status = 200, description = "Title updated", body = SessionView),
        (status = 400, description = "Title too long"),
        (status = 404, description = "Session not found"),
    ),
    tag = "sessions"
)]
#[tracing::instrument(skip(state, user, request))]
pub async fn set_title(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<TitleRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let session = state.sessions.get(id, user.user_id).await?;
    session.set_title(&request.title)?;
    Ok(Json(session.view()))
}

/// Choose an aspect ratio preset (generative fill)
#[utoipa::path(
    put,
    path = "/api/v0/sessions/{id}/aspect-ratio",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = AspectRatioRequest,
    responses(
        (status = 200, description = "Aspect ratio selected and defaults staged", body = SessionView),
        (status = 400, description = "Unknown preset or not a fill session"),
        (status = 404, description = "Session not found"),
    ),
    tag = "sessions"
)]
#[tracing::instrument(skip(state, user))]
pub async fn select_aspect_ratio(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<AspectRatioRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let session = state.sessions.get(id, user.user_id).await?;
    session.on_select_field(&request.aspect_ratio)?;
    Ok(Json(session.view()))
}

/// Edit the prompt or color field; staging is debounced
#[utoipa::path(
    put,
    path = "/api/v0/sessions/{id}/fields/{field}",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("field" = String, Path, description = "prompt or color"),
    ),
    request_body = FieldRequest,
    responses(
        (status = 202, description = "Field updated; staging pending", body = SessionView),
        (status = 400, description = "Field not applicable or too long"),
        (status = 404, description = "Session not found"),
    ),
    tag = "sessions"
)]
#[tracing::instrument(skip(state, user, request))]
pub async fn set_field(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path((id, field)): Path<(Uuid, String)>,
    ValidatedJson(request): ValidatedJson<FieldRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let field: InputField = field.parse()?;
    let session = state.sessions.get(id, user.user_id).await?;
    let transformation_type = request
        .transformation_type
        .unwrap_or(session.snapshot().transformation_type);

    session.on_input_change(field, &request.value, transformation_type)?;
    Ok((StatusCode::ACCEPTED, Json(session.view())))
}

/// Apply the pending transformation
#[utoipa::path(
    post,
    path = "/api/v0/sessions/{id}/transform",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Transformation applied; credit deduction started", body = TransformResponse),
        (status = 400, description = "Nothing pending"),
        (status = 402, description = "Insufficient credits"),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Previous preview still loading"),
    ),
    tag = "sessions"
)]
#[tracing::instrument(skip(state, user))]
pub async fn apply_transformation(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let session = state.sessions.get(id, user.user_id).await?;
    let deduction = session.on_transform()?;

    Ok(Json(TransformResponse {
        session: session.view(),
        deduction: DeductionView {
            id: deduction.id(),
            fee: deduction.fee(),
            status: deduction.status(),
        },
    }))
}

/// Acknowledge that the transformed preview finished loading
#[utoipa::path(
    post,
    path = "/api/v0/sessions/{id}/preview-ready",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Apply re-enabled", body = SessionView),
        (status = 404, description = "Session not found"),
    ),
    tag = "sessions"
)]
#[tracing::instrument(skip(state, user))]
pub async fn preview_ready(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let session = state.sessions.get(id, user.user_id).await?;
    session.on_preview_ready();
    Ok(Json(session.view()))
}

/// Save the session as a new image or over the edited one
#[utoipa::path(
    post,
    path = "/api/v0/sessions/{id}/submit",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 201, description = "Image created", body = SubmitResponse),
        (status = 200, description = "Image updated", body = SubmitResponse),
        (status = 204, description = "Nothing to save"),
        (status = 402, description = "Insufficient credits"),
        (status = 404, description = "Session or image not found"),
        (status = 409, description = "Save already in progress"),
    ),
    tag = "sessions"
)]
#[tracing::instrument(skip(state, user))]
pub async fn submit_session(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<Uuid>,
) -> Result<Response, HttpAppError> {
    let session = state.sessions.get(id, user.user_id).await?;
    let action = session.snapshot().action;

    match session.on_submit().await? {
        SubmitOutcome::Skipped => Ok(StatusCode::NO_CONTENT.into_response()),
        SubmitOutcome::Saved {
            record,
            redirect_path,
        } => {
            let status = match action {
                FormAction::Add => StatusCode::CREATED,
                FormAction::Update => StatusCode::OK,
            };
            let body = SubmitResponse {
                image: ImageResponse::from(record),
                redirect_path,
            };
            Ok((status, Json(body)).into_response())
        }
    }
}
