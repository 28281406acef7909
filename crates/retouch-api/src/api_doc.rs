//! OpenAPI documentation.
//! Paths in handler annotations use the placeholder /api/v0; they are rewritten
//! to `crate::constants::API_VERSION` when the document is served.

use utoipa::OpenApi;

use crate::constants::API_VERSION;
use crate::error;
use crate::handlers;
use retouch_core::{models, navigation, validation};
use retouch_editor::{credits, session, state};

/// Placeholder version used in handler path annotations (utoipa requires compile-time literals).
const OPENAPI_PATH_PLACEHOLDER: &str = "/api/v0";

fn transform_openapi_paths(spec: &mut utoipa::openapi::OpenApi, version: &str) {
    let replacement = format!("/api/{}", version);
    if OPENAPI_PATH_PLACEHOLDER == replacement {
        return;
    }
    let path_map = std::mem::take(&mut spec.paths.paths);
    for (key, item) in path_map {
        let new_key = key.replacen(OPENAPI_PATH_PLACEHOLDER, &replacement, 1);
        spec.paths.paths.insert(new_key, item);
    }
}

/// Returns the OpenAPI spec with path placeholders replaced by the current API version.
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    let mut spec = ApiDoc::openapi();
    transform_openapi_paths(&mut spec, API_VERSION);
    spec
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Retouch API",
        version = "0.1.0",
        description = "AI image transformation sessions (restore, generative fill, object remove and recolor, background removal) with credit accounting. All endpoints are versioned under /api/v0/."
    ),
    paths(
        // Sessions
        handlers::sessions::create_session,
        handlers::sessions::get_session,
        handlers::sessions::close_session,
        handlers::sessions::set_image,
        handlers::sessions::set_title,
        handlers::sessions::select_aspect_ratio,
        handlers::sessions::set_field,
        handlers::sessions::apply_transformation,
        handlers::sessions::preview_ready,
        handlers::sessions::submit_session,
        // Images
        handlers::images::get_image,
        handlers::images::list_images,
        // Navigation and options
        handlers::navigation::get_navigation,
        handlers::options::get_options,
    ),
    components(
        schemas(
            models::ImageResponse,
            models::ImagePayload,
            models::UploadedImage,
            models::TransformationType,
            models::FormAction,
            models::AspectRatioKey,
            validation::FormValues,
            validation::InputField,
            navigation::SidebarView,
            navigation::NavItem,
            session::SessionView,
            session::DeductionView,
            state::SessionState,
            state::Controls,
            state::ImageDraft,
            state::Phase,
            credits::DeductionStatus,
            handlers::sessions::CreateSessionRequest,
            handlers::sessions::TitleRequest,
            handlers::sessions::AspectRatioRequest,
            handlers::sessions::FieldRequest,
            handlers::sessions::TransformResponse,
            handlers::sessions::SubmitResponse,
            handlers::options::OptionsResponse,
            handlers::options::TransformationOption,
            handlers::options::AspectRatioChoice,
            // Error
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "sessions", description = "Transformation form sessions: staging, applying and saving"),
        (name = "images", description = "Saved transformed images"),
        (name = "navigation", description = "Sidebar navigation"),
        (name = "options", description = "Transformation and aspect ratio option tables")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_lists_versioned_session_paths() {
        let spec = get_openapi_spec();
        assert!(spec.paths.paths.contains_key("/api/v0/sessions"));
        assert!(spec.paths.paths.contains_key("/api/v0/sessions/{id}/submit"));
    }
}
