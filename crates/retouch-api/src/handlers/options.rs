//! Transformation and aspect ratio option tables

use axum::response::{IntoResponse, Json};
use serde::Serialize;
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

use retouch_core::constants::{aspect_ratio_options, default_config, TransformationInfo};
use retouch_core::{AspectRatioKey, TransformationType};

#[derive(Debug, Serialize, ToSchema)]
pub struct TransformationOption {
    #[serde(rename = "type")]
    pub transformation_type: TransformationType,
    pub title: String,
    pub subtitle: String,
    pub icon: String,
    /// Config staged when this transformation is chosen
    #[schema(value_type = Object)]
    pub config: JsonValue,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AspectRatioChoice {
    pub aspect_ratio: AspectRatioKey,
    pub label: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OptionsResponse {
    pub transformations: Vec<TransformationOption>,
    pub aspect_ratios: Vec<AspectRatioChoice>,
}

/// Static option tables rendered by the transformation form
#[utoipa::path(
    get,
    path = "/api/v0/options",
    responses(
        (status = 200, description = "Option tables", body = OptionsResponse),
    ),
    tag = "options"
)]
pub async fn get_options() -> impl IntoResponse {
    let transformations = TransformationType::ALL
        .into_iter()
        .map(|t| {
            let info = TransformationInfo::for_type(t);
            TransformationOption {
                transformation_type: t,
                title: info.title.to_string(),
                subtitle: info.subtitle.to_string(),
                icon: info.icon.to_string(),
                config: default_config(t),
            }
        })
        .collect();

    let aspect_ratios = aspect_ratio_options()
        .into_iter()
        .map(|o| AspectRatioChoice {
            aspect_ratio: o.aspect_ratio,
            label: o.label.to_string(),
            width: o.width,
            height: o.height,
        })
        .collect();

    Json(OptionsResponse {
        transformations,
        aspect_ratios,
    })
}
