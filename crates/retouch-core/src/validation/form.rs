//! Transformation form schema.
//!
//! Every field is a plain string: the schema only enforces presence, length and
//! that a non-empty aspect ratio is one of the preset keys.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::models::{AspectRatioKey, ImageRecord};
use crate::AppError;

pub const MAX_TITLE_LENGTH: u64 = 200;
pub const MAX_PROMPT_LENGTH: u64 = 500;
pub const MAX_COLOR_LENGTH: u64 = 64;

/// Validated values of the transformation form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct FormValues {
    #[validate(length(max = MAX_TITLE_LENGTH))]
    pub title: String,
    #[validate(custom(function = "validate_aspect_ratio"))]
    pub aspect_ratio: Option<String>,
    #[validate(length(max = MAX_COLOR_LENGTH))]
    pub color: Option<String>,
    #[validate(length(max = MAX_PROMPT_LENGTH))]
    pub prompt: Option<String>,
    pub public_id: String,
}

impl FormValues {
    /// Values of a blank "Add" form.
    pub fn defaults() -> Self {
        FormValues {
            title: String::new(),
            aspect_ratio: Some(String::new()),
            color: Some(String::new()),
            prompt: Some(String::new()),
            public_id: String::new(),
        }
    }

    /// Initial values when editing an existing record.
    pub fn from_record(record: &ImageRecord) -> Self {
        FormValues {
            title: record.title.clone(),
            aspect_ratio: record.aspect_ratio.clone(),
            color: record.color.clone(),
            prompt: record.prompt.clone(),
            public_id: record.public_id.clone(),
        }
    }

    pub fn set(&mut self, field: InputField, value: &str) {
        match field {
            InputField::Prompt => self.prompt = Some(value.to_string()),
            InputField::Color => self.color = Some(value.to_string()),
        }
    }
}

/// Empty means "not chosen yet"; anything else must be a preset key.
pub fn validate_aspect_ratio(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.parse::<AspectRatioKey>().is_ok() {
        Ok(())
    } else {
        Err(ValidationError::new("unknown_aspect_ratio"))
    }
}

/// Free-text fields whose edits are staged into the pending transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InputField {
    Prompt,
    Color,
}

impl InputField {
    /// Parameter key the field is staged under inside the type's config.
    pub fn config_param(&self) -> &'static str {
        match self {
            InputField::Prompt => "prompt",
            InputField::Color => "to",
        }
    }
}

impl Display for InputField {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            InputField::Prompt => f.write_str("prompt"),
            InputField::Color => f.write_str("color"),
        }
    }
}

impl FromStr for InputField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prompt" => Ok(InputField::Prompt),
            "color" => Ok(InputField::Color),
            other => Err(AppError::InvalidInput(format!(
                "Field {} cannot be staged into a transformation",
                other
            ))),
        }
    }
}
