//! Transformation type, form action and aspect ratio keys

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;

use crate::AppError;

/// Which hosted processing pipeline (and which config shape) applies to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "transformation_type", rename_all = "camelCase")
)]
#[serde(rename_all = "camelCase")]
pub enum TransformationType {
    Restore,
    Fill,
    Remove,
    Recolor,
    RemoveBackground,
}

impl TransformationType {
    pub const ALL: [TransformationType; 5] = [
        TransformationType::Restore,
        TransformationType::Fill,
        TransformationType::Remove,
        TransformationType::Recolor,
        TransformationType::RemoveBackground,
    ];

    /// Key under which this type's parameters live in a config object.
    pub fn config_key(&self) -> &'static str {
        match self {
            TransformationType::Restore => "restore",
            TransformationType::Fill => "fillBackground",
            TransformationType::Remove => "remove",
            TransformationType::Recolor => "recolor",
            TransformationType::RemoveBackground => "removeBackground",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransformationType::Restore => "restore",
            TransformationType::Fill => "fill",
            TransformationType::Remove => "remove",
            TransformationType::Recolor => "recolor",
            TransformationType::RemoveBackground => "removeBackground",
        }
    }

    /// Types whose default config is staged as soon as an image is present,
    /// since they expose no parameter fields.
    pub fn stages_on_image(&self) -> bool {
        matches!(
            self,
            TransformationType::Restore | TransformationType::RemoveBackground
        )
    }
}

impl Display for TransformationType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformationType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransformationType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown transformation type: {}", s)))
    }
}

/// Whether the form creates a new record or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum FormAction {
    Add,
    Update,
}

/// Preset output sizes offered for generative fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum AspectRatioKey {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    StandardPortrait,
    #[serde(rename = "9:16")]
    PhonePortrait,
}

impl AspectRatioKey {
    pub const ALL: [AspectRatioKey; 3] = [
        AspectRatioKey::Square,
        AspectRatioKey::StandardPortrait,
        AspectRatioKey::PhonePortrait,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatioKey::Square => "1:1",
            AspectRatioKey::StandardPortrait => "3:4",
            AspectRatioKey::PhonePortrait => "9:16",
        }
    }
}

impl Display for AspectRatioKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatioKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AspectRatioKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown aspect ratio: {}", s)))
    }
}
