//! Application-wide constants and option tables.

use serde::Serialize;
use serde_json::{json, Value as JsonValue};

use crate::models::{AspectRatioKey, TransformationType};

/// Credit delta applied to the user's balance per applied transformation.
pub const DEFAULT_CREDIT_FEE: i64 = -1;

/// Trailing window for coalescing free-text field edits.
pub const DEFAULT_DEBOUNCE_MS: u64 = 1000;

/// Sessions untouched for this long are closed.
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 1800;

/// How often idle sessions are swept.
pub const SESSION_SWEEP_INTERVAL_SECS: u64 = 60;

/// Revalidation path used when a record is created.
pub const ADD_REVALIDATE_PATH: &str = "/";

/// Login route shown to signed-out visitors.
pub const SIGN_IN_ROUTE: &str = "/sign-in";

/// Number of navigation links in the primary sidebar group.
pub const PRIMARY_NAV_LINKS: usize = 6;

/// Display metadata and default parameters for one transformation type.
#[derive(Debug, Clone, Serialize)]
pub struct TransformationInfo {
    pub transformation_type: TransformationType,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub icon: &'static str,
}

impl TransformationInfo {
    pub fn for_type(transformation_type: TransformationType) -> Self {
        let (title, subtitle, icon) = match transformation_type {
            TransformationType::Restore => (
                "Restore Image",
                "Refine images by removing noise and imperfections",
                "image.svg",
            ),
            TransformationType::RemoveBackground => (
                "Background Remove",
                "Removes the background of the image using AI",
                "camera.svg",
            ),
            TransformationType::Fill => (
                "Generative Fill",
                "Enhance an image's dimensions using AI outpainting",
                "stars.svg",
            ),
            TransformationType::Remove => (
                "Object Remove",
                "Identify and eliminate objects from images",
                "scan.svg",
            ),
            TransformationType::Recolor => (
                "Object Recolor",
                "Identify and recolor objects from the image",
                "filter.svg",
            ),
        };
        TransformationInfo {
            transformation_type,
            title,
            subtitle,
            icon,
        }
    }
}

/// Full default parameter object staged for a transformation type.
pub fn default_config(transformation_type: TransformationType) -> JsonValue {
    match transformation_type {
        TransformationType::Restore => json!({ "restore": true }),
        TransformationType::RemoveBackground => json!({ "removeBackground": true }),
        TransformationType::Fill => json!({ "fillBackground": true }),
        TransformationType::Remove => json!({
            "remove": { "prompt": "", "removeShadow": true, "multiple": true }
        }),
        TransformationType::Recolor => json!({
            "recolor": { "prompt": "", "to": "", "multiple": true }
        }),
    }
}

/// Preset dimensions for an aspect ratio option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AspectRatioOption {
    pub aspect_ratio: AspectRatioKey,
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
}

pub fn aspect_ratio_option(key: AspectRatioKey) -> AspectRatioOption {
    match key {
        AspectRatioKey::Square => AspectRatioOption {
            aspect_ratio: key,
            label: "Square (1:1)",
            width: 1000,
            height: 1000,
        },
        AspectRatioKey::StandardPortrait => AspectRatioOption {
            aspect_ratio: key,
            label: "Standard Portrait (3:4)",
            width: 1000,
            height: 1334,
        },
        AspectRatioKey::PhonePortrait => AspectRatioOption {
            aspect_ratio: key,
            label: "Phone Portrait (9:16)",
            width: 1000,
            height: 1778,
        },
    }
}

pub fn aspect_ratio_options() -> Vec<AspectRatioOption> {
    AspectRatioKey::ALL
        .into_iter()
        .map(aspect_ratio_option)
        .collect()
}

/// A sidebar navigation link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavLink {
    pub label: &'static str,
    pub route: &'static str,
    pub icon: &'static str,
}

pub const NAV_LINKS: [NavLink; 8] = [
    NavLink {
        label: "Home",
        route: "/",
        icon: "/assets/icons/home.svg",
    },
    NavLink {
        label: "Image Restore",
        route: "/transformations/add/restore",
        icon: "/assets/icons/image.svg",
    },
    NavLink {
        label: "Generative Fill",
        route: "/transformations/add/fill",
        icon: "/assets/icons/stars.svg",
    },
    NavLink {
        label: "Object Remove",
        route: "/transformations/add/remove",
        icon: "/assets/icons/scan.svg",
    },
    NavLink {
        label: "Object Recolor",
        route: "/transformations/add/recolor",
        icon: "/assets/icons/filter.svg",
    },
    NavLink {
        label: "Background Remove",
        route: "/transformations/add/removeBackground",
        icon: "/assets/icons/camera.svg",
    },
    NavLink {
        label: "Profile",
        route: "/profile",
        icon: "/assets/icons/profile.svg",
    },
    NavLink {
        label: "Buy Credits",
        route: "/credits",
        icon: "/assets/icons/bag.svg",
    },
];

/// Route of a saved record's detail page; also its revalidation path on update.
pub fn transformation_route(id: impl std::fmt::Display) -> String {
    format!("/transformations/{}", id)
}
