//! Retouch Core Library
//!
//! This crate provides the domain models, option tables, error types, configuration,
//! and the pure helpers (deep merge, transformation URL building, sidebar navigation)
//! shared by every Retouch component.

pub mod config;
pub mod constants;
pub mod error;
pub mod merge;
pub mod models;
pub mod navigation;
pub mod transform_url;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use merge::deep_merge;
pub use models::{
    AspectRatioKey, FormAction, ImagePayload, ImageRecord, ImageResponse, TransformationType,
};
pub use navigation::{sidebar, AuthView, NavItem, SidebarView};
pub use transform_url::TransformationUrlBuilder;
