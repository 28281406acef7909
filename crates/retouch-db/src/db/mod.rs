//! Database repositories for data access layer
//!
//! Each repository is responsible for a specific domain entity. Records are never
//! deleted through this layer.

pub mod image;
pub mod user;

pub use image::ImageRepository;
pub use user::UserRepository;
