pub mod image;
pub mod transformation;

pub use image::{ImagePayload, ImageRecord, ImageResponse, UploadedImage};
pub use transformation::{AspectRatioKey, FormAction, TransformationType};
