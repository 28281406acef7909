pub mod images;
pub mod navigation;
pub mod options;
pub mod sessions;
