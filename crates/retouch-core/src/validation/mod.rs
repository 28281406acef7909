//! Validation modules

pub mod form;

pub use form::{validate_aspect_ratio, FormValues, InputField, MAX_PROMPT_LENGTH, MAX_TITLE_LENGTH};
