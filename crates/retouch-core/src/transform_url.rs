//! Transformation URL builder for the hosted image CDN
//!
//! Provides a fluent API for building delivery URLs in the CDN's
//! `/image/upload/{operations}/{public_id}` format. Operations are `/`-separated
//! segments; each segment is a comma-separated list of `key_value` parameters.
//!
//! Only the URL is assembled here: the CDN performs the transformation when the
//! URL is first requested, and this crate never fetches or validates the result.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value as JsonValue;

use crate::models::TransformationType;

/// Default delivery host of the image CDN.
pub const DEFAULT_DELIVERY_BASE_URL: &str = "https://res.cloudinary.com";

/// Characters left as-is inside prompt and color values.
const PARAM_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

#[derive(Debug, Clone, PartialEq)]
struct RemoveParams {
    prompt: String,
    remove_shadow: bool,
    multiple: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct RecolorParams {
    prompt: String,
    to: String,
    multiple: bool,
}

/// Builder for image transformation URLs
///
/// # Example
/// ```
/// use retouch_core::transform_url::TransformationUrlBuilder;
/// let url = TransformationUrlBuilder::new()
///     .restore()
///     .build("https://res.cloudinary.com", "demo", "samples/dog");
/// // Returns: "https://res.cloudinary.com/demo/image/upload/e_gen_restore/f_auto/q_auto/samples/dog"
/// ```
#[derive(Debug, Clone, Default)]
pub struct TransformationUrlBuilder {
    restore: bool,
    remove_background: bool,
    fill_background: bool,
    aspect_ratio: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    remove: Option<RemoveParams>,
    recolor: Option<RecolorParams>,
}

impl TransformationUrlBuilder {
    /// Create a new empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a committed config, reading only the keys that belong to
    /// `transformation_type`. Other keys are ignored.
    pub fn from_config(transformation_type: TransformationType, config: &JsonValue) -> Self {
        let builder = Self::new();
        let Some(params) = config.get(transformation_type.config_key()) else {
            return builder;
        };

        match transformation_type {
            TransformationType::Restore if is_enabled(params) => builder.restore(),
            TransformationType::RemoveBackground if is_enabled(params) => {
                builder.remove_background()
            }
            TransformationType::Fill if is_enabled(params) => builder.fill_background(),
            TransformationType::Remove if params.is_object() => builder.remove(
                str_param(params, "prompt"),
                bool_param(params, "removeShadow"),
                bool_param(params, "multiple"),
            ),
            TransformationType::Recolor if params.is_object() => builder.recolor(
                str_param(params, "prompt"),
                str_param(params, "to"),
                bool_param(params, "multiple"),
            ),
            _ => builder,
        }
    }

    /// Generative restore (noise and artifact removal)
    pub fn restore(mut self) -> Self {
        self.restore = true;
        self
    }

    /// Background removal
    pub fn remove_background(mut self) -> Self {
        self.remove_background = true;
        self
    }

    /// Generative fill out to the configured dimensions or aspect ratio
    pub fn fill_background(mut self) -> Self {
        self.fill_background = true;
        self
    }

    /// Set the target aspect ratio (e.g. "3:4"), used by generative fill
    pub fn aspect_ratio(mut self, aspect_ratio: &str) -> Self {
        self.aspect_ratio = Some(aspect_ratio.to_string());
        self
    }

    /// Set both width and height
    pub fn dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Set width and height when known; `None` leaves the current value untouched
    pub fn resize(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        if width.is_some() {
            self.width = width;
        }
        if height.is_some() {
            self.height = height;
        }
        self
    }

    /// Generative object removal
    ///
    /// # Arguments
    /// * `prompt` - Natural-language description of the object to remove
    /// * `remove_shadow` - Also remove the object's shadow
    /// * `multiple` - Remove every matching object rather than the most prominent
    pub fn remove(mut self, prompt: &str, remove_shadow: bool, multiple: bool) -> Self {
        self.remove = Some(RemoveParams {
            prompt: prompt.to_string(),
            remove_shadow,
            multiple,
        });
        self
    }

    /// Generative object recolor
    ///
    /// # Arguments
    /// * `prompt` - Natural-language description of the object to recolor
    /// * `to` - Replacement color, a name or hex value
    /// * `multiple` - Recolor every matching object
    pub fn recolor(mut self, prompt: &str, to: &str, multiple: bool) -> Self {
        self.recolor = Some(RecolorParams {
            prompt: prompt.to_string(),
            to: to.to_string(),
            multiple,
        });
        self
    }

    /// Build the transformation path segment (operations only)
    ///
    /// Always ends with automatic format and quality selection. A remove or
    /// recolor without a prompt contributes no segment.
    pub fn build_operations(&self) -> String {
        let mut operations = Vec::new();

        if self.restore {
            operations.push("e_gen_restore".to_string());
        }

        if self.remove_background {
            operations.push("e_background_removal".to_string());
        }

        if self.fill_background {
            let mut params = vec!["b_gen_fill".to_string(), "c_pad".to_string()];
            match (self.width, self.height) {
                (Some(width), Some(height)) => {
                    params.push(format!("w_{}", width));
                    params.push(format!("h_{}", height));
                }
                _ => {
                    if let Some(ref ratio) = self.aspect_ratio {
                        params.push(format!("ar_{}", ratio));
                    }
                    if let Some(width) = self.width {
                        params.push(format!("w_{}", width));
                    }
                }
            }
            operations.push(params.join(","));
        } else if let Some(width) = self.width {
            operations.push(format!("c_limit,w_{}", width));
        }

        if let Some(ref remove) = self.remove {
            if !remove.prompt.trim().is_empty() {
                let mut op = format!("e_gen_remove:prompt_{}", encode_param(&remove.prompt));
                if remove.multiple {
                    op.push_str(";multiple_true");
                }
                if remove.remove_shadow {
                    op.push_str(";remove-shadow_true");
                }
                operations.push(op);
            }
        }

        if let Some(ref recolor) = self.recolor {
            if !recolor.prompt.trim().is_empty() {
                let mut op = format!("e_gen_recolor:prompt_{}", encode_param(&recolor.prompt));
                let to = recolor.to.trim().trim_start_matches('#');
                if !to.is_empty() {
                    op.push_str(&format!(";to-color_{}", encode_param(to)));
                }
                if recolor.multiple {
                    op.push_str(";multiple_true");
                }
                operations.push(op);
            }
        }

        operations.push("f_auto".to_string());
        operations.push("q_auto".to_string());
        operations.join("/")
    }

    /// Build the complete delivery URL
    ///
    /// # Arguments
    /// * `base_url` - Delivery host (e.g., "https://res.cloudinary.com")
    /// * `cloud_name` - Account namespace on the CDN
    /// * `public_id` - Opaque asset identifier returned by the upload
    pub fn build(&self, base_url: &str, cloud_name: &str, public_id: &str) -> String {
        let base = base_url.trim_end_matches('/');
        format!(
            "{}/{}/image/upload/{}/{}",
            base,
            cloud_name,
            self.build_operations(),
            public_id.trim_start_matches('/')
        )
    }
}

fn is_enabled(value: &JsonValue) -> bool {
    match value {
        JsonValue::Bool(enabled) => *enabled,
        JsonValue::Object(_) => true,
        _ => false,
    }
}

fn str_param<'a>(params: &'a JsonValue, key: &str) -> &'a str {
    params.get(key).and_then(JsonValue::as_str).unwrap_or_default()
}

fn bool_param(params: &JsonValue, key: &str) -> bool {
    params
        .get(key)
        .and_then(JsonValue::as_bool)
        .unwrap_or(false)
}

fn encode_param(value: &str) -> String {
    utf8_percent_encode(value.trim(), PARAM_ENCODE_SET).to_string()
}
