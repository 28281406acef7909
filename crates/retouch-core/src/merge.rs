//! Recursive merge of nested transformation configs.

use serde_json::{Map, Value as JsonValue};

/// Merge `delta` over `base` and return the result.
///
/// Objects present on both sides are merged key by key, recursively. Any other
/// pairing (scalar, array, or object against non-object) takes the delta's value.
/// A `null` operand contributes nothing.
pub fn deep_merge(base: &JsonValue, delta: &JsonValue) -> JsonValue {
    match (base, delta) {
        (JsonValue::Object(base_map), JsonValue::Object(delta_map)) => {
            JsonValue::Object(merge_maps(base_map, delta_map))
        }
        (_, JsonValue::Null) => base.clone(),
        (_, other) => other.clone(),
    }
}

fn merge_maps(
    base: &Map<String, JsonValue>,
    delta: &Map<String, JsonValue>,
) -> Map<String, JsonValue> {
    let mut merged = base.clone();
    for (key, delta_value) in delta {
        let value = match merged.get(key) {
            Some(base_value) if base_value.is_object() && delta_value.is_object() => {
                deep_merge(base_value, delta_value)
            }
            _ => delta_value.clone(),
        };
        merged.insert(key.clone(), value);
    }
    merged
}
