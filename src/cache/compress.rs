//! Compress Module
//!
//! Lossy structural simplification applied before a payload is serialized.
//! Not byte-level compression: readers must tolerate missing empty fields.

use serde_json::Value;

// == Compress ==
/// Strips `null`, empty strings, empty arrays and empty objects from nested
/// objects and arrays.
///
/// Children are compressed first, so a nested object that only held empty
/// fields is dropped as well. The root value itself is never removed.
pub fn compress(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, compress(v)))
                .filter(|(_, v)| !is_empty(v))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(compress)
                .filter(|v| !is_empty(v))
                .collect(),
        ),
        other => other,
    }
}

/// True for the values `compress` strips from their parent.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strips_empty_fields() {
        let value = json!({"a": [], "b": null, "c": "x"});
        assert_eq!(compress(value), json!({"c": "x"}));
    }

    #[test]
    fn test_keeps_falsy_scalars() {
        let value = json!({"zero": 0, "no": false, "blank": ""});
        assert_eq!(compress(value), json!({"zero": 0, "no": false}));
    }

    #[test]
    fn test_drops_objects_emptied_by_compression() {
        let value = json!({
            "employee": {"name": "Ada", "manager": {"id": null, "tags": []}},
            "notes": {"": ""}
        });
        assert_eq!(compress(value), json!({"employee": {"name": "Ada"}}));
    }

    #[test]
    fn test_filters_array_items() {
        let value = json!([1, null, "", [], {}, [null], {"k": "v"}]);
        assert_eq!(compress(value), json!([1, {"k": "v"}]));
    }

    #[test]
    fn test_root_is_kept() {
        assert_eq!(compress(json!({"a": null})), json!({}));
        assert_eq!(compress(json!(null)), json!(null));
        assert_eq!(compress(json!("")), json!(""));
        assert_eq!(compress(json!(42)), json!(42));
    }
}
