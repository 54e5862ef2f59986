//! JSON text <-> structured value conversion.
//!
//! Pure and stateless; `serde_json::Value` is the tagged union
//! (`Null | Bool | Number | String | Array | Object`) every consumer matches
//! on.

use crate::error::DecodeError;

pub use serde_json::{Map, Value as JsonValue};

/// A JSON object: string keys to values.
pub type JsonObject = Map<String, JsonValue>;

/// Parse JSON text.
pub fn decode(text: &str) -> Result<JsonValue, DecodeError> {
    serde_json::from_str(text).map_err(|e| DecodeError::Malformed(e.to_string()))
}

/// Render a value as compact JSON text.
pub fn encode(value: &JsonValue) -> String {
    // Serializing a `Value` tree is infallible: keys are always strings and
    // numbers are always finite.
    value.to_string()
}

/// Render an object as compact JSON text.
pub fn encode_object(object: &JsonObject) -> String {
    encode(&JsonValue::Object(object.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn decode_rejects_malformed_text() {
        let err = decode("{not json").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
        assert!(matches!(decode(""), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn decode_reads_arrays_of_objects() {
        let value = decode(r#"[{"id":1},{"id":2}]"#).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["id"], 2);
    }

    #[test]
    fn encode_is_compact() {
        let value = json!({"title": "X", "tags": [1, 2], "draft": null});
        let text = encode(&value);
        assert!(!text.contains(' '));
        assert_eq!(decode(&text).unwrap(), value);
    }

    fn arb_json() -> impl Strategy<Value = JsonValue> {
        let leaf = prop_oneof![
            Just(JsonValue::Null),
            any::<bool>().prop_map(JsonValue::Bool),
            any::<i64>().prop_map(JsonValue::from),
            "[a-zA-Z0-9 _\\-\"\\\\]{0,12}".prop_map(JsonValue::String),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(JsonValue::Array),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                    .prop_map(|m| JsonValue::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(value in arb_json()) {
            prop_assert_eq!(decode(&encode(&value)).unwrap(), value);
        }
    }
}
