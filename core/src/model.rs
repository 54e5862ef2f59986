//! Typed resource models and their JSON mapping.
//!
//! # Design
//! A `Resource` is a serde-derived domain record. Required fields that are
//! absent or mistyped fail with a `DecodeError` naming the key; fields marked
//! `#[serde(default)]` fall back to their default. Lists decode element by
//! element and reject the whole list on the first bad element, reporting its
//! index.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{JsonObject, JsonValue};
use crate::error::DecodeError;

/// A domain entity exposed by the remote API.
///
/// Implementations must satisfy `decode(&encode(x)) == x`.
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Identifier used in `/{collection}/{id}` paths. Rendered with
    /// `Display` and percent-encoded as a single path segment.
    type Id: fmt::Display + Clone + Send + Sync + 'static;

    /// Collection segment, e.g. `posts`.
    const COLLECTION: &'static str;

    /// Server-assigned id, `None` before the resource has been created.
    fn id(&self) -> Option<Self::Id>;

    fn decode(object: &JsonObject) -> Result<Self, DecodeError> {
        let value = JsonValue::Object(object.clone());
        Ok(serde_path_to_error::deserialize(value)?)
    }

    fn encode(&self) -> JsonObject {
        match serde_json::to_value(self) {
            Ok(JsonValue::Object(object)) => object,
            // A derived struct always serializes to an object.
            _ => JsonObject::new(),
        }
    }
}

/// Decode one resource from any JSON value; non-objects are rejected.
pub fn decode_one<R: Resource>(value: &JsonValue) -> Result<R, DecodeError> {
    match value {
        JsonValue::Object(object) => R::decode(object),
        _ => Err(DecodeError::UnexpectedShape {
            expected: "a JSON object",
        }),
    }
}

/// Decode a JSON array of resources, preserving order. Fails fast on the
/// first malformed element.
pub fn decode_list<R: Resource>(value: &JsonValue) -> Result<Vec<R>, DecodeError> {
    let JsonValue::Array(items) = value else {
        return Err(DecodeError::UnexpectedShape {
            expected: "a JSON array",
        });
    };
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            decode_one(item).map_err(|source| DecodeError::AtIndex {
                index,
                source: Box::new(source),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Post;
    use serde_json::json;

    #[test]
    fn decode_names_missing_field() {
        let err = decode_one::<Post>(&json!({"userId": 1, "body": "b"})).unwrap_err();
        assert_eq!(err, DecodeError::missing("title"));
    }

    #[test]
    fn decode_names_mistyped_field() {
        let err = decode_one::<Post>(&json!({"userId": "1", "title": "t", "body": "b"}))
            .unwrap_err();
        assert_eq!(err, DecodeError::wrong_type("userId", "u64"));
    }

    #[test]
    fn negative_ids_are_rejected() {
        let value = json!({"id": -3, "userId": 1, "title": "t", "body": "b"});
        let err = decode_one::<Post>(&value).unwrap_err();
        assert_eq!(err, DecodeError::wrong_type("id", "u64"));
    }

    #[test]
    fn null_id_is_absent() {
        let value = json!({"id": null, "userId": 1, "title": "t", "body": "b"});
        assert_eq!(decode_one::<Post>(&value).unwrap().id, None);
    }

    #[test]
    fn decode_one_rejects_non_objects() {
        let err = decode_one::<Post>(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedShape { .. }));
    }

    #[test]
    fn decode_list_preserves_order() {
        let value = json!([
            {"id": 3, "userId": 1, "title": "c", "body": ""},
            {"id": 1, "userId": 1, "title": "a", "body": ""},
        ]);
        let posts: Vec<Post> = decode_list(&value).unwrap();
        let ids: Vec<_> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![Some(3), Some(1)]);
    }

    #[test]
    fn decode_list_reports_failing_index() {
        let value = json!([
            {"id": 1, "userId": 1, "title": "a", "body": ""},
            {"id": 2, "userId": 1, "title": "b", "body": ""},
            {"id": 3, "userId": 1, "body": ""},
        ]);
        let err = decode_list::<Post>(&value).unwrap_err();
        assert_eq!(
            err,
            DecodeError::AtIndex {
                index: 2,
                source: Box::new(DecodeError::missing("title")),
            }
        );
    }

    #[test]
    fn decode_list_rejects_objects() {
        let err = decode_list::<Post>(&json!({"id": 1})).unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedShape { .. }));
    }
}
