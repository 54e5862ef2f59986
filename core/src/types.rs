//! Domain records served by the posts API.
//!
//! # Design
//! Field names follow the wire format (`userId`, `postId`). `id` is `None`
//! until the server assigns one on create, and is left out of the encoded
//! object while absent.

use serde::{Deserialize, Serialize};

use crate::model::Resource;

/// A blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub user_id: u64,
    pub title: String,
    pub body: String,
}

impl Post {
    /// A post not yet known to the server.
    pub fn draft(user_id: u64, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: None,
            user_id,
            title: title.into(),
            body: body.into(),
        }
    }
}

impl Resource for Post {
    type Id = u64;
    const COLLECTION: &'static str = "posts";

    fn id(&self) -> Option<u64> {
        self.id
    }
}

/// A comment on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub post_id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub body: String,
}

impl Resource for Comment {
    type Id = u64;
    const COLLECTION: &'static str = "comments";

    fn id(&self) -> Option<u64> {
        self.id
    }
}

/// A todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub user_id: u64,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl Resource for Todo {
    type Id = u64;
    const COLLECTION: &'static str = "todos";

    fn id(&self) -> Option<u64> {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{JsonObject, JsonValue};
    use crate::error::DecodeError;
    use proptest::prelude::*;
    use serde_json::json;

    fn object(value: JsonValue) -> JsonObject {
        match value {
            JsonValue::Object(o) => o,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn post_decodes_wire_names() {
        let post = Post::decode(&object(json!({
            "id": 1, "userId": 7, "title": "X", "body": "Y"
        })))
        .unwrap();
        assert_eq!(
            post,
            Post {
                id: Some(1),
                user_id: 7,
                title: "X".to_string(),
                body: "Y".to_string(),
            }
        );
    }

    #[test]
    fn post_ignores_unknown_fields() {
        let post = Post::decode(&object(json!({
            "userId": 1, "title": "t", "body": "b", "tags": ["x"]
        })))
        .unwrap();
        assert_eq!(post.id, None);
    }

    #[test]
    fn draft_post_omits_id() {
        let encoded = Post::draft(1, "X", "Y").encode();
        assert!(!encoded.contains_key("id"));
        assert_eq!(
            JsonValue::Object(encoded),
            json!({"userId": 1, "title": "X", "body": "Y"})
        );
    }

    #[test]
    fn comment_defaults_optional_strings() {
        let comment = Comment::decode(&object(json!({"postId": 1, "body": "nice"})))
            .unwrap();
        assert_eq!(comment.name, "");
        assert_eq!(comment.email, "");
    }

    #[test]
    fn todo_defaults_completed_to_false() {
        let todo = Todo::decode(&object(json!({"userId": 1, "title": "t"}))).unwrap();
        assert!(!todo.completed);
    }

    #[test]
    fn todo_rejects_missing_title() {
        let err = Todo::decode(&object(json!({"userId": 1, "completed": true})))
            .unwrap_err();
        assert_eq!(err, DecodeError::missing("title"));
    }

    #[test]
    fn todo_rejects_string_user_id() {
        let err = Todo::decode(&object(json!({"userId": "1", "title": "t"})))
            .unwrap_err();
        assert_eq!(err, DecodeError::wrong_type("userId", "u64"));
    }

    #[test]
    fn todo_rejects_string_completed() {
        let err = Todo::decode(&object(json!({"userId": 1, "title": "t", "completed": "yes"})))
            .unwrap_err();
        assert_eq!(err, DecodeError::wrong_type("completed", "a boolean"));
    }

    proptest! {
        #[test]
        fn post_roundtrips(
            id in any::<Option<u64>>(),
            user_id in any::<u64>(),
            title in ".*",
            body in ".*",
        ) {
            let post = Post { id, user_id, title, body };
            prop_assert_eq!(Post::decode(&post.encode()).unwrap(), post);
        }

        #[test]
        fn comment_roundtrips(
            id in any::<Option<u64>>(),
            post_id in any::<u64>(),
            name in ".*",
            email in "[a-z]{1,8}@[a-z]{1,8}\\.com",
            body in ".*",
        ) {
            let comment = Comment { id, post_id, name, email, body };
            prop_assert_eq!(Comment::decode(&comment.encode()).unwrap(), comment);
        }

        #[test]
        fn todo_roundtrips(
            id in any::<Option<u64>>(),
            user_id in any::<u64>(),
            title in ".*",
            completed in any::<bool>(),
        ) {
            let todo = Todo { id, user_id, title, completed };
            prop_assert_eq!(Todo::decode(&todo.encode()).unwrap(), todo);
        }
    }
}
