//! In-memory REST resource server for local development and tests.
//!
//! Serves the `posts`, `comments` and `todos` collections with the usual
//! JSONPlaceholder-style routes. Records are arbitrary JSON objects; the
//! server only owns the `id` field.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

/// Collections the server knows about. Anything else is a 404.
pub const COLLECTIONS: &[&str] = &["posts", "comments", "todos"];

pub type Record = Map<String, Value>;

#[derive(Debug, Default)]
struct Collection {
    last_id: u64,
    records: BTreeMap<u64, Record>,
}

impl Collection {
    fn insert(&mut self, mut record: Record) -> Record {
        self.last_id += 1;
        record.insert("id".to_string(), self.last_id.into());
        self.records.insert(self.last_id, record.clone());
        record
    }
}

/// Shared handle to every collection's records.
#[derive(Debug, Clone)]
pub struct Store {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::empty()
    }
}

impl Store {
    /// All known collections, with no records.
    pub fn empty() -> Self {
        let collections = COLLECTIONS
            .iter()
            .map(|name| (name.to_string(), Collection::default()))
            .collect();
        Self {
            collections: Arc::new(RwLock::new(collections)),
        }
    }

    /// A handful of posts, comments and todos.
    pub fn seeded() -> Self {
        let mut collections: HashMap<String, Collection> = COLLECTIONS
            .iter()
            .map(|name| (name.to_string(), Collection::default()))
            .collect();

        let seed = [
            (
                "posts",
                json!([
                    {"userId": 1, "title": "sunt aut facere", "body": "quia et suscipit"},
                    {"userId": 1, "title": "qui est esse", "body": "est rerum tempore"},
                    {"userId": 2, "title": "ea molestias quasi", "body": "et iusto sed quo"},
                ]),
            ),
            (
                "comments",
                json!([
                    {
                        "postId": 1,
                        "name": "id labore",
                        "email": "eliseo@gardner.biz",
                        "body": "laudantium"
                    },
                    {
                        "postId": 1,
                        "name": "quo vero",
                        "email": "jayne@kuhic.sh",
                        "body": "est natus"
                    },
                    {
                        "postId": 2,
                        "name": "odio adipisci",
                        "email": "nikita@garfield.biz",
                        "body": "quia molestiae"
                    },
                ]),
            ),
            (
                "todos",
                json!([
                    {"userId": 1, "title": "delectus aut autem", "completed": false},
                    {"userId": 1, "title": "fugiat veniam minus", "completed": true},
                ]),
            ),
        ];
        for (name, records) in seed {
            let (Some(collection), Value::Array(records)) = (collections.get_mut(name), records)
            else {
                continue;
            };
            for record in records {
                if let Value::Object(record) = record {
                    collection.insert(record);
                }
            }
        }

        Self {
            collections: Arc::new(RwLock::new(collections)),
        }
    }
}

pub fn app() -> Router {
    app_with_store(Store::empty())
}

pub fn app_with_store(store: Store) -> Router {
    Router::new()
        .route("/{collection}", get(list_records).post(create_record))
        .route(
            "/{collection}/{id}",
            get(get_record)
                .put(replace_record)
                .patch(patch_record)
                .delete(delete_record),
        )
        .with_state(store)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_store(listener, Store::empty()).await
}

pub async fn run_with_store(listener: TcpListener, store: Store) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock server listening");
    }
    axum::serve(listener, app_with_store(store)).await
}

/// Query-string filter match: the field's value, rendered as text, must
/// equal the filter value. Strings compare without their quotes.
fn matches_filters(record: &Record, filters: &HashMap<String, String>) -> bool {
    filters.iter().all(|(key, expected)| match record.get(key) {
        Some(Value::String(s)) => s == expected,
        Some(other) => other.to_string() == *expected,
        None => false,
    })
}

fn into_object(body: Value) -> Result<Record, StatusCode> {
    match body {
        Value::Object(record) => Ok(record),
        _ => Err(StatusCode::UNPROCESSABLE_ENTITY),
    }
}

async fn list_records(
    State(store): State<Store>,
    Path(collection): Path<String>,
    Query(filters): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Record>>, StatusCode> {
    let collections = store.collections.read().await;
    let records = collections.get(&collection).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(
        records
            .records
            .values()
            .filter(|r| matches_filters(r, &filters))
            .cloned()
            .collect(),
    ))
}

async fn create_record(
    State(store): State<Store>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Record>), StatusCode> {
    let mut record = into_object(body)?;
    record.remove("id");
    let mut collections = store.collections.write().await;
    let records = collections.get_mut(&collection).ok_or(StatusCode::NOT_FOUND)?;
    let created = records.insert(record);
    debug!(%collection, id = records.last_id, "created record");
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_record(
    State(store): State<Store>,
    Path((collection, id)): Path<(String, u64)>,
) -> Result<Json<Record>, StatusCode> {
    let collections = store.collections.read().await;
    collections
        .get(&collection)
        .and_then(|c| c.records.get(&id))
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn replace_record(
    State(store): State<Store>,
    Path((collection, id)): Path<(String, u64)>,
    Json(body): Json<Value>,
) -> Result<Json<Record>, StatusCode> {
    let mut record = into_object(body)?;
    record.insert("id".to_string(), id.into());
    let mut collections = store.collections.write().await;
    let existing = collections
        .get_mut(&collection)
        .and_then(|c| c.records.get_mut(&id))
        .ok_or(StatusCode::NOT_FOUND)?;
    *existing = record;
    debug!(%collection, id, "replaced record");
    Ok(Json(existing.clone()))
}

async fn patch_record(
    State(store): State<Store>,
    Path((collection, id)): Path<(String, u64)>,
    Json(body): Json<Value>,
) -> Result<Json<Record>, StatusCode> {
    let mut changes = into_object(body)?;
    changes.remove("id");
    let mut collections = store.collections.write().await;
    let existing = collections
        .get_mut(&collection)
        .and_then(|c| c.records.get_mut(&id))
        .ok_or(StatusCode::NOT_FOUND)?;
    existing.extend(changes);
    debug!(%collection, id, "patched record");
    Ok(Json(existing.clone()))
}

async fn delete_record(
    State(store): State<Store>,
    Path((collection, id)): Path<(String, u64)>,
) -> Result<StatusCode, StatusCode> {
    let mut collections = store.collections.write().await;
    collections
        .get_mut(&collection)
        .and_then(|c| c.records.remove(&id))
        .map(|_| {
            debug!(%collection, id, "deleted record");
            StatusCode::NO_CONTENT
        })
        .ok_or(StatusCode::NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(r) => r,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn collection_assigns_increasing_ids() {
        let mut posts = Collection::default();
        let first = posts.insert(record(json!({"title": "a"})));
        let second = posts.insert(record(json!({"title": "b"})));
        assert_eq!(first["id"], 1);
        assert_eq!(second["id"], 2);
        assert_eq!(posts.records.len(), 2);
    }

    #[test]
    fn filters_compare_rendered_values() {
        let r = record(json!({"userId": 1, "title": "x", "completed": false}));
        let filters = |pairs: &[(&str, &str)]| -> HashMap<String, String> {
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
        };
        assert!(matches_filters(&r, &filters(&[])));
        assert!(matches_filters(&r, &filters(&[("userId", "1")])));
        assert!(matches_filters(&r, &filters(&[("title", "x"), ("completed", "false")])));
        assert!(!matches_filters(&r, &filters(&[("userId", "2")])));
        assert!(!matches_filters(&r, &filters(&[("missing", "1")])));
    }

    #[test]
    fn non_objects_are_unprocessable() {
        assert_eq!(into_object(json!([1])).unwrap_err(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(into_object(json!({})).is_ok());
    }

    #[tokio::test]
    async fn seeded_store_has_every_collection() {
        let store = Store::seeded();
        let collections = store.collections.read().await;
        for name in COLLECTIONS {
            assert!(!collections[*name].records.is_empty(), "{name} is empty");
        }
        assert_eq!(collections["posts"].last_id, 3);
    }
}
