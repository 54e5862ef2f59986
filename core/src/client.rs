//! Typed CRUD client for one resource collection.
//!
//! # Design
//! `ResourceClient<R, T>` is generic over a `Resource` model and a
//! `Transport`. Each operation is split into a pure `build_*` method that
//! produces an `HttpRequest` and a pure `parse_*` method that consumes an
//! `HttpResponse`; the async method of the same name is exactly build, one
//! `Transport::send`, then parse. Callers with their own HTTP stack can use
//! the pure halves directly.
//!
//! The client holds no mutable state. Cloning it shares the transport, so
//! one connection pool serves every clone and every concurrent call.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::codec::{self, JsonObject, JsonValue};
use crate::concurrency;
use crate::config::ClientConfig;
use crate::error::{ClientError, DecodeError, ErrorKind, OperationResult, StatusError};
use crate::http::{Endpoint, HttpMethod, HttpRequest, HttpResponse};
use crate::model::{self, Resource};
use crate::transport::{Transport, UreqTransport};

pub struct ResourceClient<R, T = UreqTransport> {
    config: ClientConfig,
    transport: Arc<T>,
    _resource: PhantomData<fn() -> R>,
}

impl<R, T> Clone for ResourceClient<R, T> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            transport: Arc::clone(&self.transport),
            _resource: PhantomData,
        }
    }
}

impl<R, T> std::fmt::Debug for ResourceClient<R, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<R: Resource> ResourceClient<R, UreqTransport> {
    /// Client for `base_url` with default settings and a ureq transport.
    pub fn new(base_url: &str) -> Self {
        Self::from_config(ClientConfig::new(base_url))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        let transport = UreqTransport::new(config.timeout);
        Self::with_transport(config, transport)
    }
}

impl<R: Resource, T: Transport> ResourceClient<R, T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self::with_shared_transport(config, Arc::new(transport))
    }

    pub fn with_shared_transport(mut config: ClientConfig, transport: Arc<T>) -> Self {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Self {
            config,
            transport,
            _resource: PhantomData,
        }
    }

    /// A client for another collection on the same host and transport.
    pub fn for_resource<S: Resource>(&self) -> ResourceClient<S, T> {
        ResourceClient::with_shared_transport(self.config.clone(), Arc::clone(&self.transport))
    }

    /// A copy of this client whose transport calls expire after `deadline`.
    pub fn with_deadline(&self, deadline: Duration) -> Self {
        let mut client = self.clone();
        client.config.deadline = Some(deadline);
        client
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Build
    // -----------------------------------------------------------------------

    pub fn build_get(&self, id: &R::Id) -> OperationResult<HttpRequest> {
        let endpoint = self.item_endpoint(id)?;
        Ok(HttpRequest::without_body(HttpMethod::Get, endpoint))
    }

    /// GET the collection with filter query parameters; values are
    /// stringified.
    pub fn build_list<I, K, V>(&self, filters: I) -> OperationResult<HttpRequest>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let endpoint = self.collection_endpoint()?.with_query(filters);
        Ok(HttpRequest::without_body(HttpMethod::Get, endpoint))
    }

    pub fn build_create(&self, resource: &R) -> OperationResult<HttpRequest> {
        let endpoint = self.collection_endpoint()?;
        let body = codec::encode_object(&resource.encode());
        Ok(HttpRequest::with_json_body(HttpMethod::Post, endpoint, body))
    }

    /// PUT the full resource to its own path. The resource must have an id.
    pub fn build_update(&self, resource: &R) -> OperationResult<HttpRequest> {
        let id = resource.id().ok_or_else(|| {
            ClientError::InvalidRequest(format!(
                "cannot update a {} entry that has no id",
                R::COLLECTION
            ))
        })?;
        let endpoint = self.item_endpoint(&id)?;
        let body = codec::encode_object(&resource.encode());
        Ok(HttpRequest::with_json_body(HttpMethod::Put, endpoint, body))
    }

    /// PATCH only the given fields.
    pub fn build_patch(&self, id: &R::Id, fields: &JsonObject) -> OperationResult<HttpRequest> {
        let endpoint = self.item_endpoint(id)?;
        let body = codec::encode_object(fields);
        Ok(HttpRequest::with_json_body(HttpMethod::Patch, endpoint, body))
    }

    pub fn build_delete(&self, id: &R::Id) -> OperationResult<HttpRequest> {
        let endpoint = self.item_endpoint(id)?;
        Ok(HttpRequest::without_body(HttpMethod::Delete, endpoint))
    }

    // -----------------------------------------------------------------------
    // Parse
    // -----------------------------------------------------------------------

    pub fn parse_get(&self, response: HttpResponse) -> OperationResult<R> {
        check_status(&response, &[200])?;
        decode_body(&response, model::decode_one)
    }

    pub fn parse_list(&self, response: HttpResponse) -> OperationResult<Vec<R>> {
        check_status(&response, &[200])?;
        decode_body(&response, model::decode_list)
    }

    pub fn parse_create(&self, response: HttpResponse) -> OperationResult<R> {
        check_status(&response, &[201])?;
        decode_body(&response, model::decode_one)
    }

    pub fn parse_update(&self, response: HttpResponse) -> OperationResult<R> {
        check_status(&response, &[200])?;
        decode_body(&response, model::decode_one)
    }

    pub fn parse_patch(&self, response: HttpResponse) -> OperationResult<R> {
        check_status(&response, &[200])?;
        decode_body(&response, model::decode_one)
    }

    /// 200 and 204 both mean the resource is gone; any body is ignored.
    pub fn parse_delete(&self, response: HttpResponse) -> OperationResult<()> {
        check_status(&response, &[200, 204])
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    pub async fn get(&self, id: &R::Id) -> OperationResult<R> {
        let request = self.build_get(id)?;
        let response = self.dispatch(request).await?;
        self.parse_get(response)
    }

    pub async fn list<I, K, V>(&self, filters: I) -> OperationResult<Vec<R>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let request = self.build_list(filters)?;
        let response = self.dispatch(request).await?;
        self.parse_list(response)
    }

    pub async fn list_all(&self) -> OperationResult<Vec<R>> {
        self.list(std::iter::empty::<(String, String)>()).await
    }

    /// POST a new resource; the server's copy (with its assigned id) is
    /// returned.
    pub async fn create(&self, resource: &R) -> OperationResult<R> {
        let request = self.build_create(resource)?;
        let response = self.dispatch(request).await?;
        self.parse_create(response)
    }

    pub async fn update(&self, resource: &R) -> OperationResult<R> {
        let request = self.build_update(resource)?;
        let response = self.dispatch(request).await?;
        self.parse_update(response)
    }

    pub async fn patch(&self, id: &R::Id, fields: &JsonObject) -> OperationResult<R> {
        let request = self.build_patch(id, fields)?;
        let response = self.dispatch(request).await?;
        self.parse_patch(response)
    }

    pub async fn delete(&self, id: &R::Id) -> OperationResult<()> {
        let request = self.build_delete(id)?;
        let response = self.dispatch(request).await?;
        self.parse_delete(response)
    }

    /// Fetch every id concurrently. Values come back in the order of `ids`;
    /// the first failure fails the whole batch.
    pub async fn fetch_many(&self, ids: &[R::Id]) -> OperationResult<Vec<R>> {
        debug!(collection = R::COLLECTION, count = ids.len(), "fetching batch");
        let operations = ids.iter().cloned().map(|id| {
            let client = self.clone();
            async move { client.get(&id).await }
        });
        concurrency::join_ordered(operations, self.config.cancel_policy).await
    }

    /// Fetch every id concurrently and return whichever succeeds first.
    pub async fn race(&self, ids: &[R::Id]) -> OperationResult<R> {
        let operations = ids.iter().cloned().map(|id| {
            let client = self.clone();
            async move { client.get(&id).await }
        });
        concurrency::first_success(operations, self.config.cancel_policy).await
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn collection_endpoint(&self) -> OperationResult<Endpoint> {
        Endpoint::new(&self.config.base_url, format!("/{}", R::COLLECTION))
    }

    /// The id is percent-encoded so it always stays one path segment.
    fn item_endpoint(&self, id: &R::Id) -> OperationResult<Endpoint> {
        let segment = urlencoding::encode(&id.to_string()).into_owned();
        Endpoint::new(&self.config.base_url, format!("/{}/{segment}", R::COLLECTION))
    }

    /// The only suspension point of an operation.
    async fn dispatch(&self, request: HttpRequest) -> OperationResult<HttpResponse> {
        let method = request.method;
        let send = self.transport.send(request);
        let result = match self.config.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, send).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(collection = R::COLLECTION, %method, ?deadline, "deadline expired");
                    return Err(ClientError::Timeout(deadline));
                }
            },
            None => send.await,
        };
        result.map_err(|err| {
            warn!(collection = R::COLLECTION, %method, error = %err, "transport failed");
            ClientError::from(err)
        })
    }
}

/// Accept only the listed statuses; 404 becomes `NotFound`.
fn check_status(response: &HttpResponse, expected: &[u16]) -> OperationResult<()> {
    if expected.contains(&response.status) {
        return Ok(());
    }
    let err = StatusError::from_response(response.status, &response.body);
    warn!(status = response.status, ?expected, "unexpected status");
    Err(err.into())
}

fn decode_body<V>(
    response: &HttpResponse,
    decode: impl FnOnce(&JsonValue) -> Result<V, DecodeError>,
) -> OperationResult<V> {
    codec::decode(&response.body)
        .and_then(|value| decode(&value))
        .map_err(|err| {
            warn!(error = %err, "response body did not decode");
            err.into()
        })
}

/// Opt-in substitution of a fallback value for timed-out operations.
pub trait TimeoutFallback<T> {
    /// Replace a `Timeout` failure with `fallback()`; any other outcome
    /// passes through unchanged.
    fn or_timeout_fallback(self, fallback: impl FnOnce() -> T) -> OperationResult<T>;
}

impl<T> TimeoutFallback<T> for OperationResult<T> {
    fn or_timeout_fallback(self, fallback: impl FnOnce() -> T) -> OperationResult<T> {
        match self {
            Err(err) if err.kind() == ErrorKind::Timeout => {
                debug!(error = %err, "substituting fallback for timed-out operation");
                Ok(fallback())
            }
            other => other,
        }
    }
}
