//! Pluggable HTTP transport.
//!
//! A `Transport` performs exactly one round trip and hands back the raw
//! status, headers and body. It never decodes JSON and never interprets the
//! status code; a 404 or 500 is a successful `send`.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes `HttpRequest`s. Implementations may be shared across
/// concurrent calls.
pub trait Transport: Send + Sync + 'static {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// `Transport` backed by a blocking [`ureq`] agent.
///
/// Each call runs on tokio's blocking pool, so concurrent sends proceed in
/// parallel. The agent keeps its own connection pool and is cheap to clone.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    timeout: Duration,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            // Status codes are classified by the client, not the transport.
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Transport for UreqTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let agent = self.agent.clone();
        let timeout = self.timeout;
        tokio::task::spawn_blocking(move || execute(&agent, timeout, request))
            .await
            .map_err(|e| TransportError::Network(format!("transport task failed: {e}")))?
    }
}

fn execute(
    agent: &ureq::Agent,
    timeout: Duration,
    request: HttpRequest,
) -> Result<HttpResponse, TransportError> {
    let url = request.url();
    debug!(method = %request.method, %url, "sending request");

    let headers = &request.headers;
    let result = match (request.method, request.body.as_deref()) {
        (HttpMethod::Get, _) => with_headers(agent.get(&url), headers).call(),
        (HttpMethod::Delete, _) => with_headers(agent.delete(&url), headers).call(),
        (HttpMethod::Post, body) => send_payload(with_headers(agent.post(&url), headers), body),
        (HttpMethod::Put, body) => send_payload(with_headers(agent.put(&url), headers), body),
        (HttpMethod::Patch, body) => send_payload(with_headers(agent.patch(&url), headers), body),
    };

    let mut response = result.map_err(|e| map_ureq_error(e, timeout))?;
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| map_ureq_error(e, timeout))?;

    debug!(status, %url, "received response");
    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send_payload(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    body: Option<&str>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}

fn map_ureq_error(err: ureq::Error, timeout: Duration) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout(timeout),
        ureq::Error::HostNotFound => TransportError::Network("host not found".to_string()),
        other => TransportError::Network(other.to_string()),
    }
}
