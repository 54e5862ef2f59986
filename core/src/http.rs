//! HTTP transport types for the resource client.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The
//! client builds `HttpRequest` values and parses `HttpResponse` values; a
//! `Transport` is the only component that touches the network. Everything
//! here is an immutable value object created and dropped within a single
//! operation.

use std::fmt;

use crate::error::ClientError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Whether requests with this method carry a JSON payload.
    pub fn carries_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One API location: host, path, and ordered query parameters.
///
/// `host` is the scheme plus authority (e.g. `https://example.com`) and must
/// be non-empty; `path` must start with `/`. Query values are kept as
/// strings and percent-encoded only when the URL is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    path: String,
    query: Vec<(String, String)>,
}

impl Endpoint {
    pub fn new(host: &str, path: impl Into<String>) -> Result<Self, ClientError> {
        let host = host.trim_end_matches('/');
        if host.is_empty() {
            return Err(ClientError::InvalidRequest("endpoint host is empty".to_string()));
        }
        let path = path.into();
        if !path.starts_with('/') {
            return Err(ClientError::InvalidRequest(format!(
                "endpoint path must start with '/': {path:?}"
            )));
        }
        Ok(Self {
            host: host.to_string(),
            path,
            query: Vec::new(),
        })
    }

    /// Append query parameters, preserving the order they are given in.
    pub fn with_query<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        self.query
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.to_string())));
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Render the full URL, e.g. `https://host/posts?userId=1&title=a%20b`.
    pub fn url(&self) -> String {
        let mut url = format!("{}{}", self.host, self.path);
        if !self.query.is_empty() {
            url.push('?');
            url.push_str(&encode_query(&self.query));
        }
        url
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

/// Percent-encode `key=value` pairs joined by `&`.
///
/// Spaces are emitted as `%20` rather than the form-encoding `+` so the
/// result is unambiguous in a URL query.
fn encode_query(pairs: &[(String, String)]) -> String {
    // Encoding a slice of string pairs cannot fail.
    serde_urlencoded::to_string(pairs)
        .unwrap_or_default()
        .replace('+', "%20")
}

/// An HTTP request described as plain data.
///
/// Built by `ResourceClient::build_*` methods. `body` is present only for
/// POST/PUT/PATCH and is already-encoded JSON text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub endpoint: Endpoint,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// A bodiless request (GET or DELETE) accepting JSON.
    pub fn without_body(method: HttpMethod, endpoint: Endpoint) -> Self {
        debug_assert!(!method.carries_body());
        Self {
            method,
            endpoint,
            headers: vec![accept_json()],
            body: None,
        }
    }

    /// A request carrying a JSON payload (POST, PUT or PATCH).
    pub fn with_json_body(method: HttpMethod, endpoint: Endpoint, body: String) -> Self {
        debug_assert!(method.carries_body());
        Self {
            method,
            endpoint,
            headers: vec![accept_json(), content_type_json()],
            body: Some(body),
        }
    }

    pub fn url(&self) -> String {
        self.endpoint.url()
    }
}

fn accept_json() -> (String, String) {
    ("accept".to_string(), "application/json".to_string())
}

fn content_type_json() -> (String, String) {
    ("content-type".to_string(), "application/json".to_string())
}

/// An HTTP response described as plain data (the response envelope).
///
/// Produced by a `Transport` and passed untouched to the `parse_*` methods;
/// non-2xx statuses are data here, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
