//! Typed REST resource client.
//!
//! # Overview
//! Talks to a conventional JSON REST server: create, read, list with
//! filters, update, patch and delete records of a collection, plus
//! concurrent batch fetches and races. Every operation resolves to an
//! `OperationResult<T>` that is either the fully decoded value or a
//! classified `ClientError`.
//!
//! # Design
//! - `http` holds request/response types as plain data; `transport` is the
//!   only layer that performs I/O.
//! - `codec` and `model` are pure: JSON text to `JsonValue` to a typed
//!   `Resource`, and back.
//! - `ResourceClient` composes them. Each operation is also exposed as a
//!   `build_*`/`parse_*` pair so the I/O boundary stays explicit.
//! - `concurrency` implements the ordered join and first-success race used
//!   by `fetch_many` and `race`.

pub mod client;
pub mod codec;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod transport;
pub mod types;

pub use client::{ResourceClient, TimeoutFallback};
pub use codec::{JsonObject, JsonValue};
pub use config::{CancelPolicy, ClientConfig, ConfigError};
pub use error::{ClientError, DecodeError, ErrorKind, OperationResult, StatusError, TransportError};
pub use http::{Endpoint, HttpMethod, HttpRequest, HttpResponse};
pub use model::Resource;
pub use transport::{Transport, UreqTransport};
pub use types::{Comment, Post, Todo};
