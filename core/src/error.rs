//! Error types for the resource client.
//!
//! # Design
//! Every operation returns `OperationResult<T>`, which is `Result<T,
//! ClientError>`. `NotFound` gets its own status variant because callers
//! routinely distinguish "the resource does not exist" from "the server
//! returned an unexpected status". Decode failures carry the field name or
//! array index so a bad payload can be diagnosed without re-fetching.

use std::time::Duration;

use thiserror::Error;

/// Outcome of every client operation.
pub type OperationResult<T> = Result<T, ClientError>;

/// Longest body excerpt kept on a status error.
const BODY_PREVIEW_LEN: usize = 200;

/// Coarse failure classification for callers that only branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    Status,
    Decode,
    Timeout,
    InvalidRequest,
}

/// Errors returned by `ResourceClient` operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The transport could not complete the round trip (DNS, refused
    /// connection, broken stream).
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a status the operation does not accept.
    #[error(transparent)]
    Status(#[from] StatusError),

    /// The body was not JSON or did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A transport timeout or call deadline expired before a response.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The request was rejected before any I/O happened.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Network(_) => ErrorKind::Network,
            ClientError::Status(_) => ErrorKind::Status,
            ClientError::Decode(_) => ErrorKind::Decode,
            ClientError::Timeout(_) => ErrorKind::Timeout,
            ClientError::InvalidRequest(_) => ErrorKind::InvalidRequest,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Status(StatusError::NotFound))
    }
}

/// Non-success HTTP status, classified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// Any other status the operation does not accept.
    #[error("HTTP {status}: {body}")]
    Other { status: u16, body: String },
}

impl StatusError {
    pub fn code(&self) -> u16 {
        match self {
            StatusError::NotFound => 404,
            StatusError::Other { status, .. } => *status,
        }
    }

    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        if status == 404 {
            return StatusError::NotFound;
        }
        StatusError::Other {
            status,
            body: body.chars().take(BODY_PREVIEW_LEN).collect(),
        }
    }
}

/// A body that could not be turned into the expected value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed JSON: {0}")]
    Malformed(String),

    #[error("missing required field `{field}`")]
    MissingField { field: String },

    #[error("field `{field}` has the wrong type, expected {expected}")]
    WrongType { field: String, expected: String },

    #[error("expected {expected}")]
    UnexpectedShape { expected: &'static str },

    /// An element of a list failed to decode; the whole list is rejected.
    #[error("element {index}: {source}")]
    AtIndex {
        index: usize,
        #[source]
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    pub fn missing(field: &str) -> Self {
        DecodeError::MissingField {
            field: field.to_string(),
        }
    }

    pub fn wrong_type(field: &str, expected: &str) -> Self {
        DecodeError::WrongType {
            field: field.to_string(),
            expected: expected.to_string(),
        }
    }

    /// Index of the failing element, if this error came from a list.
    pub fn index(&self) -> Option<usize> {
        match self {
            DecodeError::AtIndex { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Classifies a serde failure by the path it happened at.
///
/// serde reports an absent field on the enclosing struct, so its name is
/// taken from the message. A mistyped field is reported at its own path.
impl From<serde_path_to_error::Error<serde_json::Error>> for DecodeError {
    fn from(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        let path = err.path().to_string();
        let message = err.into_inner().to_string();
        if let Some(field) = message
            .strip_prefix("missing field `")
            .and_then(|rest| rest.strip_suffix('`'))
        {
            let field = match path.as_str() {
                "." => field.to_string(),
                parent => format!("{parent}.{field}"),
            };
            return DecodeError::MissingField { field };
        }
        if let Some((_, expected)) = message.split_once(", expected ") {
            return DecodeError::WrongType {
                field: path,
                expected: expected.to_string(),
            };
        }
        DecodeError::Malformed(message)
    }
}

/// Failure reported by a `Transport` before any response was received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Network(msg) => ClientError::Network(msg),
            TransportError::Timeout(after) => ClientError::Timeout(after),
        }
    }
}

impl From<tokio::task::JoinError> for ClientError {
    fn from(err: tokio::task::JoinError) -> Self {
        ClientError::Network(format!("request task failed: {err}"))
    }
}
