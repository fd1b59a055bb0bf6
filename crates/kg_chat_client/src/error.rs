//! Client error taxonomy. Degraded payloads and backend-reported errors are
//! not errors at this level; they show up in [`crate::QueryResponse`] and
//! [`crate::ResponseView::BackendError`].

use thiserror::Error;

/// Longest body excerpt carried by [`ClientError::HttpStatus`].
pub const BODY_EXCERPT_CHARS: usize = 2000;

/// Failed question or health exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("backend URL is not configured")]
    NotConfigured,

    #[error("question is empty")]
    Validation,

    #[error("backend HTTP {status}")]
    HttpStatus { status: u16, body: String },

    #[error("request failed ({kind}): {message}")]
    Transport {
        kind: TransportErrorKind,
        message: String,
    },
}

impl ClientError {
    pub fn http_status(status: u16, body: &str) -> Self {
        ClientError::HttpStatus {
            status,
            body: excerpt(body),
        }
    }

    /// True for the two warnings raised before any I/O.
    pub fn is_warning(&self) -> bool {
        matches!(self, ClientError::NotConfigured | ClientError::Validation)
    }
}

impl From<TransportError> for ClientError {
    fn from(e: TransportError) -> Self {
        ClientError::Transport {
            kind: e.kind,
            message: e.message,
        }
    }
}

/// First [`BODY_EXCERPT_CHARS`] characters of `body`.
pub fn excerpt(body: &str) -> String {
    match body.char_indices().nth(BODY_EXCERPT_CHARS) {
        Some((idx, _)) => body[..idx].to_string(),
        None => body.to_string(),
    }
}

/// Category of a network failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    InvalidUrl,
    Request,
    Decode,
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::InvalidUrl => "invalid url",
            TransportErrorKind::Request => "request",
            TransportErrorKind::Decode => "decode",
        };
        f.write_str(name)
    }
}

/// Failure reported by a [`crate::Transport`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            TransportErrorKind::Timeout
        } else if e.is_connect() {
            TransportErrorKind::Connect
        } else if e.is_builder() {
            TransportErrorKind::InvalidUrl
        } else if e.is_decode() || e.is_body() {
            TransportErrorKind::Decode
        } else {
            TransportErrorKind::Request
        };
        TransportError::new(kind, e.to_string())
    }
}
