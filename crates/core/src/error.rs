//! Client error model.

use thiserror::Error;

/// Result type used across the client.
pub type ClientResult<T> = Result<T, ClientError>;

/// Message fragments that mark a failure as network-level (retryable).
const RETRYABLE_MARKERS: &[&str] = &["network", "failed to fetch", "timeout", "timed out"];

/// Narrower set: failures that mean the device is offline.
const OFFLINE_MARKERS: &[&str] = &["network request failed", "failed to fetch"];

/// How a request failed before a response arrived.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransportKind {
    /// Could not connect (DNS, refused, unreachable).
    Connect,
    /// The request or connection timed out.
    Timeout,
    /// The request failed while being sent.
    Request,
    /// The response body could not be read.
    Body,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Connect => "connect",
            TransportKind::Timeout => "timeout",
            TransportKind::Request => "request",
            TransportKind::Body => "body",
        }
    }
}

/// Client-level error.
///
/// Callers get exactly one of these (or a payload) from every dispatched
/// request; nothing is silently swallowed except the designated cached reads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The server answered with a non-2xx status.
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response.
    #[error("network request failed ({}): {message}", .kind.as_str())]
    Transport { kind: TransportKind, message: String },

    /// A payload could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The key-value store failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// A URL could not be built from base URL and endpoint.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    pub fn transport(kind: TransportKind, message: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            message: message.into(),
        }
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// HTTP status, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Whether the dispatcher may retry the request after a backoff.
    ///
    /// Every transport failure qualifies. HTTP errors qualify only when their
    /// body reads like a network failure (e.g. a gateway reporting a timeout).
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport { .. } => true,
            ClientError::Http { body, .. } => matches_any(body, RETRYABLE_MARKERS),
            _ => false,
        }
    }

    /// Whether the failure means the host is offline, making the request a
    /// candidate for the offline queue.
    pub fn is_offline(&self) -> bool {
        match self {
            ClientError::Transport { kind, message } => {
                matches!(kind, TransportKind::Connect | TransportKind::Request)
                    || matches_any(message, OFFLINE_MARKERS)
            }
            ClientError::Http { body, .. } => matches_any(body, OFFLINE_MARKERS),
            _ => false,
        }
    }
}

fn matches_any(text: &str, markers: &[&str]) -> bool {
    let lower = text.to_ascii_lowercase();
    markers.iter().any(|m| lower.contains(m))
}

impl From<serde_json::Error> for ClientError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value.to_string())
    }
}
