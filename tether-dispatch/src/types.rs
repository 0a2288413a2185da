//! Request and response types exchanged through the dispatch layer.

use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};

/// Identifier of one hosted client session.
///
/// Positive, allocated process-wide in creation order, and stable until the
/// client's termination sentinel has been observed.
pub type ClientId = i32;

/// Caller-chosen request identifier, echoed in the matching responses.
///
/// `0` is reserved: sessions use it for unsolicited updates, and the
/// termination sentinel carries it.
pub type RequestId = u64;

/// Allocate the next process-wide client identifier.
pub(crate) fn alloc_client_id() -> ClientId {
    static NEXT_CLIENT_ID: AtomicI32 = AtomicI32::new(1);
    NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed)
}

// ─── Request ──────────────────────────────────────────────────────────────────

/// An opaque function payload submitted to a client session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Request {
    /// The serialized function to run; `None` marks a malformed request.
    pub function: Option<String>,
}

impl Request {
    /// Build a request around its function payload.
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: Some(function.into()),
        }
    }
}

impl From<&str> for Request {
    fn from(function: &str) -> Self {
        Self::new(function)
    }
}

impl From<String> for Request {
    fn from(function: String) -> Self {
        Self::new(function)
    }
}

// ─── RequestError ─────────────────────────────────────────────────────────────

/// An error payload delivered in place of a result.
///
/// Transport, protocol and semantic failures all travel this way through the
/// response stream; nothing is raised out-of-band.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestError {
    /// HTTP-like status code.
    pub code: i32,
    /// Human-readable description.
    pub message: String,
}

impl RequestError {
    /// Build an error payload.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The response synthesized for a request to an unknown client.
    pub(crate) fn invalid_client() -> Self {
        Self::new(400, "Invalid client identifier specified")
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for RequestError {}

// ─── Response ─────────────────────────────────────────────────────────────────

/// Payload of one delivered response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseObject {
    /// The engine's successful result.
    Object(String),
    /// An engine or dispatch error.
    Error(RequestError),
}

/// One entry of the consumer-facing response stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    /// The client the response belongs to.
    pub client_id: ClientId,
    /// The request that produced it; `0` for unsolicited updates and the
    /// termination sentinel.
    pub request_id: RequestId,
    /// `None` together with `request_id == 0` is the termination sentinel:
    /// no further responses will arrive for `client_id`.
    pub object: Option<ResponseObject>,
}

impl Response {
    /// True for the per-client termination sentinel.
    pub fn is_terminal(&self) -> bool {
        self.request_id == 0 && self.object.is_none()
    }
}
