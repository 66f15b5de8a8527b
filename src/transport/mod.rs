//! Transport abstraction between the client and a search backend.
//!
//! A transport is one blocking request/response exchange: a method, a
//! path, an optional body in; a status and body out. Implementations own
//! the connection parameters (host, port, credentials) — the client
//! never sees them, and never supplies defaults for them. Retry,
//! pooling, and reconnect policies also live on this side of the seam.

pub mod memory;

pub use self::memory::{MemoryTransport, MemoryTransportConfig};

use std::time::Duration;

use crate::error::Result;

/// HTTP-style request methods used by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Read a resource.
    Get,
    /// Create or replace a resource.
    Put,
    /// Submit a request body, e.g. a search.
    Post,
}

impl Method {
    /// Get the wire name of this method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
        }
    }
}

/// A single request handed to the transport collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// The request method.
    pub method: Method,
    /// The request path, e.g. `/products/_search`.
    pub path: String,
    /// The request body, if any.
    pub body: Option<Vec<u8>>,
    /// Caller-supplied deadline, propagated verbatim. The transport may
    /// enforce or ignore it; the client never reinterprets it.
    pub deadline: Option<Duration>,
}

impl TransportRequest {
    /// Create a new request without a body.
    pub fn new<P: Into<String>>(method: Method, path: P) -> Self {
        TransportRequest {
            method,
            path: path.into(),
            body: None,
            deadline: None,
        }
    }

    /// Attach a request body.
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach a deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// A raw backend reply.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// Reply body as received.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Create a new response.
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        TransportResponse { status, body }
    }

    /// True for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A trait for backends that can exchange request/response pairs.
///
/// One call is one blocking round trip. Implementations must be safe to
/// share across threads; the client issues concurrent calls through a
/// shared reference.
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Send a request and wait for the reply.
    ///
    /// A non-2xx reply is still `Ok`: status handling is the client's
    /// job. `Err` is reserved for failures below the status level, e.g.
    /// a broken connection.
    fn send(&self, request: &TransportRequest) -> Result<TransportResponse>;
}
