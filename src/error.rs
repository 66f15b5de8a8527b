//! Error types for the Yari library.
//!
//! All failures are represented by the [`YariError`] enum. Each failing
//! operation reports a distinguishable kind: caller errors
//! ([`YariError::InvalidQuery`], [`YariError::InvalidDocument`],
//! [`YariError::NotConnected`]) never reach the wire, while
//! [`YariError::RemoteQuery`] and [`YariError::MalformedResponse`] carry
//! what the backend actually said.
//!
//! # Examples
//!
//! ```
//! use yari::error::{Result, YariError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(YariError::invalid_query("range query requires at least one bound"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {e}"),
//! }
//! ```

use anyhow;
use thiserror::Error;

/// The main error type for Yari operations.
///
/// Uses the `thiserror` crate for automatic `Error` trait implementation
/// and provides convenient constructor methods for the common kinds.
#[derive(Error, Debug)]
pub enum YariError {
    /// A query that cannot be expressed in the wire DSL (builder-time).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A document that cannot be indexed, e.g. an empty id.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// The backend returned a reply that does not match the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The backend rejected the request; status and body are carried verbatim.
    #[error("remote query error (status {status}): {body}")]
    RemoteQuery {
        /// HTTP-style status code reported by the backend.
        status: u16,
        /// Reply body as received.
        body: String,
    },

    /// An operation was attempted before `connect` succeeded.
    #[error("client is not connected")]
    NotConnected,

    /// The transport collaborator failed below the status level.
    #[error("transport error: {0}")]
    Transport(String),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic anyhow error.
    #[error("error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with [`YariError`].
pub type Result<T> = std::result::Result<T, YariError>;

impl YariError {
    /// Create a new invalid query error.
    pub fn invalid_query<S: Into<String>>(msg: S) -> Self {
        YariError::InvalidQuery(msg.into())
    }

    /// Create a new invalid document error.
    pub fn invalid_document<S: Into<String>>(msg: S) -> Self {
        YariError::InvalidDocument(msg.into())
    }

    /// Create a new malformed response error.
    pub fn malformed_response<S: Into<String>>(msg: S) -> Self {
        YariError::MalformedResponse(msg.into())
    }

    /// Create a new remote query error from a backend status and body.
    pub fn remote<S: Into<String>>(status: u16, body: S) -> Self {
        YariError::RemoteQuery {
            status,
            body: body.into(),
        }
    }

    /// Create a new transport error.
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        YariError::Transport(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = YariError::invalid_query("both bounds absent");
        assert_eq!(error.to_string(), "invalid query: both bounds absent");

        let error = YariError::remote(400, "no such field");
        assert_eq!(
            error.to_string(),
            "remote query error (status 400): no such field"
        );

        let error = YariError::NotConnected;
        assert_eq!(error.to_string(), "client is not connected");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = YariError::from(json_error);

        match error {
            YariError::Json(_) => {}
            _ => panic!("Expected JSON error variant"),
        }
    }
}
