//! # Yari
//!
//! A typed query builder and response decoding client for JSON
//! document-search backends.
//!
//! ## Features
//!
//! - Typed, composable query trees: term, match, range, boolean compounds
//! - Raw DSL pass-through for hand-written query bodies
//! - Response decoding into typed hits, totals with exactness relation,
//!   and ordered aggregation buckets
//! - Pluggable blocking transports with an explicit connect-once
//!   lifecycle
//! - In-memory backend for tests and prototyping

pub mod client;
pub mod document;
pub mod error;
pub mod query;
pub mod search;
pub mod transport;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
