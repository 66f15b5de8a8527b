//! Search client orchestration over a transport collaborator.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, trace};
use parking_lot::RwLock;
use serde::Deserialize;

use crate::document::{Document, FieldValue};
use crate::error::{Result, YariError};
use crate::query::Query;
use crate::search::{SearchOptions, SearchResult, request_body};
use crate::transport::{Method, Transport, TransportRequest, TransportResponse};

/// Connection lifecycle of a [`SearchClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Initial state; every operation except `connect` is rejected.
    Disconnected,
    /// One-time setup succeeded; operations are allowed.
    Connected,
}

/// Acknowledgment of a successful index operation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IndexAck {
    /// The id the document was stored under.
    #[serde(rename = "_id")]
    pub id: String,
    /// Backend outcome, `created` or `updated`.
    pub result: String,
}

/// A client for a JSON document-search backend.
///
/// The client is a thin orchestration layer: it serializes queries,
/// hands bodies to the transport collaborator, and decodes replies. It
/// keeps no cache and no state between calls beyond the connection
/// itself, and it never retries; retry and reconnect policies belong to
/// the transport.
///
/// The lifecycle is explicit. A client starts `Disconnected` and every
/// operation except [`SearchClient::connect`] fails with `NotConnected`
/// until the one-time setup succeeds. There is no automatic reconnect.
///
/// All operations take `&self` and the client is `Send + Sync`: once
/// connected, concurrent calls share the connection state read-only.
#[derive(Debug)]
pub struct SearchClient {
    transport: Arc<dyn Transport>,
    state: RwLock<ConnectionState>,
}

impl SearchClient {
    /// Create a new, disconnected client over the given transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        SearchClient {
            transport,
            state: RwLock::new(ConnectionState::Disconnected),
        }
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Check whether the one-time setup has completed.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// One-time connection setup.
    ///
    /// Performs a single handshake round trip through the transport. The
    /// write lock is held across the handshake, so racing first calls
    /// serialize and the handshake runs at most once; calling `connect`
    /// on an already connected client is a no-op.
    pub fn connect(&self) -> Result<()> {
        let mut state = self.state.write();
        if *state == ConnectionState::Connected {
            return Ok(());
        }

        let request = TransportRequest::new(Method::Get, "/");
        let response = self.transport.send(&request)?;
        if !response.is_success() {
            return Err(remote_error(response));
        }

        debug!("connected to search backend");
        *state = ConnectionState::Connected;
        Ok(())
    }

    /// Index a document into the named index.
    ///
    /// The document id must be non-empty; it becomes the primary key and
    /// goes into the request path while the fields travel as the body.
    /// A single attempt per call.
    pub fn index(&self, index: &str, doc: &Document) -> Result<IndexAck> {
        self.ensure_connected()?;
        if doc.id().is_empty() {
            return Err(YariError::invalid_document("document id must not be empty"));
        }

        let body = serde_json::to_vec(doc.fields())?;
        let request = TransportRequest::new(Method::Put, format!("/{}/_doc/{}", index, doc.id()))
            .with_body(body);
        debug!("indexing document {} into [{}]", doc.id(), index);

        let response = self.transport.send(&request)?;
        if !response.is_success() {
            return Err(remote_error(response));
        }
        serde_json::from_slice(&response.body)
            .map_err(|e| YariError::malformed_response(e.to_string()))
    }

    /// Fetch a document by id.
    ///
    /// Returns `Ok(None)` when the id is absent from the index.
    pub fn get(&self, index: &str, id: &str) -> Result<Option<Document>> {
        self.ensure_connected()?;

        let request = TransportRequest::new(Method::Get, format!("/{index}/_doc/{id}"));
        let response = self.transport.send(&request)?;
        if response.status == 404 {
            return Ok(None);
        }
        if !response.is_success() {
            return Err(remote_error(response));
        }

        let raw: RawGetResponse = serde_json::from_slice(&response.body)
            .map_err(|e| YariError::malformed_response(e.to_string()))?;
        if !raw.found {
            return Ok(None);
        }
        Ok(Some(Document::with_fields(raw.id, raw.source)))
    }

    /// Execute a search against the named index.
    ///
    /// Built queries are serialized together with the options into a
    /// `{size, query, aggs}` body; a [`Query::Raw`] payload is the
    /// complete body and is forwarded to the transport byte for byte. A
    /// deadline in the options is handed to the transport verbatim.
    pub fn search(
        &self,
        index: &str,
        query: &Query,
        options: &SearchOptions,
    ) -> Result<SearchResult> {
        self.ensure_connected()?;

        let body = request_body(query, options)?;
        debug!("searching [{}] with {}", index, query.description());
        trace!("search body: {}", String::from_utf8_lossy(&body));

        let mut request =
            TransportRequest::new(Method::Post, format!("/{index}/_search")).with_body(body);
        if let Some(deadline) = options.deadline {
            request = request.with_deadline(deadline);
        }

        let response = self.transport.send(&request)?;
        if !response.is_success() {
            return Err(remote_error(response));
        }
        SearchResult::from_json_bytes(&response.body)
    }

    fn ensure_connected(&self) -> Result<()> {
        if *self.state.read() == ConnectionState::Connected {
            Ok(())
        } else {
            Err(YariError::NotConnected)
        }
    }
}

fn remote_error(response: TransportResponse) -> YariError {
    YariError::RemoteQuery {
        status: response.status,
        body: String::from_utf8_lossy(&response.body).into_owned(),
    }
}

// Wire mirror of the fetch-by-id reply.
#[derive(Debug, Deserialize)]
struct RawGetResponse {
    #[serde(rename = "_id")]
    id: String,
    found: bool,
    #[serde(rename = "_source", default)]
    source: HashMap<String, FieldValue>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MemoryTransport, MemoryTransportConfig};

    fn connected_client() -> (Arc<MemoryTransport>, SearchClient) {
        let transport = Arc::new(MemoryTransport::default());
        let client = SearchClient::new(transport.clone());
        client.connect().unwrap();
        (transport, client)
    }

    #[test]
    fn test_starts_disconnected() {
        let client = SearchClient::new(Arc::new(MemoryTransport::default()));
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert!(!client.is_connected());
    }

    #[test]
    fn test_operations_require_connect() {
        let client = SearchClient::new(Arc::new(MemoryTransport::default()));
        let doc = Document::builder("abc").add_text("name", "Bag").build();

        let result = client.index("products", &doc);
        assert!(matches!(result, Err(YariError::NotConnected)));

        let result = client.get("products", "abc");
        assert!(matches!(result, Err(YariError::NotConnected)));

        let query = Query::term("name", "bag").unwrap();
        let result = client.search("products", &query, &SearchOptions::new());
        assert!(matches!(result, Err(YariError::NotConnected)));
    }

    #[test]
    fn test_connect_is_idempotent() {
        let (transport, client) = connected_client();
        client.connect().unwrap();
        client.connect().unwrap();

        // Only the first call performed the handshake round trip.
        assert_eq!(transport.requests().len(), 1);
        assert!(client.is_connected());
    }

    #[test]
    fn test_refused_connection_stays_disconnected() {
        let transport = Arc::new(MemoryTransport::new(MemoryTransportConfig {
            refuse_connections: true,
        }));
        let client = SearchClient::new(transport);

        let result = client.connect();
        assert!(matches!(
            result,
            Err(YariError::RemoteQuery { status: 503, .. })
        ));
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_concurrent_connect_runs_one_handshake() {
        let transport = Arc::new(MemoryTransport::default());
        let client = Arc::new(SearchClient::new(transport.clone()));

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let client = Arc::clone(&client);
                scope.spawn(move || client.connect().unwrap());
            }
        });

        assert_eq!(transport.requests().len(), 1);
        assert!(client.is_connected());
    }

    #[test]
    fn test_index_rejects_empty_id() {
        let (transport, client) = connected_client();
        let doc = Document::builder("").add_text("name", "Bag").build();

        let result = client.index("products", &doc);
        assert!(matches!(result, Err(YariError::InvalidDocument(_))));
        // Nothing was sent beyond the handshake.
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_index_and_get_round_trip() {
        let (_transport, client) = connected_client();
        let doc = Document::builder("abc")
            .add_text("name", "Bag")
            .add_integer("price", 42)
            .build();

        let ack = client.index("products", &doc).unwrap();
        assert_eq!(ack.id, "abc");
        assert_eq!(ack.result, "created");

        let fetched = client.get("products", "abc").unwrap().unwrap();
        assert_eq!(fetched.id(), "abc");
        assert_eq!(fetched.get_field("price"), Some(&FieldValue::Integer(42)));

        assert!(client.get("products", "missing").unwrap().is_none());
    }

    #[test]
    fn test_reindex_reports_updated() {
        let (_transport, client) = connected_client();
        let doc = Document::builder("abc").add_text("name", "Bag").build();

        client.index("products", &doc).unwrap();
        let ack = client.index("products", &doc).unwrap();
        assert_eq!(ack.result, "updated");
    }
}
