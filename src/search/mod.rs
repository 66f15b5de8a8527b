//! Search request options, body assembly, and response decoding.

pub mod response;

pub use self::response::{
    Aggregation, HistogramBucket, Hit, SearchResult, TotalHits, TotalHitsRelation,
};

use std::time::Duration;

use serde_json::{Map, Value, json};

use crate::error::{Result, YariError};
use crate::query::Query;
use crate::query::serializer;

/// Specification for one named aggregation in a search request.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationSpec {
    /// Fixed-interval histogram over a numeric field.
    Histogram {
        /// The field to bucket.
        field: String,
        /// Bucket width; bucket keys are multiples of this interval.
        interval: f64,
    },
}

impl AggregationSpec {
    /// Create a histogram aggregation spec.
    pub fn histogram<F: Into<String>>(field: F, interval: f64) -> Self {
        AggregationSpec::Histogram {
            field: field.into(),
            interval,
        }
    }

    /// Render this spec to its wire shape.
    pub fn to_value(&self) -> Value {
        match self {
            AggregationSpec::Histogram { field, interval } => {
                json!({"histogram": {"field": field, "interval": interval}})
            }
        }
    }
}

/// Options for a search call.
///
/// `size(0)` is valid and asks for aggregations only: the backend
/// returns no hit documents while `total` and `aggregations` stay
/// populated. A deadline, when set, is handed to the transport verbatim;
/// the client never reinterprets it.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Maximum number of hit documents to return; `None` leaves the
    /// backend default in place.
    pub size: Option<u64>,
    /// Named aggregations to request, in insertion order.
    pub aggregations: Vec<(String, AggregationSpec)>,
    /// Caller-supplied deadline, propagated to the transport untouched.
    pub deadline: Option<Duration>,
}

impl SearchOptions {
    /// Create empty options: backend-default size, no aggregations.
    pub fn new() -> Self {
        SearchOptions::default()
    }

    /// Set the maximum number of hit documents to return.
    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Request a named aggregation.
    pub fn aggregation<S: Into<String>>(mut self, name: S, spec: AggregationSpec) -> Self {
        self.aggregations.push((name.into(), spec));
        self
    }

    /// Set a deadline to pass through to the transport.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Check whether these options contribute nothing to the request
    /// body. The deadline does not count: it never appears on the wire.
    pub fn is_empty(&self) -> bool {
        self.size.is_none() && self.aggregations.is_empty()
    }
}

/// Assemble the JSON body for a search request.
///
/// A `Raw` query is itself the complete request body and is forwarded
/// verbatim; combining it with body options is ambiguous and rejected,
/// since a hand-written body carries its own `size` and `aggs`.
pub fn request_body(query: &Query, options: &SearchOptions) -> Result<Vec<u8>> {
    if let Query::Raw { body } = query {
        if !options.is_empty() {
            return Err(YariError::invalid_query(
                "raw query bodies carry their own size and aggregations",
            ));
        }
        return Ok(body.clone());
    }

    let mut body = Map::new();
    if let Some(size) = options.size {
        body.insert("size".to_string(), size.into());
    }
    body.insert("query".to_string(), serializer::to_value(query)?);
    if !options.aggregations.is_empty() {
        let mut aggs = Map::new();
        for (name, spec) in &options.aggregations {
            aggs.insert(name.clone(), spec.to_value());
        }
        body.insert("aggs".to_string(), Value::Object(aggs));
    }
    Ok(serde_json::to_vec(&Value::Object(body))?)
}
