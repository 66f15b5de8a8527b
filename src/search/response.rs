//! Typed search responses decoded from raw backend replies.

use std::collections::HashMap;

use serde::Deserialize;

use crate::document::{Document, FieldValue};
use crate::error::{Result, YariError};

/// Whether a reported total hit count is exact or a lower bound.
///
/// Backends may cap exact counting for performance; callers must be able
/// to tell a capped count from a true one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum TotalHitsRelation {
    /// The count is exact.
    #[serde(rename = "eq")]
    Eq,
    /// The count is a lower bound.
    #[serde(rename = "gte")]
    GreaterThanOrEqual,
}

/// Total hit count with its relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TotalHits {
    /// The reported count.
    pub value: u64,
    /// Whether the count is exact or a lower bound.
    pub relation: TotalHitsRelation,
}

impl TotalHits {
    /// True only when the backend reported an exact count.
    pub fn exact(&self) -> bool {
        self.relation == TotalHitsRelation::Eq
    }
}

/// One matched document plus its relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// The matched document, rebuilt from the reply's id and source.
    pub document: Document,
    /// The backend-computed relevance score; higher is more relevant.
    /// A reply without a score (e.g. unscored contexts) decodes as 0.0.
    pub score: f64,
}

/// One group in a histogram aggregation's output.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistogramBucket {
    /// Lower edge of the bucket's value range.
    pub key: f64,
    /// Number of documents in the bucket.
    pub doc_count: u64,
}

/// An aggregation decoded from the reply.
///
/// Buckets are exposed as an ordered sequence, not a keyed mapping:
/// bucket order is semantically meaningful (histogram buckets arrive in
/// ascending key order) and the first qualifying bucket must stay
/// addressable by position.
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregation {
    /// Fixed-interval histogram buckets, in backend order.
    Histogram {
        /// The buckets, in the order the backend supplied them.
        buckets: Vec<HistogramBucket>,
    },
}

impl Aggregation {
    /// Get the buckets of this aggregation, in backend order.
    pub fn buckets(&self) -> &[HistogramBucket] {
        match self {
            Aggregation::Histogram { buckets } => buckets,
        }
    }
}

/// A decoded search reply.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// The hits, in backend order (already score-sorted; never re-sorted
    /// locally).
    pub hits: Vec<Hit>,
    /// Total matching documents with its exactness relation.
    pub total: TotalHits,
    /// Named aggregations, empty when none were requested.
    pub aggregations: HashMap<String, Aggregation>,
}

impl SearchResult {
    /// Decode a raw JSON reply.
    ///
    /// Fails with [`YariError::MalformedResponse`] when `hits` or
    /// `hits.total` are absent or of the wrong shape, or the total
    /// relation is neither `eq` nor `gte`.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<SearchResult> {
        let raw: RawSearchResponse = serde_json::from_slice(bytes)
            .map_err(|e| YariError::malformed_response(e.to_string()))?;

        let hits = raw
            .hits
            .hits
            .into_iter()
            .map(|hit| Hit {
                document: Document::with_fields(hit.id, hit.source),
                score: hit.score.unwrap_or(0.0),
            })
            .collect();

        let aggregations = raw
            .aggregations
            .into_iter()
            .map(|(name, agg)| {
                (
                    name,
                    Aggregation::Histogram {
                        buckets: agg.buckets,
                    },
                )
            })
            .collect();

        Ok(SearchResult {
            hits,
            total: raw.hits.total,
            aggregations,
        })
    }

    /// Look up an aggregation by name.
    pub fn aggregation(&self, name: &str) -> Option<&Aggregation> {
        self.aggregations.get(name)
    }
}

// Wire mirror of the backend search reply; only the fields the decoder
// needs, everything else is ignored.
#[derive(Debug, Deserialize)]
struct RawSearchResponse {
    hits: RawHits,
    #[serde(default)]
    aggregations: HashMap<String, RawAggregation>,
}

#[derive(Debug, Deserialize)]
struct RawHits {
    total: TotalHits,
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score")]
    score: Option<f64>,
    #[serde(rename = "_source", default)]
    source: HashMap<String, FieldValue>,
}

#[derive(Debug, Deserialize)]
struct RawAggregation {
    buckets: Vec<HistogramBucket>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_hits() {
        let body = br#"{
            "took": 3,
            "hits": {
                "total": {"value": 2, "relation": "eq"},
                "max_score": 1.2,
                "hits": [
                    {"_id": "abc", "_score": 1.2, "_source": {"name": "Bag", "price": 42}},
                    {"_id": "efg", "_score": 0.8, "_source": {"name": "Bag", "price": 42}}
                ]
            }
        }"#;

        let result = SearchResult::from_json_bytes(body).unwrap();
        assert_eq!(result.total.value, 2);
        assert!(result.total.exact());
        assert_eq!(result.hits.len(), 2);
        assert_eq!(result.hits[0].document.id(), "abc");
        assert_eq!(result.hits[0].score, 1.2);
        assert_eq!(
            result.hits[0].document.get_field("price"),
            Some(&FieldValue::Integer(42))
        );
        // Backend order is preserved, never re-sorted.
        assert_eq!(result.hits[1].document.id(), "efg");
    }

    #[test]
    fn test_lower_bound_total_is_never_exact() {
        let body = br#"{
            "hits": {"total": {"value": 10000, "relation": "gte"}, "hits": []}
        }"#;

        let result = SearchResult::from_json_bytes(body).unwrap();
        assert!(!result.total.exact());
        assert_eq!(result.total.value, 10000);
    }

    #[test]
    fn test_unknown_relation_is_malformed() {
        let body = br#"{
            "hits": {"total": {"value": 1, "relation": "lte"}, "hits": []}
        }"#;

        let result = SearchResult::from_json_bytes(body);
        assert!(matches!(result, Err(YariError::MalformedResponse(_))));
    }

    #[test]
    fn test_missing_hits_is_malformed() {
        let result = SearchResult::from_json_bytes(br#"{"took": 3}"#);
        assert!(matches!(result, Err(YariError::MalformedResponse(_))));

        let result = SearchResult::from_json_bytes(br#"{"hits": {"hits": []}}"#);
        assert!(matches!(result, Err(YariError::MalformedResponse(_))));
    }

    #[test]
    fn test_aggregations_with_empty_hits() {
        // The shape a size=0 aggregations-only search comes back in.
        let body = br#"{
            "hits": {"total": {"value": 2, "relation": "eq"}, "hits": []},
            "aggregations": {
                "price-histo": {
                    "buckets": [
                        {"key": 40.0, "doc_count": 2},
                        {"key": 60.0, "doc_count": 1}
                    ]
                }
            }
        }"#;

        let result = SearchResult::from_json_bytes(body).unwrap();
        assert!(result.hits.is_empty());
        assert_eq!(result.total.value, 2);

        let buckets = result.aggregation("price-histo").unwrap().buckets();
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].key, 40.0);
        assert_eq!(buckets[0].doc_count, 2);
    }

    #[test]
    fn test_bucket_order_is_preserved() {
        // Input order is kept verbatim even when it is not ascending.
        let body = br#"{
            "hits": {"total": {"value": 3, "relation": "eq"}, "hits": []},
            "aggregations": {
                "histo": {
                    "buckets": [
                        {"key": 60.0, "doc_count": 1},
                        {"key": 20.0, "doc_count": 2},
                        {"key": 40.0, "doc_count": 3}
                    ]
                }
            }
        }"#;

        let result = SearchResult::from_json_bytes(body).unwrap();
        let keys: Vec<f64> = result
            .aggregation("histo")
            .unwrap()
            .buckets()
            .iter()
            .map(|b| b.key)
            .collect();
        assert_eq!(keys, vec![60.0, 20.0, 40.0]);
    }

    #[test]
    fn test_null_score_decodes_as_zero() {
        let body = br#"{
            "hits": {
                "total": {"value": 1, "relation": "eq"},
                "hits": [{"_id": "abc", "_score": null, "_source": {}}]
            }
        }"#;

        let result = SearchResult::from_json_bytes(body).unwrap();
        assert_eq!(result.hits[0].score, 0.0);
    }
}
