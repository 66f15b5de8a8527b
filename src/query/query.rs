//! Core query tree and constructors.

use crate::document::FieldValue;
use crate::error::{Result, YariError};

/// A typed search query.
///
/// Queries form an immutable tree; each node is exactly one variant and
/// maps one-to-one onto the backend's JSON DSL. Values are constructed
/// once by the caller, rendered by the serializer, and discarded.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Exact term match against a single field.
    Term {
        /// The field to search in.
        field: String,
        /// The term to match exactly.
        value: FieldValue,
    },
    /// Full-text match against a single field.
    Match {
        /// The field to search in.
        field: String,
        /// The text to match.
        text: String,
    },
    /// Range constraint with at least one inclusive bound.
    Range {
        /// The field to search in.
        field: String,
        /// Inclusive lower bound.
        gte: Option<FieldValue>,
        /// Inclusive upper bound.
        lte: Option<FieldValue>,
    },
    /// Boolean combination of sub-queries.
    ///
    /// `must` clauses are required and scored, `should` clauses are
    /// scored and required only when `must` is empty, and `must_not`
    /// clauses exclude without contributing to the score.
    Bool {
        /// Clauses that must all match.
        must: Vec<Query>,
        /// Clauses of which at least one must match when `must` is empty.
        should: Vec<Query>,
        /// Clauses that exclude matching documents.
        must_not: Vec<Query>,
    },
    /// A hand-written DSL body, forwarded verbatim.
    Raw {
        /// The raw JSON payload. Never validated locally; a bad body
        /// surfaces as a remote error from the backend.
        body: Vec<u8>,
    },
}

impl Query {
    /// Create a term query for exact matching.
    pub fn term<F, V>(field: F, value: V) -> Result<Query>
    where
        F: Into<String>,
        V: Into<FieldValue>,
    {
        let field = field.into();
        if field.is_empty() {
            return Err(YariError::invalid_query("term query requires a field name"));
        }
        Ok(Query::Term {
            field,
            value: value.into(),
        })
    }

    /// Create a full-text match query.
    pub fn matches<F, T>(field: F, text: T) -> Result<Query>
    where
        F: Into<String>,
        T: Into<String>,
    {
        let field = field.into();
        if field.is_empty() {
            return Err(YariError::invalid_query("match query requires a field name"));
        }
        Ok(Query::Match {
            field,
            text: text.into(),
        })
    }

    /// Create a range query with inclusive bounds.
    ///
    /// At least one bound must be present; a range with neither bound
    /// constrains nothing and is rejected.
    pub fn range<F>(field: F, gte: Option<FieldValue>, lte: Option<FieldValue>) -> Result<Query>
    where
        F: Into<String>,
    {
        let field = field.into();
        if field.is_empty() {
            return Err(YariError::invalid_query("range query requires a field name"));
        }
        if gte.is_none() && lte.is_none() {
            return Err(YariError::invalid_query(
                "range query requires at least one bound",
            ));
        }
        Ok(Query::Range { field, gte, lte })
    }

    /// Create a boolean compound query.
    ///
    /// Zero clauses in every list is valid and matches all documents.
    pub fn boolean(must: Vec<Query>, should: Vec<Query>, must_not: Vec<Query>) -> Query {
        Query::Bool {
            must,
            should,
            must_not,
        }
    }

    /// Create a raw query from a hand-written DSL body.
    ///
    /// The payload is the complete request body and bypasses both the
    /// builder and the serializer.
    pub fn raw<B: Into<Vec<u8>>>(body: B) -> Query {
        Query::Raw { body: body.into() }
    }

    /// Check whether this is a raw pass-through body.
    pub fn is_raw(&self) -> bool {
        matches!(self, Query::Raw { .. })
    }

    /// Get a human-readable description of this query.
    pub fn description(&self) -> String {
        match self {
            Query::Term { field, value } => format!("term({field}:{value:?})"),
            Query::Match { field, text } => format!("match({field}:{text})"),
            Query::Range { field, gte, lte } => {
                format!("range({field}:{gte:?}..{lte:?})")
            }
            Query::Bool {
                must,
                should,
                must_not,
            } => format!(
                "bool(must:{}, should:{}, must_not:{})",
                must.len(),
                should.len(),
                must_not.len()
            ),
            Query::Raw { body } => format!("raw({} bytes)", body.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_query_creation() {
        let query = Query::term("name", "bag").unwrap();
        assert_eq!(
            query,
            Query::Term {
                field: "name".to_string(),
                value: FieldValue::Text("bag".to_string()),
            }
        );
    }

    #[test]
    fn test_term_query_requires_field() {
        let result = Query::term("", "bag");
        assert!(matches!(result, Err(YariError::InvalidQuery(_))));
    }

    #[test]
    fn test_match_query_requires_field() {
        let result = Query::matches("", "bag");
        assert!(matches!(result, Err(YariError::InvalidQuery(_))));
    }

    #[test]
    fn test_range_query_requires_a_bound() {
        let result = Query::range("price", None, None);
        assert!(matches!(result, Err(YariError::InvalidQuery(_))));

        let query = Query::range("price", Some(FieldValue::Integer(10)), None).unwrap();
        assert_eq!(query.description(), "range(price:Some(Integer(10))..None)");
    }

    #[test]
    fn test_empty_boolean_is_valid() {
        let query = Query::boolean(vec![], vec![], vec![]);
        assert_eq!(query.description(), "bool(must:0, should:0, must_not:0)");
    }

    #[test]
    fn test_raw_query() {
        let query = Query::raw(b"{\"size\": 0}".to_vec());
        assert!(query.is_raw());
        assert_eq!(query.description(), "raw(11 bytes)");
    }
}
