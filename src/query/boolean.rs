//! Fluent builder for boolean compound queries.

use crate::query::query::Query;

/// A builder that assembles a [`Query::Bool`] from individual clauses.
///
/// Clause order within each list is preserved in the rendered DSL.
///
/// ```
/// use yari::query::{BoolQueryBuilder, Query};
///
/// let query = BoolQueryBuilder::new()
///     .must(Query::matches("name", "bag").unwrap())
///     .should(Query::term("color", "red").unwrap())
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct BoolQueryBuilder {
    must: Vec<Query>,
    should: Vec<Query>,
    must_not: Vec<Query>,
}

impl BoolQueryBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        BoolQueryBuilder::default()
    }

    /// Add a MUST clause: required, contributes to the score.
    pub fn must(mut self, query: Query) -> Self {
        self.must.push(query);
        self
    }

    /// Add a SHOULD clause: contributes to the score, required only
    /// when no MUST clauses are present.
    pub fn should(mut self, query: Query) -> Self {
        self.should.push(query);
        self
    }

    /// Add a MUST_NOT clause: excludes matches, no score contribution.
    pub fn must_not(mut self, query: Query) -> Self {
        self.must_not.push(query);
        self
    }

    /// Build the boolean query.
    pub fn build(self) -> Query {
        Query::boolean(self.must, self.should, self.must_not)
    }
}
