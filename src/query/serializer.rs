//! Rendering query trees to the backend's JSON DSL.

use serde_json::{Map, Value, json};

use crate::error::Result;
use crate::query::query::Query;

/// Render a query to the wire DSL as bytes.
///
/// A `Raw` tree root bypasses rendering entirely: its payload becomes
/// the wire body byte for byte and is never parsed locally, so a
/// malformed hand-written body surfaces as a remote error rather than a
/// local one.
pub fn serialize(query: &Query) -> Result<Vec<u8>> {
    match query {
        Query::Raw { body } => Ok(body.clone()),
        _ => Ok(serde_json::to_vec(&to_value(query)?)?),
    }
}

/// Render a query node to a JSON value.
///
/// Each variant maps to a fixed top-level key: `term`, `match`, `range`,
/// or `bool`. A `Raw` node nested inside a bool clause is parsed and
/// spliced into the tree, which preserves its content but not its exact
/// byte layout.
pub fn to_value(query: &Query) -> Result<Value> {
    match query {
        Query::Term { field, value } => {
            let scalar = serde_json::to_value(value)?;
            Ok(wrap("term", field, json!({ "value": scalar })))
        }
        Query::Match { field, text } => Ok(wrap("match", field, json!({ "query": text }))),
        Query::Range { field, gte, lte } => {
            let mut bounds = Map::new();
            if let Some(gte) = gte {
                bounds.insert("gte".to_string(), serde_json::to_value(gte)?);
            }
            if let Some(lte) = lte {
                bounds.insert("lte".to_string(), serde_json::to_value(lte)?);
            }
            Ok(wrap("range", field, Value::Object(bounds)))
        }
        Query::Bool {
            must,
            should,
            must_not,
        } => {
            let mut node = Map::new();
            for (key, clauses) in [("must", must), ("should", should), ("must_not", must_not)] {
                if clauses.is_empty() {
                    continue;
                }
                let rendered = clauses.iter().map(to_value).collect::<Result<Vec<_>>>()?;
                node.insert(key.to_string(), Value::Array(rendered));
            }
            Ok(json!({ "bool": node }))
        }
        Query::Raw { body } => Ok(serde_json::from_slice(body)?),
    }
}

fn wrap(kind: &str, field: &str, inner: Value) -> Value {
    let mut body = Map::new();
    body.insert(field.to_string(), inner);
    let mut node = Map::new();
    node.insert(kind.to_string(), Value::Object(body));
    Value::Object(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FieldValue;
    use crate::query::BoolQueryBuilder;

    #[test]
    fn test_term_wire_shape() {
        let query = Query::term("name", "bag").unwrap();
        let value = to_value(&query).unwrap();
        assert_eq!(value, json!({"term": {"name": {"value": "bag"}}}));
    }

    #[test]
    fn test_match_wire_shape() {
        let query = Query::matches("name", "bag").unwrap();
        let value = to_value(&query).unwrap();
        assert_eq!(value, json!({"match": {"name": {"query": "bag"}}}));
    }

    #[test]
    fn test_range_omits_absent_bounds() {
        let query = Query::range("price", Some(FieldValue::Integer(10)), None).unwrap();
        let value = to_value(&query).unwrap();
        assert_eq!(value, json!({"range": {"price": {"gte": 10}}}));
    }

    #[test]
    fn test_bool_compound_wire_shape() {
        let query = BoolQueryBuilder::new()
            .must(Query::matches("name", "bag").unwrap())
            .should(Query::range("price", Some(FieldValue::Integer(10)), None).unwrap())
            .build();
        let value = to_value(&query).unwrap();
        assert_eq!(
            value,
            json!({
                "bool": {
                    "must": [{"match": {"name": {"query": "bag"}}}],
                    "should": [{"range": {"price": {"gte": 10}}}],
                }
            })
        );
    }

    #[test]
    fn test_empty_bool_matches_all() {
        let query = Query::boolean(vec![], vec![], vec![]);
        let value = to_value(&query).unwrap();
        assert_eq!(value, json!({"bool": {}}));
    }

    #[test]
    fn test_raw_root_is_verbatim() {
        // Deliberately odd spacing and even invalid JSON must pass
        // through untouched.
        let body = b" {\"query\" :{ \"term\": {} }, ".to_vec();
        let query = Query::raw(body.clone());
        assert_eq!(serialize(&query).unwrap(), body);
    }

    #[test]
    fn test_nested_raw_is_spliced() {
        let raw = Query::raw(b"{\"term\": {\"color\": {\"value\": \"red\"}}}".to_vec());
        let query = Query::boolean(vec![raw], vec![], vec![]);
        let value = to_value(&query).unwrap();
        assert_eq!(
            value,
            json!({"bool": {"must": [{"term": {"color": {"value": "red"}}}]}})
        );
    }
}
