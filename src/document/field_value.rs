//! Field value types for documents.
//!
//! This module defines the [`FieldValue`] enum which represents all
//! possible types of values that can be stored in document fields.
//!
//! # Serialization
//!
//! Values serialize untagged, so documents render as plain JSON objects
//! (`{"name":"Bag","price":42}`) on the wire. On decode, JSON numbers
//! become `Integer` or `Float`, RFC 3339 strings become `DateTime`, and
//! any other string becomes `Text`.
//!
//! ```
//! use yari::document::field_value::FieldValue;
//!
//! let value = FieldValue::Integer(42);
//! assert_eq!(serde_json::to_string(&value).unwrap(), "42");
//!
//! let decoded: FieldValue = serde_json::from_str("\"Bag\"").unwrap();
//! assert_eq!(decoded, FieldValue::Text("Bag".to_string()));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents a value for a field in a document.
///
/// Variant order matters for untagged deserialization: numbers are tried
/// as integers before floats, and strings as datetimes before plain text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Null value
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// DateTime value (RFC 3339 on the wire)
    DateTime(DateTime<Utc>),
    /// Text value
    Text(String),
}

impl FieldValue {
    /// Get the value as text, if it is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Get the value as a float, converting integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(value) => Some(*value as f64),
            FieldValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Get the value as a boolean, if it is a boolean value.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// Check if the value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::DateTime(value)
    }
}
