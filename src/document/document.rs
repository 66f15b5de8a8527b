//! Document structure for indexing and fetch-by-id.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::document::field_value::FieldValue;

/// A document represents a single item to be indexed.
///
/// Documents are an id plus a collection of field values. The id is the
/// primary key for indexing and fetch-by-id; the client rejects index
/// calls for documents with an empty id. Only the field values travel in
/// the request body, the id goes into the request path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The primary key of this document.
    id: String,
    /// The field values for this document.
    fields: HashMap<String, FieldValue>,
}

impl Document {
    /// Create a new empty document with the given id.
    pub fn new<S: Into<String>>(id: S) -> Self {
        Document {
            id: id.into(),
            fields: HashMap::new(),
        }
    }

    /// Create a document from an id and an existing field map.
    pub fn with_fields<S: Into<String>>(id: S, fields: HashMap<String, FieldValue>) -> Self {
        Document {
            id: id.into(),
            fields,
        }
    }

    /// Get the document id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Add a field value to the document.
    pub fn add_field<S: Into<String>>(&mut self, name: S, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    /// Get a field value from the document.
    pub fn get_field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Check if the document has a field.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Remove a field from the document.
    pub fn remove_field(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    /// Get all field names.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(|s| s.as_str()).collect()
    }

    /// Get all field values.
    pub fn fields(&self) -> &HashMap<String, FieldValue> {
        &self.fields
    }

    /// Get the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the document has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Create a builder for constructing documents.
    pub fn builder<S: Into<String>>(id: S) -> DocumentBuilder {
        DocumentBuilder::new(id)
    }
}

/// A builder for constructing documents in a fluent manner.
#[derive(Debug)]
pub struct DocumentBuilder {
    document: Document,
}

impl DocumentBuilder {
    /// Create a new document builder for the given id.
    pub fn new<S: Into<String>>(id: S) -> Self {
        DocumentBuilder {
            document: Document::new(id),
        }
    }

    /// Add a text field to the document.
    pub fn add_text<S: Into<String>, T: Into<String>>(mut self, name: S, value: T) -> Self {
        self.document
            .add_field(name, FieldValue::Text(value.into()));
        self
    }

    /// Add an integer field to the document.
    pub fn add_integer<S: Into<String>>(mut self, name: S, value: i64) -> Self {
        self.document.add_field(name, FieldValue::Integer(value));
        self
    }

    /// Add a float field to the document.
    pub fn add_float<S: Into<String>>(mut self, name: S, value: f64) -> Self {
        self.document.add_field(name, FieldValue::Float(value));
        self
    }

    /// Add a boolean field to the document.
    pub fn add_boolean<S: Into<String>>(mut self, name: S, value: bool) -> Self {
        self.document.add_field(name, FieldValue::Boolean(value));
        self
    }

    /// Add a datetime field to the document.
    pub fn add_datetime<S: Into<String>>(
        mut self,
        name: S,
        value: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        self.document.add_field(name, FieldValue::DateTime(value));
        self
    }

    /// Add a field with a generic value.
    ///
    /// This is a low-level method that accepts any `FieldValue` directly.
    /// For most cases, prefer the type-safe methods like `add_text`,
    /// `add_integer`, `add_float`, etc.
    pub fn add_field<S: Into<String>>(mut self, name: S, value: FieldValue) -> Self {
        self.document.add_field(name, value);
        self
    }

    /// Build the final document.
    pub fn build(self) -> Document {
        self.document
    }
}
