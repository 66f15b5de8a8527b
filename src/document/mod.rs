//! Document model: identified records with typed field values.

pub mod document;
pub mod field_value;

pub use self::document::{Document, DocumentBuilder};
pub use self::field_value::FieldValue;
