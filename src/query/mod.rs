//! Query construction and wire-DSL rendering.

pub mod boolean;
#[allow(clippy::module_inception)]
pub mod query;
pub mod serializer;

pub use self::boolean::BoolQueryBuilder;
pub use self::query::Query;
