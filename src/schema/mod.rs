pub mod field;
mod flatten;
pub mod resolver;

pub use field::*;
pub use resolver::{SchemaResolver, schema_entity, schema_format, schema_type};
