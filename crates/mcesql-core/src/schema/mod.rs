//! Schema metadata module

mod catalog;

pub use catalog::{unquote, QualifiedName, SchemaCatalog, SchemaField, SchemaTable};
