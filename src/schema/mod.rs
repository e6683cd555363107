//! Per-type schema declaration and its resolved lookup tables.

pub mod naming;
pub mod registry;

pub use naming::{quote_identifier, to_field_name, to_property_name};
pub use registry::{SchemaDefinition, SchemaRegistry, schema_for};
