// ============================================================================
// dbmapper Library
// ============================================================================

pub mod connection;
pub mod core;
pub mod entity;
pub mod executor;
pub mod schema;
pub mod validation;

// Re-export main types for convenience
pub use self::core::{
    ColumnDef, ColumnType, Constraints, DbError, DriverError, FromValue, PrimaryKey, PrimaryValue,
    Result, Row, Value,
};
pub use entity::{Entity, Record, RecordSnapshot};
pub use schema::{SchemaDefinition, SchemaRegistry};
pub use validation::{DefaultTranslator, DefaultValidator, Rule, Translator, ValidationErrors, Validator};

// Re-export connection API
pub use connection::{ConnectionConfig, Driver};
#[cfg(feature = "sqlite")]
pub use connection::SqliteDriver;
pub use executor::Executor;

#[doc(hidden)]
pub use paste;
