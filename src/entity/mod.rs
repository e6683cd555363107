//! Entity mapping: schema-driven property access, change tracking and row
//! translation.
//!
//! A concrete record type keeps its schema-owned state in a [`Record`] and
//! any instance-local bookkeeping in its own fields:
//!
//! ```
//! use dbmapper::{ColumnDef, Entity, Record, SchemaDefinition};
//!
//! struct User {
//!     record: Record,
//!     login_attempts: u32,
//! }
//!
//! impl Entity for User {
//!     fn schema_definition() -> SchemaDefinition {
//!         SchemaDefinition::new("users")
//!             .column(ColumnDef::int("userId"))
//!             .column(ColumnDef::string("displayName").max_length(64).required())
//!             .primary_key("userId")
//!     }
//!
//!     fn from_record(record: Record) -> Self {
//!         Self { record, login_attempts: 0 }
//!     }
//!
//!     fn record(&self) -> &Record {
//!         &self.record
//!     }
//!
//!     fn record_mut(&mut self) -> &mut Record {
//!         &mut self.record
//!     }
//! }
//!
//! dbmapper::entity_accessors!(User {
//!     user_id: i64,
//!     display_name: String,
//! });
//!
//! # fn main() -> dbmapper::Result<()> {
//! let mut user = User::new()?;
//! user.set_display_name("Ada")?;
//! assert_eq!(user.display_name()?, "Ada");
//! assert!(user.record().is_new()?);
//! # Ok(())
//! # }
//! ```

mod macros;
mod record;
mod snapshot;

use std::sync::Arc;

pub use record::Record;
pub use snapshot::RecordSnapshot;

use crate::core::{PrimaryValue, Result, Row, Value};
use crate::schema::{SchemaDefinition, SchemaRegistry, schema_for};

/// A record type mapped to one table.
///
/// Implementors declare their schema and hand out their [`Record`]; the
/// provided methods build instances and cover the cross-instance
/// operations.
pub trait Entity: Sized + 'static {
    /// Schema declaration, resolved once per type on first use.
    fn schema_definition() -> SchemaDefinition;

    /// Wraps a record, initializing any instance-local fields.
    fn from_record(record: Record) -> Self;

    fn record(&self) -> &Record;

    fn record_mut(&mut self) -> &mut Record;

    /// Resolved schema. Fails with [`DbError::InvalidSchema`](crate::DbError::InvalidSchema)
    /// when the declaration is broken.
    fn schema() -> Result<Arc<SchemaRegistry>> {
        schema_for::<Self>(Self::schema_definition)
    }

    /// Instance holding the declared defaults.
    fn new() -> Result<Self> {
        Ok(Self::from_record(Record::new(Self::schema()?)))
    }

    /// Instance for an existing row identified by its primary key.
    fn with_primary(value: impl Into<PrimaryValue>) -> Result<Self> {
        Ok(Self::from_record(Record::with_primary(Self::schema()?, value)?))
    }

    /// Instance loaded from a raw row keyed by column names.
    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self::from_record(Record::from_row(Self::schema()?, row)))
    }

    fn get(&self, name: &str) -> Result<&Value> {
        self.record().get(name)
    }

    fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.record_mut().set(name, value)
    }

    /// See [`Record::call`].
    fn call(&mut self, method: &str, args: &[Value]) -> Result<Option<Value>> {
        self.record_mut().call(method, args)
    }

    /// See [`Record::merge_from`].
    fn merge_with(&mut self, other: &Self) -> Result<()> {
        self.record_mut().merge_from(other.record())
    }

    /// JSON of the schema-owned state only.
    fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.record().snapshot())?)
    }

    /// Rebuilds an instance from [`Entity::to_json`] output. Instance-local
    /// fields come from [`Entity::from_record`].
    fn from_json(json: &str) -> Result<Self> {
        let snapshot: RecordSnapshot = serde_json::from_str(json)?;
        Ok(Self::from_record(Record::restore(Self::schema()?, &snapshot)?))
    }
}
