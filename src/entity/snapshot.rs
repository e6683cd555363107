use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Record;
use crate::core::{DbError, Result, Row};
use crate::schema::SchemaRegistry;

/// Serialized form of a [`Record`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSnapshot {
    pub table: String,
    pub values: Row,
    #[serde(default)]
    pub modified: Vec<String>,
    #[serde(default)]
    pub force_insert_on_save: bool,
    #[serde(default)]
    pub delete_on_save: bool,
    #[serde(default)]
    pub deleted: bool,
}

impl Record {
    pub fn snapshot(&self) -> RecordSnapshot {
        RecordSnapshot {
            table: self.table_name().to_string(),
            values: self.data(),
            modified: self.modified_properties().into_iter().map(str::to_string).collect(),
            force_insert_on_save: self.force_insert_on_save,
            delete_on_save: self.delete_on_save,
            deleted: self.deleted,
        }
    }

    /// Rebuilds a record from a snapshot taken against the same schema.
    ///
    /// Values go through the usual coercion. Properties absent from the
    /// snapshot keep their defaults.
    pub fn restore(schema: Arc<SchemaRegistry>, snapshot: &RecordSnapshot) -> Result<Self> {
        if snapshot.table != schema.table_name() {
            return Err(DbError::Serialization(format!(
                "snapshot of table '{}' cannot restore a '{}' record",
                snapshot.table,
                schema.table_name()
            )));
        }

        let mut record = Record::new(schema);
        for (name, value) in snapshot.values.iter() {
            record.set_with(name, value.clone(), false)?;
        }
        for name in &snapshot.modified {
            let idx = record
                .schema
                .index_of(name)
                .ok_or_else(|| DbError::unknown_property(name))?;
            if !record.modified.contains(&idx) {
                record.modified.push(idx);
            }
        }
        record.force_insert_on_save = snapshot.force_insert_on_save;
        record.delete_on_save = snapshot.delete_on_save;
        record.deleted = snapshot.deleted;
        Ok(record)
    }
}
