use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use lazy_static::lazy_static;
use tracing::debug;

use super::naming::{to_field_name, to_property_name};
use crate::core::{ColumnDef, DbError, PrimaryKey, Result, Row};

/// Schema as declared by a concrete record type.
#[derive(Debug, Clone, Default)]
pub struct SchemaDefinition {
    pub table_name: String,
    pub columns: Vec<ColumnDef>,
    pub primary_key: Option<PrimaryKey>,
}

impl SchemaDefinition {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
            primary_key: None,
        }
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn primary_key(mut self, key: impl Into<PrimaryKey>) -> Self {
        self.primary_key = Some(key.into());
        self
    }
}

/// Resolved, immutable lookup tables for one record type.
#[derive(Debug)]
pub struct SchemaRegistry {
    table_name: String,
    columns: Vec<ColumnDef>,
    field_names: Vec<String>,
    primary_key: PrimaryKey,
    primary_indices: Vec<usize>,
    by_property: HashMap<String, usize>,
    by_field: HashMap<String, usize>,
}

impl SchemaRegistry {
    /// Validates a declaration and builds its lookup tables.
    pub fn resolve(definition: SchemaDefinition) -> Result<Self> {
        let SchemaDefinition {
            table_name,
            columns,
            primary_key,
        } = definition;

        if table_name.trim().is_empty() {
            return Err(DbError::InvalidSchema("table name must not be empty".into()));
        }
        if columns.is_empty() {
            return Err(DbError::InvalidSchema(format!(
                "table '{}' declares no columns",
                table_name
            )));
        }
        let primary_key = primary_key.ok_or_else(|| {
            DbError::InvalidSchema(format!("table '{}' declares no primary key", table_name))
        })?;

        let mut by_property = HashMap::with_capacity(columns.len());
        let mut by_field = HashMap::with_capacity(columns.len());
        let mut field_names = Vec::with_capacity(columns.len());

        for (idx, column) in columns.iter().enumerate() {
            let field = to_field_name(&column.name);
            if to_property_name(&field) != column.name {
                return Err(DbError::InvalidSchema(format!(
                    "property '{}' does not map back from column '{}'",
                    column.name, field
                )));
            }
            if by_property.insert(column.name.clone(), idx).is_some() {
                return Err(DbError::InvalidSchema(format!(
                    "property '{}' is declared twice",
                    column.name
                )));
            }
            by_field.insert(field.clone(), idx);
            field_names.push(field);
        }

        let parts = primary_key.parts();
        if parts.is_empty() {
            return Err(DbError::InvalidSchema(format!(
                "table '{}' declares an empty primary key",
                table_name
            )));
        }
        let mut seen = HashSet::new();
        let mut primary_indices = Vec::with_capacity(parts.len());
        for part in parts {
            let idx = by_property.get(part).copied().ok_or_else(|| {
                DbError::InvalidSchema(format!("primary key part '{}' is not a declared column", part))
            })?;
            if !seen.insert(idx) {
                return Err(DbError::InvalidSchema(format!(
                    "primary key part '{}' is listed twice",
                    part
                )));
            }
            primary_indices.push(idx);
        }

        debug!(table = %table_name, columns = columns.len(), "resolved entity schema");

        Ok(Self {
            table_name,
            columns,
            field_names,
            primary_key,
            primary_indices,
            by_property,
            by_field,
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, property_name: &str) -> Result<&ColumnDef> {
        self.index_of(property_name)
            .map(|idx| &self.columns[idx])
            .ok_or_else(|| DbError::unknown_property(property_name))
    }

    pub fn has_property(&self, property_name: &str) -> bool {
        self.by_property.contains_key(property_name)
    }

    pub(crate) fn index_of(&self, property_name: &str) -> Option<usize> {
        self.by_property.get(property_name).copied()
    }

    pub(crate) fn index_of_field(&self, field_name: &str) -> Option<usize> {
        self.by_field.get(field_name).copied()
    }

    pub(crate) fn column_at(&self, idx: usize) -> &ColumnDef {
        &self.columns[idx]
    }

    pub fn primary_key(&self) -> &PrimaryKey {
        &self.primary_key
    }

    pub(crate) fn primary_indices(&self) -> &[usize] {
        &self.primary_indices
    }

    pub(crate) fn is_primary_index(&self, idx: usize) -> bool {
        self.primary_indices.contains(&idx)
    }

    pub fn field_name_for(&self, property_name: &str) -> Result<&str> {
        self.index_of(property_name)
            .map(|idx| self.field_names[idx].as_str())
            .ok_or_else(|| DbError::unknown_property(property_name))
    }

    pub fn property_name_for(&self, field_name: &str) -> Result<&str> {
        self.index_of_field(field_name)
            .map(|idx| self.columns[idx].name.as_str())
            .ok_or_else(|| {
                DbError::InvalidArgument(format!("'{}' is not a declared column", field_name))
            })
    }

    pub fn property_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.field_names.iter().map(String::as_str).collect()
    }

    /// Primary key expressed in column names.
    pub fn primary_field_key(&self) -> PrimaryKey {
        match &self.primary_key {
            PrimaryKey::Single(_) => PrimaryKey::Single(self.field_names[self.primary_indices[0]].clone()),
            PrimaryKey::Composite(_) => PrimaryKey::Composite(
                self.primary_indices
                    .iter()
                    .map(|&idx| self.field_names[idx].clone())
                    .collect(),
            ),
        }
    }

    pub fn max_length(&self, property_name: &str) -> Result<Option<usize>> {
        Ok(self.column(property_name)?.constraints.max_length)
    }

    pub fn is_required(&self, property_name: &str) -> Result<bool> {
        Ok(self.column(property_name)?.constraints.required)
    }

    pub fn is_non_empty(&self, property_name: &str) -> Result<bool> {
        Ok(self.column(property_name)?.constraints.non_empty)
    }

    /// Declared defaults keyed by property name, in declaration order.
    pub fn default_data(&self) -> Row {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.default.clone()))
            .collect()
    }

    /// `<alias>.<field>` for every column.
    pub fn prefixed_field_names(&self, alias: &str) -> Vec<String> {
        self.field_names
            .iter()
            .map(|field| format!("{}.{}", alias, field))
            .collect()
    }

    /// `<alias>.<field> AS <alias>_<field>` for every column.
    pub fn aliased_field_names(&self, alias: &str) -> Vec<String> {
        self.field_names
            .iter()
            .map(|field| format!("{alias}.{field} AS {alias}_{field}"))
            .collect()
    }

    /// Keeps the keys of `row` carrying the `<alias>_` prefix, with the
    /// prefix removed. Keys belonging to other aliases are dropped.
    pub fn strip_row_prefix(row: &Row, alias: &str) -> Row {
        let prefix = format!("{}_", alias);
        row.iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(prefix.as_str())
                    .map(|stripped| (stripped.to_string(), value.clone()))
            })
            .collect()
    }
}

lazy_static! {
    static ref SCHEMAS: RwLock<HashMap<TypeId, Arc<SchemaRegistry>>> = RwLock::new(HashMap::new());
}

/// Resolved schema of `T`, resolving `define` on first use.
///
/// Successful resolutions are cached for the process lifetime. A broken
/// declaration is reported on every call and never cached.
pub fn schema_for<T: 'static>(define: impl FnOnce() -> SchemaDefinition) -> Result<Arc<SchemaRegistry>> {
    let key = TypeId::of::<T>();
    if let Some(schema) = SCHEMAS.read()?.get(&key) {
        return Ok(Arc::clone(schema));
    }

    let resolved = Arc::new(SchemaRegistry::resolve(define())?);
    let mut schemas = SCHEMAS.write()?;
    Ok(Arc::clone(schemas.entry(key).or_insert(resolved)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;

    fn definition() -> SchemaDefinition {
        SchemaDefinition::new("someTable")
            .column(ColumnDef::int("someId"))
            .column(ColumnDef::string("someName").default("test").max_length(5).required())
            .column(ColumnDef::bool("someField"))
            .primary_key("someId")
    }

    #[test]
    fn test_resolve_builds_lookups() {
        let schema = SchemaRegistry::resolve(definition()).unwrap();
        assert_eq!(schema.table_name(), "someTable");
        assert_eq!(schema.field_name_for("someName").unwrap(), "some_name");
        assert_eq!(schema.property_name_for("some_field").unwrap(), "someField");
        assert_eq!(schema.primary_field_key(), PrimaryKey::from("some_id"));
        assert_eq!(schema.max_length("someName").unwrap(), Some(5));
        assert!(schema.is_required("someName").unwrap());
    }

    #[test]
    fn test_unknown_names_are_rejected() {
        let schema = SchemaRegistry::resolve(definition()).unwrap();
        assert!(matches!(schema.field_name_for("nope"), Err(DbError::InvalidArgument(_))));
        assert!(matches!(schema.property_name_for("nope"), Err(DbError::InvalidArgument(_))));
    }

    #[test]
    fn test_missing_parts_fail() {
        let no_table = SchemaDefinition::new("").column(ColumnDef::int("id")).primary_key("id");
        assert!(matches!(SchemaRegistry::resolve(no_table), Err(DbError::InvalidSchema(_))));

        let no_columns = SchemaDefinition::new("t").primary_key("id");
        assert!(matches!(SchemaRegistry::resolve(no_columns), Err(DbError::InvalidSchema(_))));

        let no_key = SchemaDefinition::new("t").column(ColumnDef::int("id"));
        assert!(matches!(SchemaRegistry::resolve(no_key), Err(DbError::InvalidSchema(_))));

        let bad_key = SchemaDefinition::new("t").column(ColumnDef::int("id")).primary_key("other");
        assert!(matches!(SchemaRegistry::resolve(bad_key), Err(DbError::InvalidSchema(_))));
    }

    #[test]
    fn test_non_reversible_property_name_fails() {
        let def = SchemaDefinition::new("t")
            .column(ColumnDef::int("some_id"))
            .primary_key("some_id");
        assert!(matches!(SchemaRegistry::resolve(def), Err(DbError::InvalidSchema(_))));
    }

    #[test]
    fn test_default_data_order() {
        let schema = SchemaRegistry::resolve(definition()).unwrap();
        let defaults = schema.default_data();
        assert_eq!(defaults.keys().collect::<Vec<_>>(), vec!["someId", "someName", "someField"]);
        assert_eq!(defaults.get("someName"), Some(&Value::from("test")));
    }

    #[test]
    fn test_schema_for_caches_per_type() {
        struct Marker;
        let first = schema_for::<Marker>(definition).unwrap();
        let second = schema_for::<Marker>(|| unreachable!("schema must come from the cache")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
