use std::sync::Arc;

use crate::core::{DbError, PrimaryKey, PrimaryValue, Result, Row, Value};
use crate::schema::{SchemaRegistry, quote_identifier};
use crate::validation::{DefaultTranslator, DefaultValidator, Translator, ValidationErrors, Validator};

/// Schema-owned state of one entity instance.
///
/// Holds exactly one value per declared column plus the modified-set and the
/// persistence-intent flags. This is the only part of an entity that is ever
/// serialized.
#[derive(Debug, Clone)]
pub struct Record {
    pub(super) schema: Arc<SchemaRegistry>,
    pub(super) values: Vec<Value>,
    /// Column indices in order of first modification.
    pub(super) modified: Vec<usize>,
    pub(super) force_insert_on_save: bool,
    pub(super) delete_on_save: bool,
    pub(super) deleted: bool,
}

impl Record {
    /// Record holding the declared defaults.
    pub fn new(schema: Arc<SchemaRegistry>) -> Self {
        let values = schema.columns().iter().map(|c| c.default.clone()).collect();
        Self {
            schema,
            values,
            modified: Vec::new(),
            force_insert_on_save: false,
            delete_on_save: false,
            deleted: false,
        }
    }

    /// Record identifying an existing row. The key is not marked modified.
    pub fn with_primary(schema: Arc<SchemaRegistry>, value: impl Into<PrimaryValue>) -> Result<Self> {
        let mut record = Self::new(schema);
        record.assign_primary(value.into(), false)?;
        Ok(record)
    }

    /// Record loaded from a raw row keyed by column names.
    pub fn from_row(schema: Arc<SchemaRegistry>, row: &Row) -> Self {
        let mut record = Self::new(schema);
        record.load_from_row(row);
        record
    }

    pub fn schema(&self) -> &Arc<SchemaRegistry> {
        &self.schema
    }

    pub fn table_name(&self) -> &str {
        self.schema.table_name()
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.schema
            .index_of(name)
            .ok_or_else(|| DbError::unknown_property(name))
    }

    pub fn get(&self, name: &str) -> Result<&Value> {
        let idx = self.index_of(name)?;
        Ok(&self.values[idx])
    }

    /// Sets a property and marks it modified.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.set_with(name, value, true)
    }

    /// Sets a property, marking it modified only when `track` is true.
    pub fn set_with(&mut self, name: &str, value: impl Into<Value>, track: bool) -> Result<()> {
        let idx = self.index_of(name)?;
        self.set_at(idx, &value.into(), track);
        Ok(())
    }

    fn set_at(&mut self, idx: usize, value: &Value, track: bool) {
        self.values[idx] = self.schema.column_at(idx).coerce(value);
        if track && !self.modified.contains(&idx) {
            self.modified.push(idx);
        }
    }

    // ------------------------------------------------------------------
    // Primary key
    // ------------------------------------------------------------------

    pub fn primary_value(&self) -> PrimaryValue {
        let indices = self.schema.primary_indices();
        match self.schema.primary_key() {
            PrimaryKey::Single(_) => PrimaryValue::Single(self.values[indices[0]].clone()),
            PrimaryKey::Composite(_) => {
                PrimaryValue::Composite(indices.iter().map(|&idx| self.values[idx].clone()).collect())
            }
        }
    }

    pub fn set_primary_value(&mut self, value: impl Into<PrimaryValue>) -> Result<()> {
        self.assign_primary(value.into(), true)
    }

    fn assign_primary(&mut self, value: PrimaryValue, track: bool) -> Result<()> {
        let indices = self.schema.primary_indices().to_vec();
        let composite = self.schema.primary_key().is_composite();
        match value {
            PrimaryValue::Composite(values) if composite => {
                if values.len() != indices.len() {
                    return Err(DbError::InvalidArgument(format!(
                        "primary key has {} parts, got {} values",
                        indices.len(),
                        values.len()
                    )));
                }
                for (idx, value) in indices.into_iter().zip(values.iter()) {
                    self.set_at(idx, value, track);
                }
                Ok(())
            }
            PrimaryValue::Single(_) if composite => Err(DbError::InvalidArgument(format!(
                "composite primary key needs {} values",
                indices.len()
            ))),
            value => {
                let value = value.into_single()?;
                self.set_at(indices[0], &value, track);
                Ok(())
            }
        }
    }

    /// True when the single-column primary key is unset (zero or empty).
    ///
    /// Composite keys have no notion of "new" and yield a logic error.
    pub fn is_new(&self) -> Result<bool> {
        match self.schema.primary_key() {
            PrimaryKey::Single(_) => Ok(self.values[self.schema.primary_indices()[0]].is_empty()),
            PrimaryKey::Composite(_) => Err(DbError::Logic(format!(
                "cannot tell whether a '{}' entity is new, its primary key is composite",
                self.table_name()
            ))),
        }
    }

    pub fn primary_property_key(&self) -> &PrimaryKey {
        self.schema.primary_key()
    }

    pub fn primary_field_key(&self) -> PrimaryKey {
        self.schema.primary_field_key()
    }

    /// `WHERE` fragment and parameters matching this record's primary key.
    pub fn primary_condition(&self) -> (String, Vec<Value>) {
        let field_names = self.schema.field_names();
        let indices = self.schema.primary_indices();
        let sql = indices
            .iter()
            .map(|&idx| format!("{} = ?", quote_identifier(field_names[idx])))
            .collect::<Vec<_>>()
            .join(" AND ");
        let params = indices.iter().map(|&idx| self.values[idx].clone()).collect();
        (sql, params)
    }

    // ------------------------------------------------------------------
    // Change tracking
    // ------------------------------------------------------------------

    /// False for undeclared names.
    pub fn is_modified(&self, name: &str) -> bool {
        self.schema
            .index_of(name)
            .is_some_and(|idx| self.modified.contains(&idx))
    }

    pub fn has_modified(&self) -> bool {
        !self.modified.is_empty()
    }

    pub fn modified_properties(&self) -> Vec<&str> {
        self.modified
            .iter()
            .map(|&idx| self.schema.column_at(idx).name.as_str())
            .collect()
    }

    /// Modified properties and their current values, in modification order.
    pub fn modified_data(&self) -> Row {
        self.modified
            .iter()
            .map(|&idx| (self.schema.column_at(idx).name.clone(), self.values[idx].clone()))
            .collect()
    }

    /// Like [`Record::modified_data`] but keyed by column name, ready for an update.
    pub fn modified_field_data(&self) -> Row {
        let field_names = self.schema.field_names();
        self.modified
            .iter()
            .map(|&idx| (field_names[idx], self.values[idx].clone()))
            .collect()
    }

    pub fn clear_modified(&mut self, name: &str) -> Result<()> {
        let idx = self.index_of(name)?;
        self.modified.retain(|&m| m != idx);
        Ok(())
    }

    pub fn clear_all_modified(&mut self) {
        self.modified.clear();
    }

    // ------------------------------------------------------------------
    // Bulk data
    // ------------------------------------------------------------------

    /// Every property and its value, in declaration order.
    pub fn data(&self) -> Row {
        self.schema
            .columns()
            .iter()
            .zip(&self.values)
            .map(|(c, v)| (c.name.clone(), v.clone()))
            .collect()
    }

    pub fn data_without_primary(&self) -> Row {
        self.schema
            .columns()
            .iter()
            .zip(&self.values)
            .enumerate()
            .filter(|(idx, _)| !self.schema.is_primary_index(*idx))
            .map(|(_, (c, v))| (c.name.clone(), v.clone()))
            .collect()
    }

    /// Every column and its value keyed by column name, ready for an insert.
    pub fn field_data(&self) -> Row {
        self.schema
            .field_names()
            .into_iter()
            .zip(&self.values)
            .map(|(f, v)| (f, v.clone()))
            .collect()
    }

    pub fn default_data(&self) -> Row {
        self.schema.default_data()
    }

    /// Sets every entry through [`Record::set`].
    ///
    /// All names are checked before anything is written, so an undeclared
    /// name leaves the record untouched.
    pub fn set_data(&mut self, data: &Row) -> Result<()> {
        let indices = data
            .keys()
            .map(|name| self.index_of(name))
            .collect::<Result<Vec<_>>>()?;
        for (idx, value) in indices.into_iter().zip(data.values()) {
            self.set_at(idx, value, true);
        }
        Ok(())
    }

    /// Applies a raw row keyed by column names without marking anything
    /// modified. Unknown columns are ignored and missing ones keep their value.
    pub fn load_from_row(&mut self, row: &Row) {
        for (field, value) in row.iter() {
            if let Some(idx) = self.schema.index_of_field(field) {
                self.set_at(idx, value, false);
            }
        }
    }

    // ------------------------------------------------------------------
    // Persistence intent
    // ------------------------------------------------------------------

    /// New entities and those forced to insert. Composite-key entities only
    /// insert when forced.
    pub fn should_insert_on_save(&self) -> bool {
        self.force_insert_on_save || self.is_new().unwrap_or(false)
    }

    pub fn force_insert_on_save(&self) -> bool {
        self.force_insert_on_save
    }

    pub fn set_force_insert_on_save(&mut self, force: bool) {
        self.force_insert_on_save = force;
    }

    pub fn should_delete_on_save(&self) -> bool {
        self.delete_on_save
    }

    pub fn set_delete_on_save(&mut self, delete: bool) {
        self.delete_on_save = delete;
    }

    /// Marker for rows already removed from storage.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Validates `data` with the [`DefaultValidator`] and applies the values
    /// that passed.
    pub fn validate_and_set_data(
        &mut self,
        data: &Row,
        translator: Option<&dyn Translator>,
    ) -> Result<ValidationErrors> {
        self.validate_and_set_data_with(data, &DefaultValidator, translator)
    }

    /// Validates `data` and applies only the values that passed.
    ///
    /// Undeclared names are an error and nothing is applied. Otherwise the
    /// failing properties are returned with their messages.
    pub fn validate_and_set_data_with(
        &mut self,
        data: &Row,
        validator: &dyn Validator,
        translator: Option<&dyn Translator>,
    ) -> Result<ValidationErrors> {
        let translator = translator.unwrap_or(&DefaultTranslator);
        let mut errors = ValidationErrors::new();
        let mut passed = Row::with_capacity(data.len());

        for (name, value) in data.iter() {
            let column = self.schema.column(name)?;
            let messages = validator.validate(value, &column.constraints, translator);
            if messages.is_empty() {
                passed.insert(name, value.clone());
            } else {
                errors.insert(name.to_string(), messages);
            }
        }

        self.set_data(&passed)?;
        Ok(errors)
    }

    // ------------------------------------------------------------------
    // Merge
    // ------------------------------------------------------------------

    /// Copies the properties modified in `other` that are not modified
    /// locally. Copied properties become pending here.
    pub fn merge_from(&mut self, other: &Record) -> Result<()> {
        if !Arc::ptr_eq(&self.schema, &other.schema)
            && self.schema.property_names() != other.schema.property_names()
        {
            return Err(DbError::InvalidArgument(format!(
                "cannot merge a '{}' record into a '{}' record",
                other.table_name(),
                self.table_name()
            )));
        }

        for &idx in &other.modified {
            if !self.modified.contains(&idx) {
                self.set_at(idx, &other.values[idx], true);
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Generic accessors
    // ------------------------------------------------------------------

    /// Name-based accessor dispatch: `getSomeName` / `setSomeName`.
    ///
    /// Getters take no arguments and return the value. Setters take the value
    /// and an optional tracking flag, returning `None`.
    pub fn call(&mut self, method: &str, args: &[Value]) -> Result<Option<Value>> {
        let (is_getter, rest) = if let Some(rest) = method.strip_prefix("get") {
            (true, rest)
        } else if let Some(rest) = method.strip_prefix("set") {
            (false, rest)
        } else {
            return Err(DbError::MethodNotFound(method.to_string()));
        };

        let idx = lower_first(rest)
            .and_then(|name| self.schema.index_of(&name))
            .ok_or_else(|| DbError::MethodNotFound(method.to_string()))?;

        let invalid_count = || DbError::InvalidArgumentCount {
            method: method.to_string(),
            given: args.len(),
        };

        if is_getter {
            if !args.is_empty() {
                return Err(invalid_count());
            }
            return Ok(Some(self.values[idx].clone()));
        }

        match args {
            [value] => self.set_at(idx, value, true),
            [value, track] => self.set_at(idx, value, track.cast_bool()),
            _ => return Err(invalid_count()),
        }
        Ok(None)
    }
}

/// `SomeName` -> `someName`; `None` for an empty name.
fn lower_first(name: &str) -> Option<String> {
    let mut chars = name.chars();
    let first = chars.next()?;
    Some(first.to_lowercase().chain(chars).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ColumnDef;
    use crate::schema::SchemaDefinition;

    fn schema() -> Arc<SchemaRegistry> {
        let def = SchemaDefinition::new("things")
            .column(ColumnDef::int("id"))
            .column(ColumnDef::string("title").default("untitled"))
            .primary_key("id");
        Arc::new(SchemaRegistry::resolve(def).unwrap())
    }

    #[test]
    fn test_lower_first() {
        assert_eq!(lower_first("SomeId").as_deref(), Some("someId"));
        assert_eq!(lower_first(""), None);
    }

    #[test]
    fn test_tracking_is_event_based() {
        let mut record = Record::new(schema());
        record.set("title", "untitled").unwrap();
        assert!(record.is_modified("title"));
    }

    #[test]
    fn test_set_data_rejects_unknown_names_atomically() {
        let mut record = Record::new(schema());
        let data = Row::new().with("title", "x").with("nope", 1);
        assert!(matches!(record.set_data(&data), Err(DbError::InvalidArgument(_))));
        assert_eq!(record.get("title").unwrap(), &Value::from("untitled"));
        assert!(!record.has_modified());
    }

    #[test]
    fn test_primary_condition() {
        let record = Record::with_primary(schema(), 7).unwrap();
        let (sql, params) = record.primary_condition();
        assert_eq!(sql, "`id` = ?");
        assert_eq!(params, vec![Value::Integer(7)]);
    }

    #[test]
    fn test_modified_field_data_uses_column_names() {
        let mut record = Record::new(schema());
        record.set("title", "hello").unwrap();
        assert_eq!(record.modified_field_data(), Row::new().with("title", "hello"));
    }
}
