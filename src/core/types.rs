use std::fmt;

use serde::{Deserialize, Serialize};

use super::{DbError, Result, Value};

/// Declared storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Int,
    String,
    Bool,
    Float,
}

impl ColumnType {
    pub fn zero_value(&self) -> Value {
        match self {
            Self::Int => Value::Integer(0),
            Self::String => Value::Text(String::new()),
            Self::Bool => Value::Boolean(false),
            Self::Float => Value::Float(0.0),
        }
    }

    pub fn cast(&self, value: &Value) -> Value {
        match self {
            Self::Int => Value::Integer(value.cast_int()),
            Self::String => Value::Text(value.cast_text()),
            Self::Bool => Value::Boolean(value.cast_bool()),
            Self::Float => Value::Float(value.cast_float()),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::String => write!(f, "string"),
            Self::Bool => write!(f, "bool"),
            Self::Float => write!(f, "float"),
        }
    }
}

/// Validation constraints attached to a column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Constraints {
    pub required: bool,
    pub max_length: Option<usize>,
    pub non_empty: bool,
}

/// Column declaration, keyed by its camelCase property name.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    pub default: Value,
    pub constraints: Constraints,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            default: column_type.zero_value(),
            constraints: Constraints::default(),
        }
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Int)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::String)
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Bool)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Float)
    }

    /// Declared default. Passing [`Value::Null`] makes the column nullable.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.default = if value.is_null() {
            Value::Null
        } else {
            self.column_type.cast(&value)
        };
        self
    }

    pub fn nullable(self) -> Self {
        self.default(Value::Null)
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.constraints.max_length = Some(max_length);
        self
    }

    pub fn required(mut self) -> Self {
        self.constraints.required = true;
        self
    }

    pub fn non_empty(mut self) -> Self {
        self.constraints.non_empty = true;
        self
    }

    pub fn is_nullable(&self) -> bool {
        self.default.is_null()
    }

    /// Coerces `value` to the declared type.
    ///
    /// Null and `""` stay null only on columns whose default is null;
    /// elsewhere they collapse to the type's zero value.
    pub fn coerce(&self, value: &Value) -> Value {
        if self.is_nullable() && value.is_blank() {
            return Value::Null;
        }
        self.column_type.cast(value)
    }
}

/// Primary-key descriptor: one property or an ordered composite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryKey {
    Single(String),
    Composite(Vec<String>),
}

impl PrimaryKey {
    pub fn parts(&self) -> Vec<&str> {
        match self {
            Self::Single(name) => vec![name.as_str()],
            Self::Composite(names) => names.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Composite(_))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts().contains(&name)
    }
}

impl From<&str> for PrimaryKey {
    fn from(name: &str) -> Self {
        Self::Single(name.to_string())
    }
}

impl From<String> for PrimaryKey {
    fn from(name: String) -> Self {
        Self::Single(name)
    }
}

impl From<Vec<&str>> for PrimaryKey {
    fn from(names: Vec<&str>) -> Self {
        Self::Composite(names.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for PrimaryKey {
    fn from(names: [&str; N]) -> Self {
        Self::Composite(names.iter().map(|s| s.to_string()).collect())
    }
}

/// Value of a primary key, shaped like its [`PrimaryKey`].
#[derive(Debug, Clone, PartialEq)]
pub enum PrimaryValue {
    Single(Value),
    Composite(Vec<Value>),
}

impl PrimaryValue {
    pub fn into_single(self) -> Result<Value> {
        match self {
            Self::Single(value) => Ok(value),
            Self::Composite(_) => Err(DbError::InvalidArgument(
                "single-column primary key cannot take a sequence value".into(),
            )),
        }
    }
}

impl From<Value> for PrimaryValue {
    fn from(value: Value) -> Self {
        Self::Single(value)
    }
}

impl From<i64> for PrimaryValue {
    fn from(value: i64) -> Self {
        Self::Single(Value::Integer(value))
    }
}

impl From<i32> for PrimaryValue {
    fn from(value: i32) -> Self {
        Self::Single(Value::from(value))
    }
}

impl From<&str> for PrimaryValue {
    fn from(value: &str) -> Self {
        Self::Single(Value::from(value))
    }
}

impl From<String> for PrimaryValue {
    fn from(value: String) -> Self {
        Self::Single(Value::Text(value))
    }
}

impl<T: Into<Value>> From<Vec<T>> for PrimaryValue {
    fn from(values: Vec<T>) -> Self {
        Self::Composite(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for PrimaryValue {
    fn from(values: [T; N]) -> Self {
        Self::Composite(values.into_iter().map(Into::into).collect())
    }
}
