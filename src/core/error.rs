use thiserror::Error;

/// Failure reported by a [`Driver`](crate::connection::Driver).
///
/// Drivers translate their native error types into this one so nothing
/// driver-specific crosses the executor boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DriverError {
    pub code: Option<String>,
    pub message: String,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Logic error: {0}")]
    Logic(String),

    #[error("Method '{0}' not found")]
    MethodNotFound(String),

    #[error("Invalid argument count for '{method}': got {given}")]
    InvalidArgumentCount { method: String, given: usize },

    #[error("Query failed: {source} (SQL: {sql})")]
    Query {
        sql: String,
        #[source]
        source: DriverError,
    },

    #[error("Not connected to the database")]
    NotConnected,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl DbError {
    pub(crate) fn unknown_property(name: &str) -> Self {
        Self::InvalidArgument(format!("'{}' is not a declared property", name))
    }

    /// True for failures reported by the driver, the only kind worth retrying.
    pub fn is_query_error(&self) -> bool {
        matches!(self, Self::Query { .. })
    }
}

impl<T> From<std::sync::PoisonError<T>> for DbError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
