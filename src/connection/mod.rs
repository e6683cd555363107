//! Driver boundary consumed by the [`Executor`](crate::Executor).

pub mod config;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use crate::core::{DriverError, Row, Value};

pub use config::ConnectionConfig;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDriver;

/// A live database connection speaking SQL with `?` placeholders.
///
/// Implementations report failures as [`DriverError`] only; the executor
/// wraps them into [`DbError::Query`](crate::DbError::Query).
pub trait Driver: Send {
    /// Prepares and runs a statement, returning the affected row count.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DriverError>;

    /// Prepares and runs a query, returning every row keyed by column name.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DriverError>;

    /// First row of a query. The default collects every row through
    /// [`Driver::query`]; drivers able to stop early should override it.
    fn query_first(&mut self, sql: &str, params: &[Value]) -> Result<Option<Row>, DriverError> {
        Ok(self.query(sql, params)?.into_iter().next())
    }

    /// Renders `value` as a SQL literal.
    fn quote(&self, value: &Value) -> String;

    fn last_insert_id(&self) -> String;

    fn begin(&mut self) -> Result<(), DriverError>;

    fn commit(&mut self) -> Result<(), DriverError>;

    fn rollback(&mut self) -> Result<(), DriverError>;
}

/// Standard single-quote literal escaping.
pub fn quote_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Boolean(b) => String::from(if *b { "1" } else { "0" }),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TwoRows;

    impl Driver for TwoRows {
        fn execute(&mut self, _: &str, _: &[Value]) -> Result<u64, DriverError> {
            Ok(0)
        }

        fn query(&mut self, _: &str, _: &[Value]) -> Result<Vec<Row>, DriverError> {
            Ok(vec![Row::new().with("id", 1), Row::new().with("id", 2)])
        }

        fn quote(&self, value: &Value) -> String {
            quote_literal(value)
        }

        fn last_insert_id(&self) -> String {
            String::new()
        }

        fn begin(&mut self) -> Result<(), DriverError> {
            Ok(())
        }

        fn commit(&mut self) -> Result<(), DriverError> {
            Ok(())
        }

        fn rollback(&mut self) -> Result<(), DriverError> {
            Ok(())
        }
    }

    #[test]
    fn test_default_query_first_takes_first_row() {
        let row = TwoRows.query_first("SELECT id FROM t", &[]).unwrap();
        assert_eq!(row, Some(Row::new().with("id", 1)));
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal(&Value::from("it's")), "'it''s'");
        assert_eq!(quote_literal(&Value::Integer(1)), "1");
        assert_eq!(quote_literal(&Value::Boolean(false)), "0");
        assert_eq!(quote_literal(&Value::Null), "NULL");
    }
}
