use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OpenFlags, params_from_iter};
use tracing::debug;

use super::{ConnectionConfig, Driver, quote_literal};
use crate::core::{DbError, DriverError, Result, Row, Value};

/// [`Driver`] over a single `rusqlite` connection.
pub struct SqliteDriver {
    conn: Connection,
}

impl SqliteDriver {
    pub fn open(config: &ConnectionConfig) -> Result<Self> {
        config.validate()?;

        let conn = if config.is_in_memory() {
            Connection::open_in_memory()
        } else {
            let flags = if config.read_only {
                OpenFlags::SQLITE_OPEN_READ_ONLY
            } else {
                OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
            };
            Connection::open_with_flags(&config.path, flags | OpenFlags::SQLITE_OPEN_NO_MUTEX)
        }
        .map_err(|err| DbError::Config(format!("cannot open '{}': {}", config.path, err)))?;

        conn.busy_timeout(config.busy_timeout_duration())
            .map_err(|err| DbError::Config(err.to_string()))?;

        debug!(path = %config.path, read_only = config.read_only, "opened sqlite connection");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(&ConnectionConfig::in_memory())
    }

    /// The underlying `rusqlite` connection.
    pub fn inner(&self) -> &Connection {
        &self.conn
    }
}

impl Driver for SqliteDriver {
    fn execute(&mut self, sql: &str, params: &[Value]) -> std::result::Result<u64, DriverError> {
        let mut stmt = self.conn.prepare(sql)?;
        let affected = stmt.execute(params_from_iter(params.iter()))?;
        Ok(affected as u64)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> std::result::Result<Vec<Row>, DriverError> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns = column_names(&stmt);
        let mut rows = stmt.query(params_from_iter(params.iter()))?;

        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            result.push(read_row(&columns, row)?);
        }
        Ok(result)
    }

    fn query_first(&mut self, sql: &str, params: &[Value]) -> std::result::Result<Option<Row>, DriverError> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns = column_names(&stmt);
        let mut rows = stmt.query(params_from_iter(params.iter()))?;

        match rows.next()? {
            Some(row) => Ok(Some(read_row(&columns, row)?)),
            None => Ok(None),
        }
    }

    fn quote(&self, value: &Value) -> String {
        quote_literal(value)
    }

    fn last_insert_id(&self) -> String {
        self.conn.last_insert_rowid().to_string()
    }

    fn begin(&mut self) -> std::result::Result<(), DriverError> {
        Ok(self.conn.execute_batch("BEGIN")?)
    }

    fn commit(&mut self) -> std::result::Result<(), DriverError> {
        Ok(self.conn.execute_batch("COMMIT")?)
    }

    fn rollback(&mut self) -> std::result::Result<(), DriverError> {
        Ok(self.conn.execute_batch("ROLLBACK")?)
    }
}

fn column_names(stmt: &rusqlite::Statement<'_>) -> Vec<String> {
    stmt.column_names().into_iter().map(String::from).collect()
}

fn read_row(columns: &[String], row: &rusqlite::Row<'_>) -> std::result::Result<Row, DriverError> {
    let mut out = Row::with_capacity(columns.len());
    for (idx, name) in columns.iter().enumerate() {
        out.insert(name.as_str(), from_value_ref(name, row.get_ref(idx)?)?);
    }
    Ok(out)
}

/// BLOB has no [`Value`] counterpart and is rejected rather than decoded.
fn from_value_ref(column: &str, value: ValueRef<'_>) -> std::result::Result<Value, DriverError> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(_) => {
            return Err(DriverError::new(format!(
                "column '{}' holds a BLOB, which is not supported",
                column
            )));
        }
    })
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Boolean(b) => ToSqlOutput::from(i64::from(*b)),
            Value::Integer(i) => ToSqlOutput::from(*i),
            Value::Float(f) => ToSqlOutput::from(*f),
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

impl From<rusqlite::Error> for DriverError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(code) => DriverError::with_code(format!("{:?}", code), err.to_string()),
            None => DriverError::new(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_values() {
        let mut driver = SqliteDriver::open_in_memory().unwrap();
        driver
            .execute("CREATE TABLE t (i INTEGER, f REAL, s TEXT, n TEXT)", &[])
            .unwrap();
        driver
            .execute(
                "INSERT INTO t VALUES (?, ?, ?, ?)",
                &[Value::Integer(1), Value::Float(1.5), Value::from("x"), Value::Null],
            )
            .unwrap();

        let rows = driver.query("SELECT * FROM t", &[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("i"), Some(&Value::Integer(1)));
        assert_eq!(rows[0].get("f"), Some(&Value::Float(1.5)));
        assert_eq!(rows[0].get("s"), Some(&Value::from("x")));
        assert_eq!(rows[0].get("n"), Some(&Value::Null));
    }

    #[test]
    fn test_query_first_stops_at_first_row() {
        let mut driver = SqliteDriver::open_in_memory().unwrap();
        driver.execute("CREATE TABLE t (i INTEGER)", &[]).unwrap();
        driver.execute("INSERT INTO t VALUES (1), (2), (3)", &[]).unwrap();

        let row = driver.query_first("SELECT i FROM t ORDER BY i", &[]).unwrap();
        assert_eq!(row, Some(Row::new().with("i", 1)));
        assert_eq!(driver.query_first("SELECT i FROM t WHERE i > 5", &[]).unwrap(), None);
    }

    #[test]
    fn test_blob_columns_are_rejected() {
        let mut driver = SqliteDriver::open_in_memory().unwrap();
        let err = driver.query("SELECT x'00ff' AS data", &[]).unwrap_err();
        assert!(err.message.contains("'data'"));
        assert!(err.message.contains("BLOB"));

        let err = driver.query_first("SELECT x'00ff' AS data", &[]).unwrap_err();
        assert!(err.message.contains("BLOB"));
    }

    #[test]
    fn test_errors_carry_code() {
        let mut driver = SqliteDriver::open_in_memory().unwrap();
        let err = driver.execute("NO SQL", &[]).unwrap_err();
        assert!(!err.message.is_empty());
    }
}
