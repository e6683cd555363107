use tracing::{debug, warn};

use super::sql::{self, Statement};
use crate::connection::{ConnectionConfig, Driver};
use crate::core::{DbError, Result, Row, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ConnectionState {
    Active,
    InTransaction,
    Closed,
}

/// Thin, transaction-aware adapter over one [`Driver`] connection.
///
/// Every call blocks until the driver returns. The executor does no
/// synchronization of its own; share it behind the caller's lock.
///
/// # Examples
///
/// ```
/// # use dbmapper::{Executor, Row, Value};
/// # fn main() -> dbmapper::Result<()> {
/// let mut db = Executor::open_in_memory()?;
/// db.exec("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)", &[])?;
/// db.insert("users", &Row::new().with("name", "Alice"))?;
///
/// let count = db.fetch_one("SELECT COUNT(*) FROM users", &[])?;
/// assert_eq!(count, Some(Value::Integer(1)));
/// # Ok(())
/// # }
/// ```
pub struct Executor {
    driver: Option<Box<dyn Driver>>,
    pub(super) state: ConnectionState,
    config: Option<ConnectionConfig>,
    log_statements: bool,
}

impl Executor {
    pub fn new(driver: impl Driver + 'static) -> Self {
        Self::from_boxed(Box::new(driver))
    }

    pub fn from_boxed(driver: Box<dyn Driver>) -> Self {
        Self {
            driver: Some(driver),
            state: ConnectionState::Active,
            config: None,
            log_statements: true,
        }
    }

    /// Opens the bundled SQLite driver. The config is kept for [`Executor::reconnect`].
    #[cfg(feature = "sqlite")]
    pub fn open(config: ConnectionConfig) -> Result<Self> {
        let driver = crate::connection::SqliteDriver::open(&config)?;
        let mut executor = Self::new(driver);
        executor.log_statements = config.log_statements;
        executor.config = Some(config);
        Ok(executor)
    }

    #[cfg(feature = "sqlite")]
    pub fn open_in_memory() -> Result<Self> {
        Self::open(ConnectionConfig::in_memory())
    }

    /// Drops the current connection and opens a new one from the stored config.
    ///
    /// An open transaction is lost with the old connection.
    #[cfg(feature = "sqlite")]
    pub fn reconnect(&mut self) -> Result<()> {
        let config = self.config.clone().ok_or_else(|| {
            DbError::Config("executor was built from a driver, not a connection config".into())
        })?;
        self.disconnect();
        self.driver = Some(Box::new(crate::connection::SqliteDriver::open(&config)?));
        self.state = ConnectionState::Active;
        Ok(())
    }

    pub fn config(&self) -> Option<&ConnectionConfig> {
        self.config.as_ref()
    }

    pub fn set_log_statements(&mut self, enabled: bool) {
        self.log_statements = enabled;
    }

    pub fn is_connected(&self) -> bool {
        self.driver.is_some()
    }

    /// The live connection, `None` after [`Executor::disconnect`].
    pub fn connection(&self) -> Option<&dyn Driver> {
        self.driver.as_deref()
    }

    /// Releases the connection. Later calls fail with [`DbError::NotConnected`].
    pub fn disconnect(&mut self) {
        if self.driver.take().is_some() {
            debug!("disconnected");
        }
        self.state = ConnectionState::Closed;
    }

    pub(super) fn driver_mut(&mut self) -> Result<&mut dyn Driver> {
        match self.driver.as_deref_mut() {
            Some(driver) => Ok(driver),
            None => Err(DbError::NotConnected),
        }
    }

    fn driver_ref(&self) -> Result<&dyn Driver> {
        self.driver.as_deref().ok_or(DbError::NotConnected)
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// Runs `sql` with positional `params`, returning the affected row count.
    ///
    /// Booleans are sent as `0` / `1`.
    pub fn exec(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        let params = bind_params(params);
        self.log(sql, &params);
        let result = self.driver_mut()?.execute(sql, &params);
        result.map_err(|source| query_error(sql, source))
    }

    /// First row of the result, if any. Rows past the first are not read
    /// when the driver supports stopping early.
    pub fn fetch_row(&mut self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        let params = bind_params(params);
        self.log(sql, &params);
        let result = self.driver_mut()?.query_first(sql, &params);
        result.map_err(|source| query_error(sql, source))
    }

    pub fn fetch_all(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let params = bind_params(params);
        self.log(sql, &params);
        let result = self.driver_mut()?.query(sql, &params);
        result.map_err(|source| query_error(sql, source))
    }

    /// First column of the first row, for scalar queries.
    pub fn fetch_one(&mut self, sql: &str, params: &[Value]) -> Result<Option<Value>> {
        Ok(self
            .fetch_row(sql, params)?
            .and_then(|row| row.first_value().cloned()))
    }

    /// Driver literal escaping, for values that cannot be bound.
    pub fn quote(&self, value: &Value) -> Result<String> {
        Ok(self.driver_ref()?.quote(value))
    }

    pub fn last_insert_id(&self) -> Result<String> {
        Ok(self.driver_ref()?.last_insert_id())
    }

    pub fn insert(&mut self, table: &str, data: &Row) -> Result<u64> {
        let stmt = sql::build_insert(table, data)?;
        self.run(stmt)
    }

    pub fn update(&mut self, table: &str, data: &Row, where_sql: &str, where_params: &[Value]) -> Result<u64> {
        let stmt = sql::build_update(table, data, where_sql, where_params)?;
        self.run(stmt)
    }

    pub fn delete(&mut self, table: &str, where_sql: &str, where_params: &[Value]) -> Result<u64> {
        let stmt = sql::build_delete(table, where_sql, where_params)?;
        self.run(stmt)
    }

    fn run(&mut self, stmt: Statement) -> Result<u64> {
        self.exec(&stmt.sql, &stmt.params)
    }

    fn log(&self, sql: &str, params: &[Value]) {
        if self.log_statements {
            debug!(sql, params = params.len(), "executing statement");
        }
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        if self.state == ConnectionState::InTransaction {
            if let Some(driver) = self.driver.as_deref_mut() {
                if let Err(err) = driver.rollback() {
                    warn!(error = %err, "rollback of abandoned transaction failed");
                }
            }
        }
    }
}

fn bind_params(params: &[Value]) -> Vec<Value> {
    params
        .iter()
        .map(|param| match param {
            Value::Boolean(b) => Value::Integer(i64::from(*b)),
            other => other.clone(),
        })
        .collect()
}

pub(super) fn query_error(sql: &str, source: crate::core::DriverError) -> DbError {
    warn!(sql, error = %source, "query failed");
    DbError::Query {
        sql: sql.to_string(),
        source,
    }
}
