// ============================================================================
// Transaction Control
// ============================================================================
//
// BEGIN / COMMIT / ROLLBACK over the executor's single connection.
// Nested transactions are not supported: a second plain begin fails, and
// `begin_transaction(true)` turns it into a no-op that reports `false`.
//
// ============================================================================

use tracing::debug;

use super::executor::{ConnectionState, Executor, query_error};
use crate::core::{DbError, Result};

impl Executor {
    /// Starts a transaction.
    ///
    /// With `only_if_none` set, an already active transaction is left alone
    /// and `Ok(false)` is returned. Otherwise a begin while active is an error.
    pub fn begin_transaction(&mut self, only_if_none: bool) -> Result<bool> {
        if self.has_active_transaction() {
            if only_if_none {
                return Ok(false);
            }
            return Err(DbError::Logic(
                "Nested transactions are not supported. Commit or roll back first.".into(),
            ));
        }

        self.driver_mut()?
            .begin()
            .map_err(|source| query_error("BEGIN", source))?;
        self.state = ConnectionState::InTransaction;
        debug!("transaction started");
        Ok(true)
    }

    /// Commits through the driver. The active flag stays set if the commit fails.
    pub fn commit(&mut self) -> Result<()> {
        self.driver_mut()?
            .commit()
            .map_err(|source| query_error("COMMIT", source))?;
        self.end_transaction();
        debug!("transaction committed");
        Ok(())
    }

    /// Rolls back through the driver. The active flag is cleared either way.
    pub fn roll_back(&mut self) -> Result<()> {
        let result = self.driver_mut()?.rollback();
        self.end_transaction();
        result.map_err(|source| query_error("ROLLBACK", source))?;
        debug!("transaction rolled back");
        Ok(())
    }

    pub fn has_active_transaction(&self) -> bool {
        self.state == ConnectionState::InTransaction
    }

    fn end_transaction(&mut self) {
        if self.state == ConnectionState::InTransaction {
            self.state = ConnectionState::Active;
        }
    }
}
