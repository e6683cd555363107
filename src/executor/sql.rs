// ============================================================================
// Statement Synthesis
// ============================================================================
//
// Builds INSERT / UPDATE / DELETE text from ordered data maps. Identifiers
// are backtick-quoted, values become `?` placeholders in map order.
//
// ============================================================================

use crate::core::{DbError, Result, Row, Value};
use crate::schema::quote_identifier;

/// SQL text plus its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

fn require_data(data: &Row, verb: &str, table: &str) -> Result<()> {
    if data.is_empty() {
        return Err(DbError::InvalidArgument(format!(
            "{} into '{}' needs at least one column",
            verb, table
        )));
    }
    Ok(())
}

/// ``INSERT INTO `table` (`a`, `b`) VALUES (?, ?)``
pub fn build_insert(table: &str, data: &Row) -> Result<Statement> {
    require_data(data, "INSERT", table)?;

    let columns = data.keys().map(quote_identifier).collect::<Vec<_>>().join(", ");
    let placeholders = vec!["?"; data.len()].join(", ");

    Ok(Statement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(table),
            columns,
            placeholders
        ),
        params: data.values().cloned().collect(),
    })
}

/// ``UPDATE `table` SET `a` = ?, `b` = ? WHERE <where_sql>``
///
/// Parameters are the data values followed by `where_params`. An empty
/// `where_sql` leaves the `WHERE` clause out.
pub fn build_update(table: &str, data: &Row, where_sql: &str, where_params: &[Value]) -> Result<Statement> {
    require_data(data, "UPDATE", table)?;

    let assignments = data
        .keys()
        .map(|column| format!("{} = ?", quote_identifier(column)))
        .collect::<Vec<_>>()
        .join(", ");

    let mut sql = format!("UPDATE {} SET {}", quote_identifier(table), assignments);
    if !where_sql.trim().is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(where_sql);
    }

    let params = data.values().cloned().chain(where_params.iter().cloned()).collect();
    Ok(Statement { sql, params })
}

/// ``DELETE FROM `table` WHERE <where_sql>``
///
/// An empty condition is rejected rather than clearing the table.
pub fn build_delete(table: &str, where_sql: &str, where_params: &[Value]) -> Result<Statement> {
    if where_sql.trim().is_empty() {
        return Err(DbError::InvalidArgument(format!(
            "DELETE from '{}' needs a WHERE condition",
            table
        )));
    }

    Ok(Statement {
        sql: format!("DELETE FROM {} WHERE {}", quote_identifier(table), where_sql),
        params: where_params.to_vec(),
    })
}
