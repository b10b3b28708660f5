//! Query Execution Module
//!
//! Runs statements against a connection, logs them, and turns result rows
//! into display strings.

use crate::core::Result;
use rusqlite::{types::ValueRef, Connection, Params};
use tracing::debug;

/// Represents the result of a SQL query execution
#[derive(Debug)]
pub struct QueryResult {
    /// Column names from the query result
    pub columns: Vec<String>,
    /// Rows of data as string values
    pub rows: Vec<Vec<String>>,
    /// Number of rows returned
    pub row_count: usize,
}

impl QueryResult {
    /// Creates a new QueryResult from column names and row data
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let row_count = rows.len();
        QueryResult {
            columns,
            rows,
            row_count,
        }
    }
}

/// Query execution service that operates on a database connection
pub struct QueryExecutor<'a> {
    connection: &'a Connection,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new QueryExecutor for the given connection
    pub fn new(connection: &'a Connection) -> Self {
        QueryExecutor { connection }
    }

    /// Executes a statement that returns no rows.
    ///
    /// # Returns
    ///
    /// The number of rows changed, as reported by SQLite.
    ///
    /// # Errors
    ///
    /// `CrudError::Database` with the driver's message when the statement is
    /// rejected.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        debug!("Executing: {}", sql);
        let changed = self.connection.execute(sql, params)?;
        debug!("{} row(s) affected", changed);
        Ok(changed)
    }

    /// Runs a query and returns every row formatted for display.
    pub fn query<P: Params>(&self, sql: &str, params: P) -> Result<QueryResult> {
        debug!("Querying: {}", sql);
        let mut stmt = self.connection.prepare(sql)?;

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let column_count = stmt.column_count();

        let rows = stmt
            .query_map(params, |row| {
                let mut values = Vec::with_capacity(column_count);
                for i in 0..column_count {
                    values.push(format_value(row.get_ref(i)?));
                }
                Ok(values)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(QueryResult::new(columns, rows))
    }

    /// Column names a query would produce, without fetching any row.
    pub fn column_names(&self, sql: &str) -> Result<Vec<String>> {
        debug!("Describing: {}", sql);
        let stmt = self.connection.prepare(sql)?;
        Ok(stmt.column_names().into_iter().map(String::from).collect())
    }
}

/// Formats a SQLite value for display
fn format_value(value: ValueRef) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).to_string(),
        ValueRef::Blob(b) => format!("<BLOB: {} bytes>", b.len()),
    }
}
