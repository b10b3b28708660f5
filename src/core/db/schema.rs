//! Schema Operations Module
//!
//! Database, table and column DDL, plus the catalog lookups that the
//! existence guard and insert validation rely on.
//!
//! Names are checked with `check_identifier` before they are spliced into
//! statement text. Declared column types are passed through as written, so a
//! malformed type only surfaces as a driver error.

use super::connection::Session;
use super::query::QueryExecutor;
use crate::core::ident::check_identifier;
use crate::core::{CrudError, Result};
use rusqlite::{Connection, OptionalExtension};
use std::fs;
use tracing::{info, warn};

/// One column of a table being created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    /// Declared type as typed by the operator, e.g. `VARCHAR(50)`
    pub data_type: String,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        ColumnSpec {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A table name with its ordered column definitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
}

impl TableSpec {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnSpec>) -> Self {
        TableSpec {
            name: name.into(),
            columns,
        }
    }

    /// Renders `CREATE TABLE <name> (<col> <type>, ...)`.
    pub fn create_statement(&self) -> Result<String> {
        check_identifier(&self.name)?;
        if self.columns.is_empty() {
            return Err(CrudError::Validation(format!(
                "Table '{}' needs at least one column.",
                self.name
            )));
        }
        let definitions = self
            .columns
            .iter()
            .map(|c| Ok(format!("{} {}", check_identifier(&c.name)?, c.data_type.trim())))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("CREATE TABLE {} ({})", self.name, definitions.join(", ")))
    }
}

impl Session {
    /// Creates a new, empty database on the server.
    ///
    /// SQLite has no `CREATE DATABASE`; the database file is created by
    /// attaching it under the requested name, writing its header, and
    /// detaching it again. The session's current connection is unchanged.
    ///
    /// # Errors
    ///
    /// `CrudError::Statement` if a database with that name already exists.
    pub fn create_database(&self, db_name: &str) -> Result<()> {
        check_identifier(db_name)?;
        let conn = self.connection()?;
        let path = self.database_path(db_name);
        if path.exists() {
            return Err(CrudError::Statement(format!(
                "Database '{}' already exists.",
                db_name
            )));
        }

        let executor = QueryExecutor::new(conn);
        let created = executor
            .execute(
                &format!("ATTACH DATABASE ?1 AS {}", db_name),
                [path.to_string_lossy().into_owned()],
            )
            .and_then(|_| {
                let stamped =
                    executor.execute(&format!("PRAGMA {}.user_version = 0", db_name), []);
                let detached = executor.execute(&format!("DETACH DATABASE {}", db_name), []);
                stamped.and(detached)
            });
        if let Err(e) = created {
            // A half-written file would block a retry with the same name.
            if path.exists() {
                if let Err(io) = fs::remove_file(&path) {
                    warn!("Could not remove partial database {}: {}", path.display(), io);
                }
            }
            return Err(e);
        }

        info!("Created database {} at {}", db_name, path.display());
        Ok(())
    }

    /// Whether a table with exactly this name exists in the current database.
    pub fn table_exists(&self, table: &str) -> Result<bool> {
        table_exists(self.connection()?, table)
    }

    /// Creates a table from its descriptor.
    pub fn create_table(&self, spec: &TableSpec) -> Result<()> {
        let sql = spec.create_statement()?;
        QueryExecutor::new(self.connection()?).execute(&sql, [])?;
        info!("Created table {}", spec.name);
        Ok(())
    }

    /// `ALTER TABLE <table> ADD <column> <type>`
    pub fn add_column(&self, table: &str, column: &str, data_type: &str) -> Result<()> {
        let conn = self.require_table(table)?;
        check_identifier(column)?;
        QueryExecutor::new(conn).execute(
            &format!("ALTER TABLE {} ADD {} {}", table, column, data_type.trim()),
            [],
        )?;
        info!("Added column {}.{}", table, column);
        Ok(())
    }

    /// `ALTER TABLE <table> DROP COLUMN <column>`
    pub fn delete_column(&self, table: &str, column: &str) -> Result<()> {
        let conn = self.require_table(table)?;
        check_identifier(column)?;
        QueryExecutor::new(conn)
            .execute(&format!("ALTER TABLE {} DROP COLUMN {}", table, column), [])?;
        info!("Dropped column {}.{}", table, column);
        Ok(())
    }

    /// `DROP TABLE <table>`
    pub fn delete_table(&self, table: &str) -> Result<()> {
        let conn = self.require_table(table)?;
        QueryExecutor::new(conn).execute(&format!("DROP TABLE {}", table), [])?;
        info!("Dropped table {}", table);
        Ok(())
    }

    /// Column names of a table in declaration order, read from a zero-row select.
    pub fn column_names(&self, table: &str) -> Result<Vec<String>> {
        let conn = self.require_table(table)?;
        QueryExecutor::new(conn).column_names(&format!("SELECT * FROM {} WHERE 1=0", table))
    }

    /// Declared type of one column, fetched from the catalog on every call.
    ///
    /// # Errors
    ///
    /// `CrudError::Statement` when the table has no such column.
    pub fn column_type(&self, table: &str, column: &str) -> Result<String> {
        column_type(self.connection()?, table, column)?.ok_or_else(|| {
            CrudError::Statement(format!(
                "Column '{}' not found in table '{}'.",
                column, table
            ))
        })
    }

    /// Existence guard shared by every table and row operation.
    pub(crate) fn require_table(&self, table: &str) -> Result<&Connection> {
        check_identifier(table)?;
        let conn = self.connection()?;
        if table_exists(conn, table)? {
            Ok(conn)
        } else {
            Err(CrudError::TableNotFound(table.to_string()))
        }
    }
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn column_type(conn: &Connection, table: &str, column: &str) -> Result<Option<String>> {
    let declared = conn
        .query_row(
            "SELECT type FROM pragma_table_info(?1) WHERE name = ?2",
            [table, column],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(declared)
}
