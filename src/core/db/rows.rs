//! Row Operations Module
//!
//! Insert, update, delete and read-back of table rows. Data values are
//! always bound as parameters. `WHERE` conditions are operator-trusted SQL
//! and are interpolated exactly as entered.

use super::connection::Session;
use super::query::{QueryExecutor, QueryResult};
use crate::core::ident::check_identifier;
use crate::core::{CrudError, Result};
use rusqlite::params_from_iter;
use tracing::info;

impl Session {
    /// Inserts one row, binding `values` positionally to `columns`.
    ///
    /// Values are not validated here; the interactive insert checks each one
    /// against the catalog before calling this.
    pub fn insert_row(&self, table: &str, columns: &[String], values: &[String]) -> Result<()> {
        let conn = self.require_table(table)?;
        if columns.len() != values.len() {
            return Err(CrudError::Validation(format!(
                "Expected {} values for table '{}', got {}.",
                columns.len(),
                table,
                values.len()
            )));
        }
        for column in columns {
            check_identifier(column)?;
        }

        let placeholders = (1..=values.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            placeholders
        );
        QueryExecutor::new(conn).execute(&sql, params_from_iter(values.iter()))?;
        Ok(())
    }

    /// `UPDATE <table> SET <column> = ? WHERE <condition>` with the new value bound.
    ///
    /// # Returns
    ///
    /// The number of rows the condition matched.
    pub fn update_data(
        &self,
        table: &str,
        column: &str,
        new_value: &str,
        condition: &str,
    ) -> Result<usize> {
        let conn = self.require_table(table)?;
        check_identifier(column)?;
        let sql = format!("UPDATE {} SET {} = ?1 WHERE {}", table, column, condition);
        let changed = QueryExecutor::new(conn).execute(&sql, [new_value])?;
        info!("Updated {} row(s) in {}", changed, table);
        Ok(changed)
    }

    /// `DELETE FROM <table> WHERE <condition>`
    ///
    /// # Returns
    ///
    /// The number of rows deleted.
    pub fn delete_row(&self, table: &str, condition: &str) -> Result<usize> {
        let conn = self.require_table(table)?;
        let sql = format!("DELETE FROM {} WHERE {}", table, condition);
        let changed = QueryExecutor::new(conn).execute(&sql, [])?;
        info!("Deleted {} row(s) from {}", changed, table);
        Ok(changed)
    }

    /// Reads rows back as display strings, optionally filtered by a condition.
    pub fn fetch_rows(&self, table: &str, condition: Option<&str>) -> Result<QueryResult> {
        let conn = self.require_table(table)?;
        let sql = match condition {
            Some(condition) => format!("SELECT * FROM {} WHERE {}", table, condition),
            None => format!("SELECT * FROM {}", table),
        };
        QueryExecutor::new(conn).query(&sql, [])
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{CrudError, ErrorKind};
    use crate::test_utils::{insert_employees, ServerFixture};

    #[test]
    fn test_insert_and_fetch() {
        let fixture = ServerFixture::with_employees().unwrap();
        insert_employees(&fixture.session, &[("1", "Alice", "50000.0")]).unwrap();

        let result = fixture.session.fetch_rows("Employees", None).unwrap();
        assert_eq!(result.columns, vec!["id", "name", "salary"]);
        assert_eq!(result.row_count, 1);
        assert_eq!(result.rows[0], vec!["1", "Alice", "50000"]);
    }

    #[test]
    fn test_insert_binds_values() {
        let fixture = ServerFixture::with_employees().unwrap();
        insert_employees(&fixture.session, &[("2", "O'Brien'); DROP TABLE Employees; --", "1")])
            .unwrap();

        assert!(fixture.session.table_exists("Employees").unwrap());
        let result = fixture.session.fetch_rows("Employees", Some("id = 2")).unwrap();
        assert_eq!(result.rows[0][1], "O'Brien'); DROP TABLE Employees; --");
    }

    #[test]
    fn test_insert_value_count_mismatch() {
        let fixture = ServerFixture::with_employees().unwrap();
        let columns = fixture.session.column_names("Employees").unwrap();
        let err = fixture
            .session
            .insert_row("Employees", &columns, &["1".to_string()])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_update_only_matching_rows() {
        let fixture = ServerFixture::with_employees().unwrap();
        insert_employees(
            &fixture.session,
            &[("1", "Alice", "50000.0"), ("2", "Carol", "61000.5")],
        )
        .unwrap();

        let changed = fixture
            .session
            .update_data("Employees", "name", "Bob", "id = 1")
            .unwrap();
        assert_eq!(changed, 1);

        let rows = fixture.session.fetch_rows("Employees", Some("1=1 ORDER BY id")).unwrap().rows;
        assert_eq!(rows[0][1], "Bob");
        assert_eq!(rows[1][1], "Carol");
    }

    #[test]
    fn test_delete_row() {
        let fixture = ServerFixture::with_employees().unwrap();
        insert_employees(
            &fixture.session,
            &[("1", "Alice", "1"), ("2", "Carol", "2"), ("3", "Dan", "3")],
        )
        .unwrap();

        assert_eq!(fixture.session.delete_row("Employees", "id >= 2").unwrap(), 2);
        let result = fixture.session.fetch_rows("Employees", None).unwrap();
        assert_eq!(result.row_count, 1);
        assert_eq!(result.rows[0][1], "Alice");
    }

    #[test]
    fn test_bad_condition_is_statement_error() {
        let fixture = ServerFixture::with_employees().unwrap();
        let err = fixture.session.delete_row("Employees", "no_such_column = 1").unwrap_err();
        assert!(matches!(err, CrudError::Database(_)));
        assert_eq!(err.kind(), ErrorKind::Statement);
    }

    #[test]
    fn test_row_operations_on_missing_table() {
        let fixture = ServerFixture::database("company").unwrap();
        let session = &fixture.session;

        assert!(matches!(
            session.update_data("Ghost", "name", "Bob", "id = 1"),
            Err(CrudError::TableNotFound(_))
        ));
        assert!(matches!(
            session.delete_row("Ghost", "id = 1"),
            Err(CrudError::TableNotFound(_))
        ));
        assert!(matches!(
            session.insert_row("Ghost", &[], &[]),
            Err(CrudError::TableNotFound(_))
        ));
        assert!(!session.table_exists("Ghost").unwrap());
    }
}
