//! # Test Utilities Module
//!
//! Fixtures shared by the unit tests: a throwaway data directory acting as
//! the server, and a session already connected to a database inside it.

use crate::config::ServerConfig;
use crate::core::db::{ColumnSpec, Session, TableSpec};
use crate::core::Result;
use tempfile::TempDir;

/// A temporary server with one connected database.
pub struct ServerFixture {
    /// Held so the directory outlives the session
    pub dir: TempDir,
    pub session: Session,
}

impl ServerFixture {
    /// Creates a data directory and connects at server level.
    pub fn server() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let config = ServerConfig {
            server: dir.path().to_string_lossy().into_owned(),
            ..ServerConfig::default()
        };
        let mut session = Session::new(config);
        session.connect_to_server()?;
        Ok(ServerFixture { dir, session })
    }

    /// Creates the named database and connects to it.
    pub fn database(name: &str) -> Result<Self> {
        let mut fixture = Self::server()?;
        fixture.session.create_database(name)?;
        fixture.session.connect_to_db(name)?;
        Ok(fixture)
    }

    /// Database with an empty `Employees (id INT, name VARCHAR(50), salary FLOAT)` table.
    pub fn with_employees() -> Result<Self> {
        let fixture = Self::database("company")?;
        fixture.session.create_table(&employees_spec())?;
        Ok(fixture)
    }
}

pub fn employees_spec() -> TableSpec {
    TableSpec::new(
        "Employees",
        vec![
            ColumnSpec::new("id", "INT"),
            ColumnSpec::new("name", "VARCHAR(50)"),
            ColumnSpec::new("salary", "FLOAT"),
        ],
    )
}

/// Inserts `(id, name, salary)` rows into the `Employees` table.
pub fn insert_employees(session: &Session, rows: &[(&str, &str, &str)]) -> Result<()> {
    let columns = session.column_names("Employees")?;
    for (id, name, salary) in rows {
        let values = vec![id.to_string(), name.to_string(), salary.to_string()];
        session.insert_row("Employees", &columns, &values)?;
    }
    Ok(())
}
