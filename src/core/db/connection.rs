//! Connection Management Module
//!
//! Builds connection strings from configuration and holds the one
//! connection a session works through.
//!
//! The SQLite driver reads a connection string this way: `SERVER` is a data
//! directory, `DATABASE` names the file `<SERVER>/<DATABASE>.<extension>`,
//! and a connection without `DATABASE` is an in-memory server connection.
//! `TRUSTED_CONNECTION` is carried through untouched.
use crate::config::ServerConfig;
use crate::core::ident::is_identifier;
use crate::core::{CrudError, Result};
use rusqlite::Connection;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Parsed form of `DRIVER=..;SERVER=..;DATABASE=..;TRUSTED_CONNECTION=..`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub driver: String,
    pub server: String,
    pub database: Option<String>,
    pub trusted_connection: String,
}

impl ConnectionString {
    /// Connection string for the server itself, with no database selected.
    pub fn for_server(config: &ServerConfig) -> Self {
        ConnectionString {
            driver: config.driver.clone(),
            server: config.server.clone(),
            database: None,
            trusted_connection: config.trusted_connection.clone(),
        }
    }

    /// Connection string for one database on the configured server.
    pub fn for_database(config: &ServerConfig, database: &str) -> Self {
        ConnectionString {
            database: Some(database.to_string()),
            ..ConnectionString::for_server(config)
        }
    }

    /// Parses `KEY=VALUE` pairs separated by `;`. Keys are case-insensitive;
    /// `DRIVER` and `SERVER` are required.
    pub fn parse(input: &str) -> Result<Self> {
        let mut driver = None;
        let mut server = None;
        let mut database = None;
        let mut trusted_connection = None;

        for part in input.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part.split_once('=').ok_or_else(|| {
                CrudError::Connection(format!("malformed connection string segment '{}'", part))
            })?;
            let value = value.trim().to_string();
            match key.trim().to_uppercase().as_str() {
                "DRIVER" => driver = Some(value),
                "SERVER" => server = Some(value),
                "DATABASE" => database = Some(value),
                "TRUSTED_CONNECTION" => trusted_connection = Some(value),
                other => {
                    return Err(CrudError::Connection(format!(
                        "unknown connection string key '{}'",
                        other
                    )))
                }
            }
        }

        Ok(ConnectionString {
            driver: driver
                .ok_or_else(|| CrudError::Connection("connection string has no DRIVER".into()))?,
            server: server
                .ok_or_else(|| CrudError::Connection("connection string has no SERVER".into()))?,
            database,
            trusted_connection: trusted_connection.unwrap_or_else(|| "no".to_string()),
        })
    }
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DRIVER={};SERVER={};", self.driver, self.server)?;
        if let Some(database) = &self.database {
            write!(f, "DATABASE={};", database)?;
        }
        write!(f, "TRUSTED_CONNECTION={}", self.trusted_connection)
    }
}

/// Accepts `SQLite`, `SQLite3` and braced ODBC-style names such as
/// `{SQLite3 ODBC Driver}`.
fn check_driver(driver: &str) -> Result<()> {
    let name = driver.trim().trim_start_matches('{').trim_end_matches('}');
    if name.to_lowercase().starts_with("sqlite") {
        Ok(())
    } else {
        Err(CrudError::Connection(format!(
            "driver '{}' is not supported, expected SQLite",
            driver
        )))
    }
}

/// An operator's session: configuration plus at most one live connection.
///
/// Every schema and row operation borrows the connection held here.
/// Opening another connection closes the previous one.
#[derive(Debug)]
pub struct Session {
    config: ServerConfig,
    connection: Option<Connection>,
    database: Option<String>,
}

impl Session {
    pub fn new(config: ServerConfig) -> Self {
        Session {
            config,
            connection: None,
            database: None,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Connects to the configured server without selecting a database.
    ///
    /// # Errors
    ///
    /// `CrudError::Connection` if the driver is unsupported or the data
    /// directory does not exist. The current connection is kept on failure.
    pub fn connect_to_server(&mut self) -> Result<()> {
        let conn_str = ConnectionString::for_server(&self.config).to_string();
        let conn = self.open(&conn_str)?;
        self.replace_connection(conn, None);
        Ok(())
    }

    /// Connects to an existing database on the configured server.
    ///
    /// # Errors
    ///
    /// `CrudError::Connection` if the name is not a valid identifier or the
    /// database file is missing or is not a SQLite database. A missing
    /// database is never created here. The current connection is kept on
    /// failure.
    pub fn connect_to_db(&mut self, db_name: &str) -> Result<()> {
        let conn_str = ConnectionString::for_database(&self.config, db_name).to_string();
        let conn = self.open(&conn_str)?;
        self.replace_connection(conn, Some(db_name.to_string()));
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Name of the database the session is connected to, `None` at server level.
    pub fn current_database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// File backing the named database on the configured server.
    pub fn database_path(&self, db_name: &str) -> PathBuf {
        Path::new(&self.config.server).join(format!("{}.{}", db_name, self.config.extension))
    }

    pub(crate) fn connection(&self) -> Result<&Connection> {
        self.connection.as_ref().ok_or(CrudError::NotConnected)
    }

    /// Opens a connection the way the driver is handed one: from its
    /// rendered connection string.
    fn open(&self, conn_str: &str) -> Result<Connection> {
        debug!("Opening connection: {}", conn_str);
        let result = ConnectionString::parse(conn_str).and_then(|parsed| self.open_with(&parsed));
        match &result {
            Ok(_) => info!("Connected: {}", conn_str),
            Err(e) => info!("Connection failed for {}: {}", conn_str, e),
        }
        result
    }

    fn open_with(&self, conn_str: &ConnectionString) -> Result<Connection> {
        check_driver(&conn_str.driver)?;

        let server = Path::new(&conn_str.server);
        if !server.is_dir() {
            return Err(CrudError::Connection(format!(
                "server '{}' is not a reachable data directory",
                conn_str.server
            )));
        }

        let conn = match &conn_str.database {
            None => Connection::open_in_memory(),
            Some(db_name) => {
                if !is_identifier(db_name) {
                    return Err(CrudError::Connection(format!(
                        "invalid database name '{}'",
                        db_name
                    )));
                }
                let path = server.join(format!("{}.{}", db_name, self.config.extension));
                if !path.is_file() {
                    return Err(CrudError::Connection(format!(
                        "database '{}' does not exist on server '{}'",
                        db_name, conn_str.server
                    )));
                }
                // Default flags keep ATTACH able to create new database files.
                Connection::open(path)
            }
        }
        .map_err(|e| CrudError::Connection(e.to_string()))?;

        // SQLite reads the file lazily; touching the catalog makes a file
        // that is not a database fail here rather than on first use.
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |_| Ok(()))
            .map_err(|e| CrudError::Connection(e.to_string()))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| CrudError::Connection(e.to_string()))?;

        Ok(conn)
    }

    fn replace_connection(&mut self, conn: Connection, database: Option<String>) {
        if let Some(previous) = self.connection.take() {
            close_connection(previous);
        }
        self.connection = Some(conn);
        self.database = database;
    }
}

fn close_connection(conn: Connection) {
    if let Err((_, e)) = conn.close() {
        warn!("Failed to close previous connection cleanly: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorKind;

    fn config_for(dir: &Path) -> ServerConfig {
        ServerConfig {
            server: dir.to_string_lossy().into_owned(),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn test_connection_string_rendering() {
        let config = ServerConfig {
            driver: "{SQLite3 ODBC Driver}".to_string(),
            server: "data".to_string(),
            trusted_connection: "yes".to_string(),
            extension: "db".to_string(),
        };
        assert_eq!(
            ConnectionString::for_server(&config).to_string(),
            "DRIVER={SQLite3 ODBC Driver};SERVER=data;TRUSTED_CONNECTION=yes"
        );
        assert_eq!(
            ConnectionString::for_database(&config, "shop").to_string(),
            "DRIVER={SQLite3 ODBC Driver};SERVER=data;DATABASE=shop;TRUSTED_CONNECTION=yes"
        );
    }

    #[test]
    fn test_connection_string_parse() {
        let parsed =
            ConnectionString::parse("driver=SQLite3; SERVER=/tmp/x;Database=shop;TRUSTED_CONNECTION=no")
                .unwrap();
        assert_eq!(parsed.driver, "SQLite3");
        assert_eq!(parsed.server, "/tmp/x");
        assert_eq!(parsed.database.as_deref(), Some("shop"));
        assert_eq!(parsed.trusted_connection, "no");

        assert!(ConnectionString::parse("SERVER=x").is_err());
        assert!(ConnectionString::parse("DRIVER=SQLite;SERVER=x;PORT=1").is_err());
        assert!(ConnectionString::parse("DRIVER").is_err());
    }

    #[test]
    fn test_connect_to_server() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(config_for(dir.path()));
        assert!(!session.is_connected());

        session.connect_to_server().unwrap();
        assert!(session.is_connected());
        assert_eq!(session.current_database(), None);
    }

    #[test]
    fn test_connect_to_missing_server() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(config_for(&dir.path().join("nowhere")));
        let err = session.connect_to_server().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(!session.is_connected());
    }

    #[test]
    fn test_unsupported_driver() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(ServerConfig {
            driver: "{ODBC Driver 17 for SQL Server}".to_string(),
            ..config_for(dir.path())
        });
        match session.connect_to_server() {
            Err(CrudError::Connection(msg)) => assert!(msg.contains("not supported")),
            other => panic!("Expected Connection error, got {:?}", other),
        }
    }

    #[test]
    fn test_connect_to_missing_database_keeps_current_connection() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(config_for(dir.path()));
        session.connect_to_server().unwrap();

        let err = session.connect_to_db("missing").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(session.is_connected());
        assert_eq!(session.current_database(), None);
        assert!(!session.database_path("missing").exists());
    }

    #[test]
    fn test_connect_to_db_replaces_connection() {
        let dir = tempfile::tempdir().unwrap();
        Connection::open(dir.path().join("shop.db"))
            .unwrap()
            .execute_batch("CREATE TABLE seed (x INT);")
            .unwrap();
        let mut session = Session::new(config_for(dir.path()));
        session.connect_to_server().unwrap();

        session.connect_to_db("shop").unwrap();
        assert_eq!(session.current_database(), Some("shop"));

        session.connect_to_server().unwrap();
        assert!(session.is_connected());
        assert_eq!(session.current_database(), None);
    }

    #[test]
    fn test_connect_to_non_sqlite_file() {
        let dir = tempfile::tempdir().unwrap();
        let garbage = b"shopping list: eggs, milk, flour\n".repeat(20);
        std::fs::write(dir.path().join("notes.db"), garbage).unwrap();
        let mut session = Session::new(config_for(dir.path()));
        session.connect_to_server().unwrap();

        let err = session.connect_to_db("notes").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert_eq!(session.current_database(), None);
        assert!(session.table_exists("anything").is_ok());
    }

    #[test]
    fn test_operations_require_connection() {
        let session = Session::new(ServerConfig::default());
        assert!(matches!(session.connection(), Err(CrudError::NotConnected)));
    }
}
