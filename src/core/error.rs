//! sqlcrud Error Module
//!
//! Every fallible operation in the crate returns `CrudError`. The variants
//! follow the three failure classes an operator can hit (connection,
//! statement, input validation) plus the guards the session enforces before
//! any SQL reaches the driver.
use thiserror::Error;

/// Comprehensive error type for sqlcrud.
#[derive(Error, Debug)]
pub enum CrudError {
    /// The driver rejected the connection string or the server is unreachable
    #[error("Error connecting: {0}")]
    Connection(String),

    /// No connection has been established yet
    #[error("Not connected to a server or database")]
    NotConnected,

    /// Statement execution failures reported by SQLite
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Statement failures detected before or around execution
    #[error("Statement error: {0}")]
    Statement(String),

    /// Existence guard failed for the named table
    #[error("Table '{0}' does not exist.")]
    TableNotFound(String),

    /// A database, table or column name outside the allowed character set
    #[error("Invalid identifier '{0}': use letters, digits and underscores, not starting with a digit")]
    InvalidIdentifier(String),

    /// A value that does not fit its column's declared type
    #[error("{0}")]
    Validation(String),

    /// Non-numeric answer to the row count prompt
    #[error("Invalid number of rows '{0}'.")]
    InvalidRowCount(String),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parse errors for the configuration file
    #[error("Configuration error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Console and file system errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a `CrudError`, for callers that branch on the
/// cause rather than the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connection,
    Statement,
    Validation,
    Config,
    Io,
}

impl CrudError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CrudError::Connection(_) | CrudError::NotConnected => ErrorKind::Connection,
            CrudError::Database(_) | CrudError::Statement(_) | CrudError::TableNotFound(_) => {
                ErrorKind::Statement
            }
            CrudError::InvalidIdentifier(_)
            | CrudError::Validation(_)
            | CrudError::InvalidRowCount(_) => ErrorKind::Validation,
            CrudError::Config(_) | CrudError::Toml(_) => ErrorKind::Config,
            CrudError::Io(_) => ErrorKind::Io,
        }
    }
}

/// Type alias for Result to use CrudError as the error type.
pub type Result<T> = std::result::Result<T, CrudError>;
