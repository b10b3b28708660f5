/// Core Module for sqlcrud
///
/// Shared infrastructure used by the shell: the session and its SQL
/// operations, error types, identifier checks and value validation.

pub mod db;
pub mod error;
pub mod ident;
pub mod validate;

// Re-export commonly used types for convenience
pub use error::{CrudError, ErrorKind, Result};
