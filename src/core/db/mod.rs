/// Database Module
///
/// All SQL the tool issues goes through a `Session`, which owns the single
/// live connection.
///
/// ## Architecture
///
/// - **Connection Management** (`connection.rs`): connection strings, opening and
///   replacing the session's connection
/// - **Schema Operations** (`schema.rs`): databases, tables, columns and catalog lookups
/// - **Row Operations** (`rows.rs`): insert, update, delete and read-back of rows
/// - **Query Execution** (`query.rs`): statement execution, logging and result formatting
///
/// ## Error Handling
///
/// All database operations return `CrudError`; nothing is printed here.
pub mod connection;
pub mod query;
pub mod rows;
pub mod schema;

pub use connection::*;
pub use query::*;
pub use schema::*;
