use crate::core::{CrudError, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration structure parsed from a TOML file.
///
/// Every section is optional; a missing file section falls back to the
/// built-in defaults, which match a local data directory.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub shell: ShellConfig,
    pub logging: LoggingConfig,
}

/// Where and how the session connects.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Driver name placed in the connection string; must name SQLite
    pub driver: String,
    /// Data directory holding one file per database
    pub server: String,
    /// Passed through to the connection string unchanged
    pub trusted_connection: String,
    /// File extension of database files inside the data directory
    pub extension: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            driver: "SQLite3".to_string(),
            server: ".".to_string(),
            trusted_connection: "yes".to_string(),
            extension: "db".to_string(),
        }
    }
}

/// What the insert prompt does with a non-numeric row count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowCountPolicy {
    /// Print the problem and ask again
    #[default]
    Reprompt,
    /// Abandon the insert and return to the table menu
    Abort,
}

/// Interactive shell behaviour.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub invalid_row_count: RowCountPolicy,
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "warn".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Parses the configured level name (`error`, `warn`, `info`, `debug`, `trace`).
    pub fn level(&self) -> Result<tracing::Level> {
        self.level
            .parse()
            .map_err(|_| CrudError::Config(format!("unknown log level '{}'", self.level)))
    }
}

/// Loads configuration from a TOML file at the given path.
///
/// # Example
///
/// ```no_run
/// let config = sqlcrud::config::load_config("sqlcrud.toml").expect("Failed to load config");
/// println!("{:?}", config);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.logging.level()?;
    Ok(config)
}

/// Command line arguments.
#[derive(Parser, Debug, Default, PartialEq)]
#[command(
    name = "sqlcrud",
    version,
    about = "Create SQLite databases and tables and edit their rows from prompts"
)]
pub struct Args {
    /// Read settings from a TOML file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
