//! Error type shared by the showlist crates

use thiserror::Error;

/// Result alias over [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Storage, configuration and validation failures
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite query, connection or transaction failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem failure, e.g. creating the root folder
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file unreadable or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Value rejected before use (stored provenance, lock threshold)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Stored data that cannot be decoded
    #[error("Internal error: {0}")]
    Internal(String),
}
