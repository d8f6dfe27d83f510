//! Error types for gamemail
//!
//! Every fallible operation in the crate returns [`Result`]. The mail store's
//! boundary methods log these errors and fall back to empty results; the
//! `try_*` variants hand them to the caller unchanged.

use thiserror::Error;

/// Result type alias for gamemail operations
pub type Result<T> = std::result::Result<T, GameMailError>;

/// Error type for gamemail operations
#[derive(Error, Debug)]
pub enum GameMailError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// SQLite statement errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Connection pool errors (pool build or checkout timeout)
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl GameMailError {
    /// True for errors that come from the backing store rather than the caller
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            GameMailError::Database(_) | GameMailError::Pool(_) | GameMailError::Io(_)
        )
    }
}
