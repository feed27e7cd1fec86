//! Error types shared across the carga workspace

use thiserror::Error;

/// Result type alias for carga operations
pub type Result<T> = std::result::Result<T, CargaError>;

/// Main error type for carga
#[derive(Error, Debug)]
pub enum CargaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl CargaError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a database error from any displayable source
    pub fn database(message: impl std::fmt::Display) -> Self {
        Self::Database(message.to_string())
    }
}
