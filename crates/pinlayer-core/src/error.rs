//! Error types for pinlayer-core

use thiserror::Error;

/// Result type alias using pinlayer-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in pinlayer-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport error talking to the remote table
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote table rejected the request
    #[error("Backend error: {0}")]
    Api(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Comment not found
    #[error("Comment not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Import document was rejected
    #[error("Invalid comment file: {0}")]
    Import(String),

    /// Missing or inconsistent configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
