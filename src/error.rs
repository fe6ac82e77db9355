//! Error types for the token sweeper

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the token sweeper
#[derive(Error, Debug)]
pub enum Error {
    // Batch-fatal sweep errors
    #[error("Invalid sweep request: {0}")]
    InvalidRequest(String),

    #[error("Sweep already in progress (reentrant call rejected)")]
    Reentrant,

    // Configuration errors
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid keypair: {0}")]
    InvalidKeypair(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Check if this error aborts a whole sweep batch
    pub fn is_batch_fatal(&self) -> bool {
        matches!(self, Error::InvalidRequest(_) | Error::Reentrant)
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

// Conversion from I/O errors
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}
