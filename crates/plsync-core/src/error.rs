//! Error types for prefix list synchronization
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for prefix list synchronization
#[derive(Error, Debug)]
pub enum Error {
    /// The upstream range dataset could not be fetched or parsed
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Lookup, delete or create failed for one prefix list
    #[error("Reconcile error ({name}): {message}")]
    Reconcile {
        /// Prefix list name being reconciled
        name: String,
        /// Underlying cause
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (file sources)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a fetch error
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Create a reconcile error for a named prefix list
    pub fn reconcile(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Reconcile {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error came from the upstream dataset fetch
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
