//! Provider error types.

use forecast_core::{DatabaseError, RusqliteErrorExt};
use thiserror::Error;

/// Errors that can occur while serving a provider call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The URI does not match a known shape, or the operation is not allowed
    /// on the matched resource kind.
    #[error("Unsupported resource: {0}")]
    UnsupportedResource(String),

    /// The store rejected the call.
    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),

    /// A value or column name was rejected before reaching the store.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// The blocking task running a store call did not complete.
    #[error("Provider task failed: {0}")]
    Task(String),
}

impl ProviderError {
    /// Create an unsupported-resource error for `uri`.
    pub fn unsupported(uri: impl std::fmt::Display) -> Self {
        Self::UnsupportedResource(format!("Unknown uri = {}", uri))
    }

    /// Create an invalid-value error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidValue(message.into())
    }

    /// Create a storage error that did not originate in SQLite.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(DatabaseError::QueryFailed(message.into()))
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            ProviderError::UnsupportedResource(_) => "That weather resource does not exist.",
            ProviderError::Storage(e) => e.user_message(),
            ProviderError::InvalidValue(_) => "A weather value is invalid. Check the input.",
            ProviderError::Task(_) => "The weather request was interrupted. Please try again.",
        }
    }
}

impl From<rusqlite::Error> for ProviderError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.into_database_error())
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
