//! Error types for the handler cache.
//!

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HandlerCacheError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Handler creation failed for {key}: {reason}")]
    CreationFailed { key: String, reason: String },
    #[error("Dispose failed for {key}: {reason}")]
    DisposeFailed { key: String, reason: String },
    #[error("{} handler(s) failed to dispose during teardown", .0.len())]
    TeardownFailed(Vec<HandlerCacheError>),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl HandlerCacheError {
    /// Convenience constructor for handler implementations reporting a dispose failure
    pub fn dispose_failed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        HandlerCacheError::DisposeFailed {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Convenience constructor for constructors reporting a creation failure
    pub fn creation_failed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        HandlerCacheError::CreationFailed {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl From<::config::ConfigError> for HandlerCacheError {
    fn from(error: ::config::ConfigError) -> Self {
        HandlerCacheError::ConfigurationError(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HandlerCacheError>;
