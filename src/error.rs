//! Error types for tower-rw-scope
//!
//! Request-level authentication and authorization failures live in
//! [`OAuthError`](crate::oauth::OAuthError). This module covers everything
//! that goes wrong while *building* the middleware: bad scope names and
//! invalid configuration.

/// Boxed error type used by services wrapped with the layers in this crate.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// tower-rw-scope error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn invalid_scope(name: impl Into<String>) -> Self {
        Error::InvalidScope(name.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }
}

/// Result type alias for tower-rw-scope
pub type Result<T> = std::result::Result<T, Error>;
