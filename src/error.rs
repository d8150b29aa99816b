//! ctxguard error types.
//!
//! Errors only surface while building things: loading configuration,
//! validating a scoring policy, compiling a pattern registry. Validating
//! content never fails; every input yields a well-formed
//! [`SecurityValidationResult`](crate::security::SecurityValidationResult).

use thiserror::Error;

/// ctxguard errors.
#[derive(Error, Debug)]
pub enum GuardError {
    /// Configuration error (unreadable file, bad value, broken policy).
    #[error("Config error: {0}")]
    Config(String),

    /// A pattern definition was rejected while building a registry.
    #[error("Invalid pattern '{id}': {reason}")]
    InvalidPattern {
        /// Identifier of the offending pattern.
        id: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Result type alias for ctxguard operations
pub type Result<T> = std::result::Result<T, GuardError>;

impl From<toml::de::Error> for GuardError {
    fn from(err: toml::de::Error) -> Self {
        GuardError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for GuardError {
    fn from(err: toml::ser::Error) -> Self {
        GuardError::Config(err.to_string())
    }
}
