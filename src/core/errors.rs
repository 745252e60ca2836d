/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export arena and pool errors from the memory module
pub use crate::memory::{ArenaError, PoolError};

// Re-export codec errors from the serialization module
pub use crate::serialization::SerializationError;

/// Configuration result
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Configuration errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ConfigError {
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(
        code(config::invalid_value),
        help("Check the value against the documented bounds for this setting.")
    )]
    InvalidValue { field: String, reason: String },

    #[error("Failed to parse environment variable {var}={value}: {reason}")]
    #[diagnostic(
        code(config::env_parse),
        help("Unset the variable to fall back to the default, or fix its value.")
    )]
    EnvParse {
        var: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Unified error type with miette diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum CatenaError {
    #[error("Arena error: {0}")]
    #[diagnostic(transparent)]
    Arena(#[from] ArenaError),

    #[error("Pool error: {0}")]
    #[diagnostic(transparent)]
    Pool(#[from] PoolError),

    #[error("Configuration error: {0}")]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    #[diagnostic(transparent)]
    Serialization(#[from] SerializationError),
}

/// Result type for catena operations
pub type Result<T> = std::result::Result<T, CatenaError>;

/// Serializable error representation for API responses and structured logs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SerializableError {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl SerializableError {
    /// Create a new serializable error
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Create a new serializable error with details
    pub fn with_details(
        error_type: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }
}

impl From<&CatenaError> for SerializableError {
    fn from(err: &CatenaError) -> Self {
        let error_type = match err {
            CatenaError::Arena(_) => "arena_error",
            CatenaError::Pool(_) => "pool_error",
            CatenaError::Config(_) => "configuration_error",
            CatenaError::Serialization(_) => "serialization_error",
        };
        match err {
            CatenaError::Serialization(inner) => SerializableError::with_details(
                error_type,
                err.to_string(),
                inner.format_name(),
            ),
            _ => SerializableError::new(error_type, err.to_string()),
        }
    }
}

impl From<CatenaError> for SerializableError {
    fn from(err: CatenaError) -> Self {
        SerializableError::from(&err)
    }
}
