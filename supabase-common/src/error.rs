//! Error types for the admin gateway

use thiserror::Error;

/// Gateway error types
#[derive(Error, Debug)]
pub enum Error {
    // Request Errors
    #[error("{0}")]
    MissingField(&'static str),

    #[error("{0}")]
    ValidationError(String),

    #[error("Invalid SQL fragment in '{field}': {reason}")]
    InvalidSqlFragment { field: &'static str, reason: String },

    #[error("{0}")]
    Forbidden(String),

    // Remote Errors
    /// The platform answered with an error status
    #[error("{message}")]
    Remote {
        status: u16,
        message: String,
        hint: Option<String>,
    },

    /// The platform could not be reached or answered garbage
    #[error("Transport error: {0}")]
    Transport(String),

    // General Errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a remote error from a platform message
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
            hint: None,
        }
    }

    /// Attach a caller-facing hint to a remote error; other variants pass through
    #[must_use]
    pub fn with_hint(self, text: impl Into<String>) -> Self {
        match self {
            Self::Remote {
                status, message, ..
            } => Self::Remote {
                status,
                message,
                hint: Some(text.into()),
            },
            other => other,
        }
    }

    /// HTTP status code returned to the caller
    pub fn status_code(&self) -> u16 {
        match self {
            // Remote failures are reported as bad requests, echoing the platform
            Self::MissingField(_)
            | Self::ValidationError(_)
            | Self::InvalidSqlFragment { .. }
            | Self::Remote { .. } => 400,

            Self::Forbidden(_) => 403,

            Self::Transport(_)
            | Self::ConfigError(_)
            | Self::IoError(_)
            | Self::JsonError(_) => 500,
        }
    }

    /// Stable error code for logs and clients
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "missing_field",
            Self::ValidationError(_) => "validation_error",
            Self::InvalidSqlFragment { .. } => "invalid_sql_fragment",
            Self::Forbidden(_) => "forbidden",
            Self::Remote { .. } => "remote_error",
            Self::Transport(_) => "transport_error",
            Self::ConfigError(_) => "config_error",
            Self::IoError(_) => "io_error",
            Self::JsonError(_) => "json_error",
        }
    }

    /// Hint attached to a remote error, if any
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Remote { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }
}
