//! Auth errors

use thiserror::Error;
use warden_types::FieldErrors;

use crate::crypto::KeyError;
use crate::permission::PermissionError;

/// Authentication and authorization errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Missing, invalid or expired credential, or a rejected login round-trip
    #[error("unauthorized")]
    Unauthorized,

    /// Authenticated, but lacking the required permission scopes
    #[error("insufficient permissions")]
    Forbidden { required: Vec<String> },

    /// Malformed input, with field-level messages
    #[error("validation failed")]
    Validation(#[from] FieldErrors),

    /// Requested record does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Record already exists
    #[error("conflict: {0}")]
    Conflict(String),

    /// Identity provider call failed
    #[error("identity provider error: {0}")]
    Provider(String),

    /// User store call failed
    #[error("store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::Forbidden { .. } => 403,
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Provider(_) => 502,
            Self::Store(_) | Self::Configuration(_) | Self::Internal(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Provider(_) => "PROVIDER_ERROR",
            Self::Store(_) => "STORE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the error is the caller's fault rather than ours
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }

    /// Build a single-field validation error
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        Self::Validation(errors)
    }
}

impl From<warden_db::DbError> for AuthError {
    fn from(err: warden_db::DbError) -> Self {
        match err {
            warden_db::DbError::NotFound => Self::NotFound("user".to_string()),
            warden_db::DbError::Conflict(subject) => Self::Conflict(subject),
            other => {
                tracing::error!("Store error: {}", other);
                Self::Store(other.to_string())
            }
        }
    }
}

impl From<KeyError> for AuthError {
    fn from(err: KeyError) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl From<PermissionError> for AuthError {
    fn from(err: PermissionError) -> Self {
        Self::Configuration(err.to_string())
    }
}
