//! Error responses for the gate, guards and extractors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// JSON error body shared by every Warden endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.error.details = Some(details);
        self
    }
}

/// Gate and guard rejections.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GateError {
    /// No valid credential, or the identity could not be loaded.
    #[error("authentication required")]
    Unauthenticated,

    /// Valid identity lacking the route's scopes.
    #[error("insufficient permissions")]
    Forbidden { required: Vec<String> },

    /// User store failure while authenticating.
    #[error("internal auth error: {0}")]
    Internal(String),
}

impl GateError {
    pub fn forbidden(required: &[String]) -> Self {
        Self::Forbidden {
            required: required.to_vec(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHORIZED",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::Forbidden { required } => ErrorResponse::new(self.error_code(), self.to_string())
                .with_details(serde_json::json!({ "required": required })),
            Self::Internal(e) => {
                tracing::error!(error = %e, "Auth gate failed");
                ErrorResponse::new(self.error_code(), "internal error")
            }
            Self::Unauthenticated => ErrorResponse::new(self.error_code(), self.to_string()),
        };

        (status, Json(body)).into_response()
    }
}
