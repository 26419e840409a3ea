use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Stable error codes. Clients match on `code`, never on `message`.
pub mod error_code {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const CONFLICT: &str = "CONFLICT";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    pub const INTERNAL: &str = "INTERNAL";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
}

/// The one error every HTTP handler returns.
///
/// Module errors (`AuthError`, `IsaError`) convert into it with `From`.
/// It renders as
///
/// ```json
/// {"code": "CONFLICT", "message": "investigation 'abc' still has 2 studies"}
/// ```
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    /// Duplicate key, or existing children blocking a delete.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    /// No credentials, or the caller does not own the addressed account.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but the policy denies the action.
    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    Storage(String),

    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    fn classify(&self) -> (&'static str, StatusCode) {
        use error_code::*;
        match self {
            ServiceError::NotFound(_) => (NOT_FOUND, StatusCode::NOT_FOUND),
            ServiceError::Conflict(_) => (CONFLICT, StatusCode::CONFLICT),
            ServiceError::Validation(_) => (VALIDATION_FAILED, StatusCode::BAD_REQUEST),
            ServiceError::Unauthorized(_) => (UNAUTHENTICATED, StatusCode::UNAUTHORIZED),
            ServiceError::PermissionDenied(_) => (PERMISSION_DENIED, StatusCode::FORBIDDEN),
            ServiceError::Storage(_) => (STORAGE_ERROR, StatusCode::INTERNAL_SERVER_ERROR),
            ServiceError::Internal(_) => (INTERNAL, StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    pub fn error_code(&self) -> &'static str {
        self.classify().0
    }

    pub fn status_code(&self) -> StatusCode {
        self.classify().1
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (code, status) = self.classify();
        if status.is_server_error() {
            tracing::error!(code = code, "{}", self);
        }
        let body = serde_json::json!({
            "code": code,
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
