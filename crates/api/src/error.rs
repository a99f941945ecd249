use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use catalog_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Client errors render as `{"error_message", "error_reason"}`; storage
/// faults are logged and answered with a bare 500.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `catalog_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A bad request with a human-readable message.
    #[error("{0}")]
    BadRequest(String),

    /// No route matched the request path.
    #[error("{0}")]
    NotFound(String),

    /// The path exists but not for this method.
    #[error("{0}")]
    MethodNotAllowed(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Core(CoreError::Validation(_)) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Core(CoreError::NotFound { .. }) | AppError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::Core(CoreError::Conflict { .. }) => StatusCode::CONFLICT,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Core(CoreError::Store(err)) => {
                tracing::error!(error = %err, "Storage error");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        let message = self.to_string();
        if status == StatusCode::BAD_REQUEST {
            tracing::warn!(error = %message, "Rejected request");
        }

        let body = json!({
            "error_message": message,
            "error_reason": status.canonical_reason().unwrap_or_default(),
        });

        (status, axum::Json(body)).into_response()
    }
}
