pub mod health;
pub mod resources;

use crate::error::AppError;

/// Fallback for paths no route matches.
pub async fn not_found() -> AppError {
    AppError::NotFound("Not Found".into())
}

/// Fallback for known paths requested with an unsupported method.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed("Method Not Allowed".into())
}
