// Error types for customer operations

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Error type for the customer store
#[derive(Debug, Error)]
pub enum CustomerError {
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Customer not found: {0}")]
    NotFound(i32),

    #[error("Customer with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<validator::ValidationErrors> for CustomerError {
    fn from(err: validator::ValidationErrors) -> Self {
        CustomerError::ValidationError(err.to_string())
    }
}

impl IntoResponse for CustomerError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            CustomerError::ValidationError(_) => (StatusCode::BAD_REQUEST, "Validation error"),
            CustomerError::NotFound(_) => (StatusCode::NOT_FOUND, "Customer not found"),
            CustomerError::DuplicateEmail(_) => (StatusCode::CONFLICT, "Duplicate email"),
            CustomerError::DatabaseError(ref e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "details": self.to_string(),
        }));

        (status, body).into_response()
    }
}
