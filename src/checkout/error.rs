// Error types for the checkout endpoints

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::discounts::error::DiscountError;

/// Error type for quote/commit requests
///
/// Engine errors keep their own HTTP mapping; only request-shape problems
/// are added here. Ineligibility never appears as an error at this level —
/// it travels inside the quote response body.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Engine(#[from] DiscountError),
}

impl From<validator::ValidationErrors> for CheckoutError {
    fn from(err: validator::ValidationErrors) -> Self {
        CheckoutError::ValidationError(err.to_string())
    }
}

impl IntoResponse for CheckoutError {
    fn into_response(self) -> Response {
        match self {
            CheckoutError::ValidationError(details) => {
                let body = Json(json!({
                    "error": "Validation error",
                    "details": details,
                }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            CheckoutError::Engine(inner) => inner.into_response(),
        }
    }
}
