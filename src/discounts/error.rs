// Error types for the discount engine
// Covers rule validation, lookup, and ledger commit failures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Main error type for the discount engine
///
/// Note that ineligibility is NOT an error: an ineligible discount degrades
/// into a `discount_error` string in the quote response (the checkout flow
/// proceeds without the adjustment). These variants are the genuinely
/// failing paths: bad rule definitions, missing records, and ledger
/// conflicts at commit time.
#[derive(Debug, Error)]
pub enum DiscountError {
    /// Malformed rule definition rejected at creation/update time
    #[error("Invalid discount definition: {0}")]
    InvalidDefinition(String),

    /// Discount not found by ID
    #[error("Discount not found: {0}")]
    NotFound(Uuid),

    /// Discount not found by public code
    #[error("Discount code not found: {0}")]
    CodeNotFound(String),

    /// Another discount already uses this code
    #[error("Discount code already in use: {0}")]
    DuplicateCode(String),

    /// Commit-time re-check failed: a concurrent checkout consumed the
    /// remaining usage allowance between quote and commit. Retryable —
    /// the caller must recompute the quote, not retry the commit blindly.
    #[error("Discount no longer available: {0}")]
    NoLongerAvailable(String),

    /// Credit balance was insufficient at commit time
    #[error("Insufficient credit balance for customer {customer_id}")]
    InsufficientCredit { customer_id: i32 },

    /// Customer referenced by the cart does not exist
    #[error("Customer not found: {0}")]
    CustomerNotFound(i32),

    /// Database operation errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// JSON errors when reading rule sub-objects from JSONB
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for discount engine operations
pub type DiscountResult<T> = Result<T, DiscountError>;

impl From<validator::ValidationErrors> for DiscountError {
    fn from(err: validator::ValidationErrors) -> Self {
        DiscountError::InvalidDefinition(err.to_string())
    }
}

impl IntoResponse for DiscountError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            DiscountError::InvalidDefinition(_) => (StatusCode::BAD_REQUEST, "Invalid discount"),
            DiscountError::NotFound(_) => (StatusCode::NOT_FOUND, "Discount not found"),
            DiscountError::CodeNotFound(_) => (StatusCode::NOT_FOUND, "Discount code not found"),
            DiscountError::DuplicateCode(_) => (StatusCode::CONFLICT, "Duplicate discount code"),
            DiscountError::NoLongerAvailable(_) => {
                (StatusCode::CONFLICT, "Discount no longer available")
            }
            DiscountError::InsufficientCredit { .. } => {
                (StatusCode::CONFLICT, "Insufficient credit")
            }
            DiscountError::CustomerNotFound(_) => (StatusCode::NOT_FOUND, "Customer not found"),
            DiscountError::DatabaseError(ref e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error")
            }
            DiscountError::JsonError(_) => (StatusCode::BAD_REQUEST, "JSON parsing error"),
        };

        let body = Json(json!({
            "error": error_message,
            "details": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = DiscountError::InvalidDefinition("value must be positive".to_string());
        assert_eq!(
            error.to_string(),
            "Invalid discount definition: value must be positive"
        );

        let error = DiscountError::NoLongerAvailable("maximum usage limit reached".to_string());
        assert_eq!(
            error.to_string(),
            "Discount no longer available: maximum usage limit reached"
        );

        let error = DiscountError::InsufficientCredit { customer_id: 7 };
        assert_eq!(
            error.to_string(),
            "Insufficient credit balance for customer 7"
        );
    }

    #[test]
    fn test_error_from_sqlx() {
        let sqlx_error = sqlx::Error::RowNotFound;
        let err: DiscountError = sqlx_error.into();
        assert!(matches!(err, DiscountError::DatabaseError(_)));
    }

    #[test]
    fn test_error_from_validator() {
        let errors = validator::ValidationErrors::new();
        let err: DiscountError = errors.into();
        assert!(matches!(err, DiscountError::InvalidDefinition(_)));
    }
}
