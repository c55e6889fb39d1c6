// Customer domain models and DTOs
// The customer record carries the spendable store-credit balance; the
// debit trail is append-only and reconciles against it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Customer record as stored in the database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Current spendable store credit
    pub credit_balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One store-credit debit, written at checkout commit
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CreditDebit {
    pub id: Uuid,
    pub customer_id: i32,
    pub amount: Decimal,
    pub transaction_id: String,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for creating a customer
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Opening credit balance; defaults to zero
    pub credit_balance: Option<Decimal>,
}

/// Request DTO for updating a customer
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Request DTO for topping up store credit
#[derive(Debug, Clone, Deserialize)]
pub struct AddCreditRequest {
    pub amount: Decimal,
}

/// Response DTO for the credit endpoint: balance plus the debit trail
#[derive(Debug, Serialize)]
pub struct CreditHistoryResponse {
    pub customer_id: i32,
    pub balance: Decimal,
    pub debits: Vec<CreditDebit>,
}
