// HTTP handlers for customer management

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use validator::Validate;

use crate::customers::error::CustomerError;
use crate::customers::models::{
    AddCreditRequest, CreateCustomerRequest, CreditHistoryResponse, Customer,
    UpdateCustomerRequest,
};
use crate::customers::repository::CustomerRepository;
use crate::AppState;

/// Handler for POST /api/customers
pub async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<Customer>), CustomerError> {
    tracing::debug!("Creating customer: {}", payload.name);
    payload.validate()?;

    let opening_balance = payload.credit_balance.unwrap_or(Decimal::ZERO);
    crate::validation::validate_price(opening_balance).map_err(|_| {
        CustomerError::ValidationError("Opening credit balance must not be negative".to_string())
    })?;

    let repo = CustomerRepository::new(state.db.clone());
    let customer = repo
        .create(
            &payload.name,
            payload.email.as_deref(),
            payload.phone.as_deref(),
            opening_balance,
        )
        .await?;

    tracing::info!("Created customer {}", customer.id);
    Ok((StatusCode::CREATED, Json(customer)))
}

/// Handler for GET /api/customers
pub async fn list_customers(
    State(state): State<AppState>,
) -> Result<Json<Vec<Customer>>, CustomerError> {
    let repo = CustomerRepository::new(state.db.clone());
    let customers = repo.list().await?;

    tracing::debug!("Retrieved {} customers", customers.len());
    Ok(Json(customers))
}

/// Handler for GET /api/customers/:id
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Customer>, CustomerError> {
    let repo = CustomerRepository::new(state.db.clone());
    let customer = repo
        .find_by_id(id)
        .await?
        .ok_or(CustomerError::NotFound(id))?;

    Ok(Json(customer))
}

/// Handler for PUT /api/customers/:id
pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCustomerRequest>,
) -> Result<Json<Customer>, CustomerError> {
    payload.validate()?;

    let repo = CustomerRepository::new(state.db.clone());
    let customer = repo
        .update(
            id,
            payload.name.as_deref(),
            payload.email.as_deref(),
            payload.phone.as_deref(),
        )
        .await?;

    tracing::info!("Updated customer {}", id);
    Ok(Json(customer))
}

/// Handler for GET /api/customers/:id/credits
/// Current balance plus the append-only debit trail
pub async fn get_credit_history(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CreditHistoryResponse>, CustomerError> {
    let repo = CustomerRepository::new(state.db.clone());
    let customer = repo
        .find_by_id(id)
        .await?
        .ok_or(CustomerError::NotFound(id))?;
    let debits = repo.credit_history(id).await?;

    Ok(Json(CreditHistoryResponse {
        customer_id: customer.id,
        balance: customer.credit_balance,
        debits,
    }))
}

/// Handler for POST /api/customers/:id/credits
/// Tops up the customer's store credit
pub async fn add_credit(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<AddCreditRequest>,
) -> Result<Json<Customer>, CustomerError> {
    crate::validation::validate_positive_amount(payload.amount).map_err(|_| {
        CustomerError::ValidationError("Credit amount must be positive".to_string())
    })?;

    let repo = CustomerRepository::new(state.db.clone());
    let customer = repo.add_credit(id, payload.amount).await?;

    tracing::info!(
        "Added {} credit to customer {}; balance now {}",
        payload.amount,
        id,
        customer.credit_balance
    );
    Ok(Json(customer))
}
