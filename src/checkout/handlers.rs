// HTTP handlers for the checkout flow
//
// Quote computes adjustments for a cart without touching the ledger;
// commit is called by the payment flow after the processor confirms, and
// is the only write path into the usage ledger.

use axum::{extract::State, Json};
use validator::Validate;

use crate::checkout::error::CheckoutError;
use crate::checkout::models::{CommitRequest, CommitResponse, QuoteRequest, QuoteResponse};
use crate::AppState;

/// Handler for POST /api/checkout/quote
///
/// Returns the adjusted cart. An ineligible or unknown discount comes back
/// as `discount_error` in a 200 response so the checkout UI can render it;
/// the cart itself stays valid.
pub async fn quote(
    State(state): State<AppState>,
    Json(payload): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, CheckoutError> {
    tracing::debug!(
        "Quote request: {} item(s), customer {:?}",
        payload.cart.items.len(),
        payload.customer_id
    );
    payload.validate()?;

    for item in &payload.cart.items {
        item.validate()?;
    }

    let response = state.engine.quote(payload).await?;

    if let Some(ref reason) = response.discount_error {
        tracing::debug!("Quote returned discount error: {}", reason);
    }
    Ok(Json(response))
}

/// Handler for POST /api/checkout/commit
///
/// Invoked once per successful payment. Safe to retry with the same
/// transaction ID; a commit-time limit conflict returns 409 and the caller
/// must re-quote rather than retry blindly.
pub async fn commit(
    State(state): State<AppState>,
    Json(payload): Json<CommitRequest>,
) -> Result<Json<CommitResponse>, CheckoutError> {
    tracing::debug!("Commit request for transaction {}", payload.transaction_id);
    payload.validate()?;

    let outcome = state.engine.commit(&payload).await?;

    Ok(Json(CommitResponse {
        transaction_id: payload.transaction_id,
        usages_recorded: outcome.usages_recorded,
        credit_debited: outcome.credit_debited,
    }))
}
