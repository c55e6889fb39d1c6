// Discount / Adjustment Engine
//
// The core of the POS backend: given a cart, a customer, and a catalog of
// discount and surcharge rules with usage limits, time windows, day-of-week
// restrictions, and frequency caps, compute which adjustments legally
// apply and enforce usage accounting across concurrent checkouts.
//
// Components, leaf first:
// - matcher: which line items a scope applies to
// - eligibility: whether a rule is currently usable (pure, snapshot-fed)
// - calculator: adjustment amounts and tax recomputation
// - credit: store-credit application against the post-discount subtotal
// - ledger: durable usage counters; authoritative, idempotent commit
// - repository/handlers: rule administration
//
// Quote and commit are two distinct phases: the quote's eligibility check
// is an optimistic pre-check for the UI, while the ledger commit re-checks
// every limit inside a transaction after payment succeeds.

pub mod audit;
pub mod calculator;
pub mod credit;
pub mod eligibility;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod matcher;
pub mod models;
pub mod repository;
pub mod types;

// Re-export commonly used types for convenience
pub use audit::{AuditLogger, AuditRecord};
pub use calculator::{apply_discount, recompute_totals, TAX_RATE_PERCENT};
pub use credit::apply_credit;
pub use eligibility::{evaluate, EligibilityContext, UsageSnapshot};
pub use error::{DiscountError, DiscountResult};
pub use ledger::{CommitOutcome, UsageLedger};
pub use matcher::match_scope;
pub use models::{
    AdjustmentEntry, CreateDiscountRequest, Discount, Scope, UpdateDiscountRequest,
};
pub use repository::DiscountRepository;
pub use types::{
    AdjustmentKind, AdjustmentMode, DaysOfWeek, FrequencyPeriod, Ineligibility,
};

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;

use crate::checkout::models::{CommitRequest, QuoteRequest, QuoteResponse};
use crate::customers::{CustomerError, CustomerRepository};

/// Adjustment Engine
///
/// Orchestrates the quote flow (resolve rule, check eligibility, apply
/// adjustments and credit) and the commit flow (authoritative ledger
/// write), with an audit record for each.
#[derive(Clone)]
pub struct AdjustmentEngine {
    repository: DiscountRepository,
    ledger: UsageLedger,
    customers: CustomerRepository,
    audit: AuditLogger,
}

impl AdjustmentEngine {
    /// Create a new AdjustmentEngine over a database pool
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: DiscountRepository::new(pool.clone()),
            ledger: UsageLedger::new(pool.clone()),
            customers: CustomerRepository::new(pool.clone()),
            audit: AuditLogger::new(pool),
        }
    }

    /// Rule administration repository
    pub fn repository(&self) -> &DiscountRepository {
        &self.repository
    }

    /// Usage ledger
    pub fn ledger(&self) -> &UsageLedger {
        &self.ledger
    }

    /// Compute a quote: adjusted cart plus any discount error
    ///
    /// Ineligibility (and an unknown public code) degrade gracefully into
    /// `discount_error`; the checkout proceeds without the adjustment.
    /// Selecting a discount by ID is a POS/admin flow, so a missing ID is
    /// a hard 404 instead.
    pub async fn quote(&self, request: QuoteRequest) -> DiscountResult<QuoteResponse> {
        let mut cart = request.cart;
        let now = request.now.unwrap_or_else(Utc::now);

        // Normalize incoming totals before any adjustment math
        calculator::recompute_totals(&mut cart);

        let mut discount_error: Option<String> = None;

        let selected = match (request.discount_id, request.discount_code.as_deref()) {
            (Some(id), _) => Some(
                self.repository
                    .find_by_id(id)
                    .await?
                    .ok_or(DiscountError::NotFound(id))?,
            ),
            (None, Some(code)) => match self.repository.find_by_code(code).await? {
                Some(discount) => Some(discount),
                None => {
                    discount_error = Some(format!("discount code '{}' not found", code));
                    None
                }
            },
            (None, None) => None,
        };

        if let Some(discount) = selected {
            let usage = self
                .ledger
                .snapshot(&discount, request.customer_id, now)
                .await?;
            let ctx = EligibilityContext {
                discount: &discount,
                customer_id: request.customer_id,
                cart: &cart,
                now,
                usage,
            };

            match eligibility::evaluate(&ctx) {
                Ok(()) => {
                    calculator::apply_discount(&mut cart, &discount);
                    let applied = match discount.mode {
                        AdjustmentMode::Discount => cart.adjustments.discounts.total,
                        AdjustmentMode::Surcharge => cart.adjustments.surcharges.total,
                    };
                    tracing::debug!(
                        "Applied {} '{}' for {}",
                        discount.mode,
                        discount.name,
                        applied
                    );
                    self.audit
                        .log_quote(
                            Some(discount.id),
                            json!({
                                "mode": discount.mode,
                                "amount": applied,
                                "subtotal": cart.subtotal,
                            }),
                            &format!("Applied {} '{}'", discount.mode, discount.name),
                        )
                        .await;
                }
                Err(reason) => {
                    tracing::debug!("Discount '{}' ineligible: {}", discount.name, reason);
                    self.audit
                        .log_quote(
                            Some(discount.id),
                            json!({ "reason": reason.to_string() }),
                            &format!("Rejected '{}'", discount.name),
                        )
                        .await;
                    discount_error = Some(reason.to_string());
                }
            }
        }

        if let (Some(customer_id), Some(requested)) = (request.customer_id, request.credit) {
            if requested > Decimal::ZERO {
                let customer = self
                    .customers
                    .find_by_id(customer_id)
                    .await
                    .map_err(|e| match e {
                        CustomerError::DatabaseError(db) => DiscountError::DatabaseError(db),
                        _ => DiscountError::CustomerNotFound(customer_id),
                    })?
                    .ok_or(DiscountError::CustomerNotFound(customer_id))?;

                credit::apply_credit(&mut cart, &customer, requested);
                tracing::debug!(
                    "Applied {} store credit for customer {}",
                    cart.credit_applied(),
                    customer_id
                );
            }
        }

        Ok(QuoteResponse {
            adjustments: cart.adjustments.clone(),
            cart,
            discount_error,
        })
    }

    /// Record a confirmed payment against the ledger
    ///
    /// Delegates to the ledger's transactional commit and audits the
    /// outcome. Idempotent per transaction ID.
    pub async fn commit(&self, request: &CommitRequest) -> DiscountResult<CommitOutcome> {
        let outcome = self
            .ledger
            .commit(&request.transaction_id, &request.cart, request.customer_id)
            .await?;

        self.audit
            .log_commit(
                &request.transaction_id,
                json!({
                    "usages_recorded": outcome.usages_recorded,
                    "credit_debited": outcome.credit_debited,
                    "discounts": request.cart.applied_discount_ids(),
                }),
                &format!(
                    "Recorded {} usage(s), debited {}",
                    outcome.usages_recorded, outcome.credit_debited
                ),
            )
            .await;

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_component_types() {
        // Compile-time check that every engine component is reachable
        // through the module's public surface
        let _repository: Option<DiscountRepository> = None;
        let _ledger: Option<UsageLedger> = None;
        let _audit: Option<AuditLogger> = None;
        let _snapshot: Option<UsageSnapshot> = None;
        let _outcome: Option<CommitOutcome> = None;
    }
}
