// Usage Ledger
//
// Durable per-customer, per-discount usage counters plus the store-credit
// debit trail. Two access patterns:
//
// - `snapshot` is the advisory read used by the eligibility evaluator at
//   quote time: fast, lock-free, may be stale by the time payment lands.
// - `commit` is the authoritative gate, invoked once per successful
//   payment. It re-validates every limit inside a single transaction while
//   holding a row lock on the discount, so two checkouts racing for the
//   last usage allowance cannot both succeed. Unique indexes on
//   (discount_id, transaction_id) and (customer_id, transaction_id) back
//   the idempotency checks.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::checkout::models::Cart;
use crate::discounts::error::{DiscountError, DiscountResult};
use crate::discounts::models::Discount;
use crate::discounts::eligibility::UsageSnapshot;
use crate::discounts::types::Ineligibility;

/// What a commit actually wrote
///
/// A retried commit for an already-recorded transaction reports zero new
/// usages and zero debited credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitOutcome {
    pub usages_recorded: u32,
    pub credit_debited: Decimal,
}

/// Usage Ledger backed by PostgreSQL
#[derive(Clone)]
pub struct UsageLedger {
    pool: PgPool,
}

impl UsageLedger {
    /// Create a new UsageLedger
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Committed usage counts for one (discount, customer) pair
    ///
    /// Only the counts a limit actually needs are queried; a discount with
    /// no limits costs nothing here.
    pub async fn snapshot(
        &self,
        discount: &Discount,
        customer_id: Option<i32>,
        now: chrono::DateTime<Utc>,
    ) -> DiscountResult<UsageSnapshot> {
        let mut snapshot = UsageSnapshot::empty();

        if discount.per_customer_limit.is_some() {
            if let Some(customer_id) = customer_id {
                let count: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM discount_usages WHERE discount_id = $1 AND customer_id = $2",
                )
                .bind(discount.id)
                .bind(customer_id)
                .fetch_one(&self.pool)
                .await?;
                snapshot.by_customer = count;
            }
        }

        if discount.usage_limit.is_some() {
            let count: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM discount_usages WHERE discount_id = $1")
                    .bind(discount.id)
                    .fetch_one(&self.pool)
                    .await?;
            snapshot.total = count;
        }

        if let Some((_, period)) = discount.frequency() {
            let since = period.window_start(now);
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM discount_usages WHERE discount_id = $1 AND used_at >= $2",
            )
            .bind(discount.id)
            .bind(since)
            .fetch_one(&self.pool)
            .await?;
            snapshot.in_window = count;
        }

        Ok(snapshot)
    }

    /// Record the cart's adjustments and credit against the ledger
    ///
    /// Invoked by the caller exactly once per confirmed payment; safe to
    /// retry with the same `transaction_id`. Everything happens in one
    /// transaction: a partial failure rolls back both the usage rows and
    /// the credit debit.
    pub async fn commit(
        &self,
        transaction_id: &str,
        cart: &Cart,
        customer_id: Option<i32>,
    ) -> DiscountResult<CommitOutcome> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();
        let mut usages_recorded = 0u32;

        for discount_id in cart.applied_discount_ids() {
            // Row lock serializes concurrent commits against this rule;
            // the re-checks below therefore see every committed usage.
            let query = format!(
                "SELECT {} FROM discounts WHERE id = $1 FOR UPDATE",
                Discount::COLUMNS
            );
            let discount = sqlx::query_as::<_, Discount>(&query)
                .bind(discount_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(DiscountError::NotFound(discount_id))?;

            // Idempotent retry: this transaction already recorded its usage
            let already_recorded: Option<bool> = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM discount_usages WHERE discount_id = $1 AND transaction_id = $2)",
            )
            .bind(discount_id)
            .bind(transaction_id)
            .fetch_one(&mut *tx)
            .await?;
            if already_recorded.unwrap_or(false) {
                tracing::debug!(
                    "Usage of discount {} already recorded for transaction {}",
                    discount_id,
                    transaction_id
                );
                continue;
            }

            self.recheck_limits(&mut tx, &discount, customer_id, now)
                .await?;

            sqlx::query(
                r#"
                INSERT INTO discount_usages (id, discount_id, customer_id, transaction_id, used_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(discount_id)
            .bind(customer_id)
            .bind(transaction_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            usages_recorded += 1;
        }

        let credit_debited = self
            .debit_credit(&mut tx, transaction_id, cart)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Committed transaction {}: {} usage(s), {} credit debited",
            transaction_id,
            usages_recorded,
            credit_debited
        );

        Ok(CommitOutcome {
            usages_recorded,
            credit_debited,
        })
    }

    /// Re-validate usage limits against committed rows at commit time
    ///
    /// The quote-time eligibility check is only advisory; this is the gate
    /// that actually holds under concurrency. A failure here surfaces as
    /// the retryable "no longer available" error and the caller must
    /// recompute the quote.
    async fn recheck_limits(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        discount: &Discount,
        customer_id: Option<i32>,
        now: chrono::DateTime<Utc>,
    ) -> DiscountResult<()> {
        if let (Some(limit), Some(customer_id)) = (discount.per_customer_limit, customer_id) {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM discount_usages WHERE discount_id = $1 AND customer_id = $2",
            )
            .bind(discount.id)
            .bind(customer_id)
            .fetch_one(&mut **tx)
            .await?;
            if count >= i64::from(limit) {
                return Err(DiscountError::NoLongerAvailable(
                    Ineligibility::AlreadyUsed.to_string(),
                ));
            }
        }

        if let Some(limit) = discount.usage_limit {
            let count: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM discount_usages WHERE discount_id = $1")
                    .bind(discount.id)
                    .fetch_one(&mut **tx)
                    .await?;
            if count >= i64::from(limit) {
                return Err(DiscountError::NoLongerAvailable(
                    Ineligibility::UsageLimitReached.to_string(),
                ));
            }
        }

        if let Some((limit, period)) = discount.frequency() {
            let since = period.window_start(now);
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM discount_usages WHERE discount_id = $1 AND used_at >= $2",
            )
            .bind(discount.id)
            .bind(since)
            .fetch_one(&mut **tx)
            .await?;
            if count >= i64::from(limit) {
                return Err(DiscountError::NoLongerAvailable(
                    Ineligibility::FrequencyLimitReached {
                        count: limit,
                        period,
                    }
                    .to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Debit the cart's applied credit inside the commit transaction
    ///
    /// The conditional UPDATE is the atomic decrement-with-floor: a
    /// customer who spent the same credit in a concurrent cart fails the
    /// balance predicate here even though the quote-time check passed.
    async fn debit_credit(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        transaction_id: &str,
        cart: &Cart,
    ) -> DiscountResult<Decimal> {
        let credit = match &cart.adjustments.credits {
            Some(credit) if credit.amount > Decimal::ZERO => credit,
            _ => return Ok(Decimal::ZERO),
        };

        let already_debited: Option<bool> = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM credit_debits WHERE customer_id = $1 AND transaction_id = $2)",
        )
        .bind(credit.customer_id)
        .bind(transaction_id)
        .fetch_one(&mut **tx)
        .await?;
        if already_debited.unwrap_or(false) {
            tracing::debug!(
                "Credit for transaction {} already debited",
                transaction_id
            );
            return Ok(Decimal::ZERO);
        }

        let result = sqlx::query(
            r#"
            UPDATE customers
            SET credit_balance = credit_balance - $1, updated_at = NOW()
            WHERE id = $2 AND credit_balance >= $1
            "#,
        )
        .bind(credit.amount)
        .bind(credit.customer_id)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            let exists: Option<bool> =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1)")
                    .bind(credit.customer_id)
                    .fetch_one(&mut **tx)
                    .await?;
            return Err(if exists.unwrap_or(false) {
                DiscountError::InsufficientCredit {
                    customer_id: credit.customer_id,
                }
            } else {
                DiscountError::CustomerNotFound(credit.customer_id)
            });
        }

        sqlx::query(
            r#"
            INSERT INTO credit_debits (id, customer_id, amount, transaction_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(credit.customer_id)
        .bind(credit.amount)
        .bind(transaction_id)
        .execute(&mut **tx)
        .await?;

        Ok(credit.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The commit path runs real SQL inside a transaction and is exercised
    // against a live database; the limit decision logic it shares with the
    // quote path is covered by the eligibility evaluator's tests over
    // UsageSnapshot counts.

    #[test]
    fn test_commit_outcome_reports_noop_retry() {
        let outcome = CommitOutcome {
            usages_recorded: 0,
            credit_debited: Decimal::ZERO,
        };
        assert_eq!(outcome.usages_recorded, 0);
        assert_eq!(outcome.credit_debited, Decimal::ZERO);
    }
}
