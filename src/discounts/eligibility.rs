// Eligibility Evaluator
//
// Decides whether a discount is currently usable for a given cart,
// customer, and instant. Pure read over an explicit context value: the
// ledger state arrives as a pre-loaded snapshot, so the evaluator itself
// performs no I/O and holds no process-wide state.
//
// This is the advisory, fail-fast check for the quote flow. The usage
// ledger re-validates the limit predicates inside the commit transaction,
// which is the authoritative gate against concurrent checkouts.

use chrono::{DateTime, Datelike, Utc};

use crate::checkout::models::Cart;
use crate::discounts::matcher;
use crate::discounts::models::Discount;
use crate::discounts::types::Ineligibility;

/// Committed usage counts for one (discount, customer) pair at an instant
///
/// Loaded per request from the ledger; counts only committed records, so
/// abandoned checkouts never influence eligibility.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsageSnapshot {
    /// Committed usages by this customer
    pub by_customer: i64,
    /// Committed usages across all customers
    pub total: i64,
    /// Committed usages inside the current frequency window
    pub in_window: i64,
}

impl UsageSnapshot {
    /// Snapshot for a discount that has never been used
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Everything the evaluator needs for one decision
///
/// An explicit context struct rather than loose arguments: every
/// recognized input is enumerated here.
#[derive(Debug)]
pub struct EligibilityContext<'a> {
    pub discount: &'a Discount,
    pub customer_id: Option<i32>,
    pub cart: &'a Cart,
    pub now: DateTime<Utc>,
    pub usage: UsageSnapshot,
}

/// Evaluate a discount's eligibility
///
/// Checks run in a fixed order and short-circuit on the first failure, so
/// the user-facing reason is deterministic:
/// archival, customer requirement, date window, day of week, must-have
/// scope, per-customer limit, total usage limit, frequency limit.
pub fn evaluate(ctx: &EligibilityContext<'_>) -> Result<(), Ineligibility> {
    let discount = ctx.discount;

    if discount.archived_at.is_some() {
        return Err(Ineligibility::Archived);
    }

    if discount.require_customer && ctx.customer_id.is_none() {
        return Err(Ineligibility::RequiresCustomer);
    }

    if let Some(starts_at) = discount.starts_at {
        if ctx.now < starts_at {
            return Err(Ineligibility::NotYetActive);
        }
    }
    if let Some(expires_at) = discount.expires_at {
        if ctx.now > expires_at {
            return Err(Ineligibility::Expired);
        }
    }

    if !discount.days_of_week.allows(ctx.now.weekday()) {
        return Err(Ineligibility::NotAvailableToday);
    }

    if !discount.musts.is_empty() && matcher::match_scope(&discount.musts, ctx.cart).is_empty() {
        return Err(Ineligibility::RequiredItemsMissing);
    }

    if let Some(limit) = discount.per_customer_limit {
        if ctx.customer_id.is_some() && ctx.usage.by_customer >= i64::from(limit) {
            return Err(Ineligibility::AlreadyUsed);
        }
    }

    if let Some(limit) = discount.usage_limit {
        if ctx.usage.total >= i64::from(limit) {
            return Err(Ineligibility::UsageLimitReached);
        }
    }

    if let Some((count, period)) = discount.frequency() {
        if ctx.usage.in_window >= i64::from(count) {
            return Err(Ineligibility::FrequencyLimitReached { count, period });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::models::{CartItem, ItemAdjustments};
    use crate::discounts::models::{AdjustmentEntry, Scope};
    use crate::discounts::types::{AdjustmentKind, AdjustmentMode, DaysOfWeek, FrequencyPeriod};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn base_discount() -> Discount {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Discount {
            id: Uuid::new_v4(),
            name: "Member special".to_string(),
            code: Some("MEMBER-10".to_string()),
            description: None,
            mode: AdjustmentMode::Discount,
            musts: Scope::default(),
            adjustments: vec![AdjustmentEntry {
                scope: Scope::default(),
                kind: AdjustmentKind::Percent,
                value: dec!(10),
                max_amount: None,
            }],
            usage_limit: None,
            per_customer_limit: None,
            frequency_count: None,
            frequency_period: None,
            days_of_week: DaysOfWeek::all(),
            starts_at: None,
            expires_at: None,
            require_customer: false,
            archived_at: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn cart_with_products(product_ids: &[i32]) -> Cart {
        Cart {
            items: product_ids
                .iter()
                .map(|&product_id| CartItem {
                    product_id,
                    category_id: Some(product_id * 10),
                    name: format!("Item {}", product_id),
                    quantity: 1,
                    unit_price: dec!(10.00),
                    subtotal: dec!(10.00),
                    tax: dec!(0),
                    total: dec!(0),
                    adjustments: ItemAdjustments::default(),
                })
                .collect(),
            ..Cart::default()
        }
    }

    // 2024-03-06 is a Wednesday
    fn wednesday_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 6, 12, 0, 0).unwrap()
    }

    fn ctx<'a>(
        discount: &'a Discount,
        customer_id: Option<i32>,
        cart: &'a Cart,
        usage: UsageSnapshot,
    ) -> EligibilityContext<'a> {
        EligibilityContext {
            discount,
            customer_id,
            cart,
            now: wednesday_noon(),
            usage,
        }
    }

    #[test]
    fn test_eligible_by_default() {
        let discount = base_discount();
        let cart = cart_with_products(&[1]);
        let result = evaluate(&ctx(&discount, Some(1), &cart, UsageSnapshot::empty()));
        assert!(result.is_ok());
    }

    #[test]
    fn test_archived_discount_is_never_eligible() {
        let mut discount = base_discount();
        discount.archived_at = Some(wednesday_noon());
        let cart = cart_with_products(&[1]);

        let result = evaluate(&ctx(&discount, Some(1), &cart, UsageSnapshot::empty()));
        assert_eq!(result, Err(Ineligibility::Archived));
    }

    #[test]
    fn test_require_customer_gate() {
        let mut discount = base_discount();
        discount.require_customer = true;
        let cart = cart_with_products(&[1]);

        // No customer attached: ineligible
        let result = evaluate(&ctx(&discount, None, &cart, UsageSnapshot::empty()));
        assert_eq!(result, Err(Ineligibility::RequiresCustomer));

        // Same request with a customer: eligible
        let result = evaluate(&ctx(&discount, Some(42), &cart, UsageSnapshot::empty()));
        assert!(result.is_ok());
    }

    #[test]
    fn test_not_yet_active_and_expired() {
        let mut discount = base_discount();
        discount.starts_at = Some(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap());
        let cart = cart_with_products(&[1]);

        let result = evaluate(&ctx(&discount, None, &cart, UsageSnapshot::empty()));
        assert_eq!(result, Err(Ineligibility::NotYetActive));

        let mut discount = base_discount();
        discount.expires_at = Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());

        let result = evaluate(&ctx(&discount, None, &cart, UsageSnapshot::empty()));
        assert_eq!(result, Err(Ineligibility::Expired));
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let mut discount = base_discount();
        discount.starts_at = Some(wednesday_noon());
        discount.expires_at = Some(wednesday_noon());
        let cart = cart_with_products(&[1]);

        let result = evaluate(&ctx(&discount, None, &cart, UsageSnapshot::empty()));
        assert!(result.is_ok());
    }

    #[test]
    fn test_day_of_week_restriction() {
        let mut discount = base_discount();
        discount.days_of_week.wednesday = false;
        let cart = cart_with_products(&[1]);

        let result = evaluate(&ctx(&discount, None, &cart, UsageSnapshot::empty()));
        assert_eq!(result, Err(Ineligibility::NotAvailableToday));
    }

    #[test]
    fn test_musts_scope_requires_matching_item() {
        let mut discount = base_discount();
        discount.musts = Scope {
            products: vec![99],
            categories: vec![],
        };
        let cart = cart_with_products(&[1, 2]);

        let result = evaluate(&ctx(&discount, None, &cart, UsageSnapshot::empty()));
        assert_eq!(result, Err(Ineligibility::RequiredItemsMissing));

        // Adding the required product makes the cart qualify
        let cart = cart_with_products(&[1, 99]);
        let result = evaluate(&ctx(&discount, None, &cart, UsageSnapshot::empty()));
        assert!(result.is_ok());
    }

    #[test]
    fn test_per_customer_limit() {
        let mut discount = base_discount();
        discount.per_customer_limit = Some(1);
        let cart = cart_with_products(&[1]);

        // First use: no committed records yet
        let result = evaluate(&ctx(&discount, Some(7), &cart, UsageSnapshot::empty()));
        assert!(result.is_ok());

        // After the first commit the same customer is rejected
        let used = UsageSnapshot {
            by_customer: 1,
            total: 1,
            in_window: 0,
        };
        let result = evaluate(&ctx(&discount, Some(7), &cart, used));
        assert_eq!(result, Err(Ineligibility::AlreadyUsed));

        // A different customer (zero committed usages of their own) is fine
        let other = UsageSnapshot {
            by_customer: 0,
            total: 1,
            in_window: 0,
        };
        let result = evaluate(&ctx(&discount, Some(8), &cart, other));
        assert!(result.is_ok());
    }

    #[test]
    fn test_total_usage_limit() {
        let mut discount = base_discount();
        discount.usage_limit = Some(2);
        let cart = cart_with_products(&[1]);

        for total in [0, 1] {
            let usage = UsageSnapshot {
                by_customer: 0,
                total,
                in_window: 0,
            };
            assert!(evaluate(&ctx(&discount, Some(1), &cart, usage)).is_ok());
        }

        // Third attempt is rejected regardless of which customer tries
        let usage = UsageSnapshot {
            by_customer: 0,
            total: 2,
            in_window: 0,
        };
        let result = evaluate(&ctx(&discount, Some(3), &cart, usage));
        assert_eq!(result, Err(Ineligibility::UsageLimitReached));
    }

    #[test]
    fn test_frequency_limit_within_window() {
        let mut discount = base_discount();
        discount.frequency_count = Some(1);
        discount.frequency_period = Some(FrequencyPeriod::Day);
        let cart = cart_with_products(&[1]);

        // No usage in today's bucket: eligible
        let result = evaluate(&ctx(&discount, None, &cart, UsageSnapshot::empty()));
        assert!(result.is_ok());

        // One usage already committed today: rejected with the period in
        // the reason
        let usage = UsageSnapshot {
            by_customer: 0,
            total: 1,
            in_window: 1,
        };
        let result = evaluate(&ctx(&discount, None, &cart, usage));
        assert_eq!(
            result,
            Err(Ineligibility::FrequencyLimitReached {
                count: 1,
                period: FrequencyPeriod::Day,
            })
        );

        // Next calendar day the window count resets to zero and the
        // discount is usable again (total keeps growing, no total limit)
        let usage = UsageSnapshot {
            by_customer: 0,
            total: 1,
            in_window: 0,
        };
        let result = evaluate(&ctx(&discount, None, &cart, usage));
        assert!(result.is_ok());
    }

    #[test]
    fn test_check_order_archived_wins_over_limits() {
        // Short-circuit ordering: an archived rule reports "archived" even
        // when its limits are also exhausted.
        let mut discount = base_discount();
        discount.archived_at = Some(wednesday_noon());
        discount.usage_limit = Some(1);
        let cart = cart_with_products(&[1]);

        let usage = UsageSnapshot {
            by_customer: 5,
            total: 5,
            in_window: 5,
        };
        let result = evaluate(&ctx(&discount, Some(1), &cart, usage));
        assert_eq!(result, Err(Ineligibility::Archived));
    }

    #[test]
    fn test_check_order_day_before_musts() {
        let mut discount = base_discount();
        discount.days_of_week.wednesday = false;
        discount.musts = Scope {
            products: vec![99],
            categories: vec![],
        };
        let cart = cart_with_products(&[1]);

        let result = evaluate(&ctx(&discount, None, &cart, UsageSnapshot::empty()));
        assert_eq!(result, Err(Ineligibility::NotAvailableToday));
    }
}
