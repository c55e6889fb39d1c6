// Cart value types and checkout request/response DTOs
// The cart is ephemeral and caller-owned: it arrives with the quote
// request, is adjusted in memory, and is never persisted. Only the usage
// ledger and credit debits are durable.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// One adjustment applied by a specific discount rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedAdjustment {
    pub discount_id: Uuid,
    pub name: String,
    pub amount: Decimal,
}

/// Accumulated adjustments of one sign (discounts or surcharges)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentBucket {
    #[serde(default)]
    pub items: Vec<AppliedAdjustment>,
    #[serde(default)]
    pub total: Decimal,
}

impl AdjustmentBucket {
    /// Record an adjustment amount, merging repeated applications of the
    /// same discount into a single entry
    pub fn record(&mut self, discount_id: Uuid, name: &str, amount: Decimal) {
        if amount == Decimal::ZERO {
            return;
        }
        match self.items.iter_mut().find(|a| a.discount_id == discount_id) {
            Some(existing) => existing.amount += amount,
            None => self.items.push(AppliedAdjustment {
                discount_id,
                name: name.to_string(),
                amount,
            }),
        }
        self.total += amount;
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Per-line-item adjustment state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemAdjustments {
    #[serde(default)]
    pub discounts: AdjustmentBucket,
    #[serde(default)]
    pub surcharges: AdjustmentBucket,
}

/// Store credit applied at cart level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditAdjustment {
    pub customer_id: i32,
    pub amount: Decimal,
}

/// Cart-level adjustment aggregates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartAdjustments {
    #[serde(default)]
    pub discounts: AdjustmentBucket,
    #[serde(default)]
    pub surcharges: AdjustmentBucket,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<CreditAdjustment>,
}

/// One line item in the cart
///
/// `subtotal` is the gross line amount (quantity x unit price); applied
/// adjustments are tracked separately so the gross figure survives
/// stacking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CartItem {
    pub product_id: i32,
    pub category_id: Option<i32>,
    pub name: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    #[serde(default)]
    pub tax: Decimal,
    #[serde(default)]
    pub total: Decimal,
    #[serde(default)]
    pub adjustments: ItemAdjustments,
}

impl CartItem {
    /// Line amount net of adjustments applied so far
    ///
    /// Percent adjustments compute against this figure, which is what
    /// makes stacked discounts sequential rather than simultaneous.
    pub fn net_subtotal(&self) -> Decimal {
        self.subtotal - self.adjustments.discounts.total + self.adjustments.surcharges.total
    }
}

/// The cart as a whole
///
/// `subtotal` is the current taxable subtotal: gross line subtotals minus
/// discounts, plus surcharges, minus applied credit. It is recomputed by
/// the adjustment calculator after every pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub subtotal: Decimal,
    #[serde(default)]
    pub tax: Decimal,
    #[serde(default)]
    pub total: Decimal,
    #[serde(default)]
    pub adjustments: CartAdjustments,
}

impl Cart {
    /// Sum of gross line subtotals
    pub fn gross_subtotal(&self) -> Decimal {
        self.items.iter().map(|item| item.subtotal).sum()
    }

    /// Credit amount applied to this cart, zero when none
    pub fn credit_applied(&self) -> Decimal {
        self.adjustments
            .credits
            .as_ref()
            .map(|c| c.amount)
            .unwrap_or(Decimal::ZERO)
    }

    /// Distinct discount IDs referenced by the cart's adjustment buckets
    pub fn applied_discount_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self
            .adjustments
            .discounts
            .items
            .iter()
            .chain(self.adjustments.surcharges.items.iter())
            .map(|a| a.discount_id)
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

/// Request body for POST /api/checkout/quote
#[derive(Debug, Deserialize, Validate)]
pub struct QuoteRequest {
    pub cart: Cart,
    pub customer_id: Option<i32>,
    /// Discount selected by ID (admin/POS flows)
    pub discount_id: Option<Uuid>,
    /// Discount selected by public code (storefront flows)
    pub discount_code: Option<String>,
    /// Store credit the customer asked to apply
    pub credit: Option<Decimal>,
    /// Evaluation instant; defaults to the server clock
    pub now: Option<DateTime<Utc>>,
}

/// Response body for POST /api/checkout/quote
///
/// Ineligibility is not an error: the cart is still returned (adjusted by
/// credit when requested) with the reason in `discount_error` for the
/// checkout UI to render.
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub cart: Cart,
    pub adjustments: CartAdjustments,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_error: Option<String>,
}

/// Request body for POST /api/checkout/commit
#[derive(Debug, Deserialize, Validate)]
pub struct CommitRequest {
    /// Payment processor reference; commits are idempotent per transaction
    #[validate(length(min = 1, max = 128, message = "Transaction ID is required"))]
    pub transaction_id: String,
    pub cart: Cart,
    pub customer_id: Option<i32>,
}

/// Response body for POST /api/checkout/commit
///
/// A retried commit reports zero newly recorded rows.
#[derive(Debug, Serialize)]
pub struct CommitResponse {
    pub transaction_id: String,
    pub usages_recorded: u32,
    pub credit_debited: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(product_id: i32, subtotal: Decimal) -> CartItem {
        CartItem {
            product_id,
            category_id: None,
            name: format!("Item {}", product_id),
            quantity: 1,
            unit_price: subtotal,
            subtotal,
            tax: Decimal::ZERO,
            total: Decimal::ZERO,
            adjustments: ItemAdjustments::default(),
        }
    }

    #[test]
    fn test_bucket_record_accumulates_total() {
        let mut bucket = AdjustmentBucket::default();
        let id = Uuid::new_v4();

        bucket.record(id, "Ten off", dec!(2.00));
        bucket.record(id, "Ten off", dec!(1.50));

        assert_eq!(bucket.items.len(), 1);
        assert_eq!(bucket.items[0].amount, dec!(3.50));
        assert_eq!(bucket.total, dec!(3.50));
    }

    #[test]
    fn test_bucket_record_separate_discounts() {
        let mut bucket = AdjustmentBucket::default();
        bucket.record(Uuid::new_v4(), "A", dec!(2.00));
        bucket.record(Uuid::new_v4(), "B", dec!(3.00));

        assert_eq!(bucket.items.len(), 2);
        assert_eq!(bucket.total, dec!(5.00));
    }

    #[test]
    fn test_bucket_skips_zero_amounts() {
        let mut bucket = AdjustmentBucket::default();
        bucket.record(Uuid::new_v4(), "Nothing", Decimal::ZERO);
        assert!(bucket.is_empty());
        assert_eq!(bucket.total, Decimal::ZERO);
    }

    #[test]
    fn test_net_subtotal_reflects_adjustments() {
        let mut line = item(1, dec!(20.00));
        assert_eq!(line.net_subtotal(), dec!(20.00));

        line.adjustments
            .discounts
            .record(Uuid::new_v4(), "Ten percent", dec!(2.00));
        assert_eq!(line.net_subtotal(), dec!(18.00));

        line.adjustments
            .surcharges
            .record(Uuid::new_v4(), "Holiday", dec!(1.00));
        assert_eq!(line.net_subtotal(), dec!(19.00));
    }

    #[test]
    fn test_applied_discount_ids_deduplicates() {
        let mut cart = Cart {
            items: vec![item(1, dec!(10.00))],
            ..Cart::default()
        };
        let id = Uuid::new_v4();
        cart.adjustments.discounts.record(id, "A", dec!(1.00));
        cart.adjustments.surcharges.record(id, "A", dec!(0.50));
        cart.adjustments
            .discounts
            .record(Uuid::new_v4(), "B", dec!(2.00));

        assert_eq!(cart.applied_discount_ids().len(), 2);
    }

    #[test]
    fn test_cart_deserializes_bare_items() {
        // Storefront clients send only the line basics; adjustment state
        // and totals default to zero.
        let json = r#"{
            "items": [
                {"product_id": 1, "category_id": 3, "name": "Day pass", "quantity": 2,
                 "unit_price": "7.50", "subtotal": "15.00"}
            ]
        }"#;

        let cart: Cart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].subtotal, dec!(15.00));
        assert_eq!(cart.gross_subtotal(), dec!(15.00));
        assert!(cart.adjustments.discounts.is_empty());
        assert_eq!(cart.credit_applied(), Decimal::ZERO);
    }
}
