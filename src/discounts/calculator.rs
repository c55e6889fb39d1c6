// Adjustment Calculator
//
// Applies a matched, eligible discount or surcharge to a cart, then
// recomputes tax and totals. Operates purely on the in-memory cart value;
// the usage ledger is untouched until commit.
//
// Stacking is sequential: percent entries compute against each item's net
// subtotal (gross minus discounts already applied plus surcharges), so a
// later discount sees the cart as the earlier ones left it.

use rust_decimal::Decimal;

use crate::checkout::models::Cart;
use crate::discounts::matcher;
use crate::discounts::models::Discount;
use crate::discounts::types::{AdjustmentKind, AdjustmentMode};

/// GST applied to the post-adjustment subtotal
pub const TAX_RATE_PERCENT: u32 = 10;

/// Tax on an amount at the fixed rate, rounded to cents
pub fn tax_on(amount: Decimal) -> Decimal {
    (amount * Decimal::from(TAX_RATE_PERCENT) / Decimal::ONE_HUNDRED).round_dp(2)
}

/// Recompute line and cart totals from the current adjustment state
///
/// The cart subtotal becomes gross line subtotals minus discounts, plus
/// surcharges, minus applied credit, clamped at zero; tax is the fixed
/// percentage of that figure, so a fully credited cart carries exactly
/// zero tax.
pub fn recompute_totals(cart: &mut Cart) {
    for item in &mut cart.items {
        let net = item.net_subtotal().max(Decimal::ZERO);
        item.tax = tax_on(net);
        item.total = net + item.tax;
    }

    let taxable = (cart.gross_subtotal() - cart.adjustments.discounts.total
        + cart.adjustments.surcharges.total
        - cart.credit_applied())
    .max(Decimal::ZERO);

    cart.subtotal = taxable;
    cart.tax = tax_on(taxable);
    cart.total = cart.subtotal + cart.tax;
}

/// Apply one discount/surcharge rule to the cart
///
/// Entries are processed in list order. Each entry resolves its target
/// items through the rule matcher, computes the raw adjustment, clamps it
/// to the entry's cap and (for discounts) to the item's remaining net
/// subtotal, and records it at item and cart level. Totals are recomputed
/// once at the end.
pub fn apply_discount(cart: &mut Cart, discount: &Discount) {
    for entry in &discount.adjustments {
        let targets = matcher::match_scope(&entry.scope, cart);

        for index in targets {
            let base = cart.items[index].net_subtotal().max(Decimal::ZERO);

            let mut amount = match entry.kind {
                AdjustmentKind::Percent => {
                    (base * entry.value / Decimal::ONE_HUNDRED).round_dp(2)
                }
                AdjustmentKind::Amount => entry.value,
            };

            if let Some(cap) = entry.max_amount {
                amount = amount.min(cap);
            }

            match discount.mode {
                AdjustmentMode::Discount => {
                    // An item can be discounted to zero but never below
                    amount = amount.min(base);
                    if amount > Decimal::ZERO {
                        cart.items[index].adjustments.discounts.record(
                            discount.id,
                            &discount.name,
                            amount,
                        );
                        cart.adjustments
                            .discounts
                            .record(discount.id, &discount.name, amount);
                    }
                }
                AdjustmentMode::Surcharge => {
                    if amount > Decimal::ZERO {
                        cart.items[index].adjustments.surcharges.record(
                            discount.id,
                            &discount.name,
                            amount,
                        );
                        cart.adjustments
                            .surcharges
                            .record(discount.id, &discount.name, amount);
                    }
                }
            }
        }
    }

    recompute_totals(cart);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::models::{CartItem, ItemAdjustments};
    use crate::discounts::models::{AdjustmentEntry, Scope};
    use crate::discounts::types::DaysOfWeek;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn item(product_id: i32, category_id: Option<i32>, subtotal: Decimal) -> CartItem {
        CartItem {
            product_id,
            category_id,
            name: format!("Item {}", product_id),
            quantity: 1,
            unit_price: subtotal,
            subtotal,
            tax: dec!(0),
            total: dec!(0),
            adjustments: ItemAdjustments::default(),
        }
    }

    fn cart_of(items: Vec<CartItem>) -> Cart {
        let mut cart = Cart {
            items,
            ..Cart::default()
        };
        recompute_totals(&mut cart);
        cart
    }

    fn discount_rule(
        mode: AdjustmentMode,
        entries: Vec<AdjustmentEntry>,
        name: &str,
    ) -> Discount {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Discount {
            id: Uuid::new_v4(),
            name: name.to_string(),
            code: None,
            description: None,
            mode,
            musts: Scope::default(),
            adjustments: entries,
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

    fn percent(value: Decimal) -> AdjustmentEntry {
        AdjustmentEntry {
            scope: Scope::default(),
            kind: AdjustmentKind::Percent,
            value,
            max_amount: None,
        }
    }

    fn amount(value: Decimal) -> AdjustmentEntry {
        AdjustmentEntry {
            scope: Scope::default(),
            kind: AdjustmentKind::Amount,
            value,
            max_amount: None,
        }
    }

    #[test]
    fn test_totals_without_adjustments() {
        let cart = cart_of(vec![item(1, None, dec!(15.00))]);
        assert_eq!(cart.subtotal, dec!(15.00));
        assert_eq!(cart.tax, dec!(1.50));
        assert_eq!(cart.total, dec!(16.50));
    }

    #[test]
    fn test_percent_discount_of_subtotal() {
        // $15.00 cart, 20% off: discount $3.00, subtotal $12.00,
        // tax $1.20, total $13.20
        let mut cart = cart_of(vec![item(1, None, dec!(15.00))]);
        let rule = discount_rule(AdjustmentMode::Discount, vec![percent(dec!(20))], "20% off");

        apply_discount(&mut cart, &rule);

        assert_eq!(cart.adjustments.discounts.total, dec!(3.00));
        assert_eq!(cart.subtotal, dec!(12.00));
        assert_eq!(cart.tax, dec!(1.20));
        assert_eq!(cart.total, dec!(13.20));
        assert_eq!(cart.items[0].adjustments.discounts.total, dec!(3.00));
    }

    #[test]
    fn test_fixed_amount_discount_per_item() {
        let mut cart = cart_of(vec![
            item(1, None, dec!(10.00)),
            item(2, None, dec!(20.00)),
        ]);
        let rule = discount_rule(AdjustmentMode::Discount, vec![amount(dec!(2.00))], "$2 off");

        apply_discount(&mut cart, &rule);

        // Fixed amount applies to each matched item
        assert_eq!(cart.adjustments.discounts.total, dec!(4.00));
        assert_eq!(cart.subtotal, dec!(26.00));
        assert_eq!(cart.tax, dec!(2.60));
    }

    #[test]
    fn test_max_amount_caps_percent_discount() {
        let mut cart = cart_of(vec![item(1, None, dec!(100.00))]);
        let entry = AdjustmentEntry {
            scope: Scope::default(),
            kind: AdjustmentKind::Percent,
            value: dec!(50),
            max_amount: Some(dec!(10.00)),
        };
        let rule = discount_rule(AdjustmentMode::Discount, vec![entry], "Capped half off");

        apply_discount(&mut cart, &rule);

        assert_eq!(cart.adjustments.discounts.total, dec!(10.00));
        assert_eq!(cart.subtotal, dec!(90.00));
    }

    #[test]
    fn test_discount_never_drives_item_below_zero() {
        let mut cart = cart_of(vec![item(1, None, dec!(5.00))]);
        let rule = discount_rule(AdjustmentMode::Discount, vec![amount(dec!(8.00))], "$8 off");

        apply_discount(&mut cart, &rule);

        // Clamped to the item's remaining subtotal
        assert_eq!(cart.adjustments.discounts.total, dec!(5.00));
        assert_eq!(cart.subtotal, dec!(0.00));
        assert_eq!(cart.tax, dec!(0.00));
        assert_eq!(cart.total, dec!(0.00));
    }

    #[test]
    fn test_scoped_adjustment_skips_other_categories() {
        // Category-scoped discount must not adjust items in other categories
        let mut cart = cart_of(vec![
            item(1, Some(10), dec!(12.00)),
            item(2, Some(20), dec!(8.00)),
        ]);
        let entry = AdjustmentEntry {
            scope: Scope {
                products: vec![],
                categories: vec![10],
            },
            kind: AdjustmentKind::Percent,
            value: dec!(50),
            max_amount: None,
        };
        let rule = discount_rule(AdjustmentMode::Discount, vec![entry], "Category sale");

        apply_discount(&mut cart, &rule);

        assert_eq!(cart.items[0].adjustments.discounts.total, dec!(6.00));
        assert!(cart.items[1].adjustments.discounts.is_empty());
        assert_eq!(cart.adjustments.discounts.total, dec!(6.00));
        assert_eq!(cart.subtotal, dec!(14.00));
    }

    #[test]
    fn test_surcharge_adds_to_total() {
        let mut cart = cart_of(vec![item(1, None, dec!(20.00))]);
        let rule = discount_rule(
            AdjustmentMode::Surcharge,
            vec![percent(dec!(5))],
            "Holiday surcharge",
        );

        apply_discount(&mut cart, &rule);

        assert_eq!(cart.adjustments.surcharges.total, dec!(1.00));
        assert_eq!(cart.subtotal, dec!(21.00));
        assert_eq!(cart.tax, dec!(2.10));
        assert_eq!(cart.total, dec!(23.10));
    }

    #[test]
    fn test_sequential_stacking_compounds() {
        // Two 10% discounts on $20.00: first takes $2.00, the second
        // computes against $18.00 and takes $1.80
        let mut cart = cart_of(vec![item(1, None, dec!(20.00))]);
        let first = discount_rule(AdjustmentMode::Discount, vec![percent(dec!(10))], "First");
        let second = discount_rule(AdjustmentMode::Discount, vec![percent(dec!(10))], "Second");

        apply_discount(&mut cart, &first);
        assert_eq!(cart.subtotal, dec!(18.00));

        apply_discount(&mut cart, &second);
        assert_eq!(cart.adjustments.discounts.total, dec!(3.80));
        assert_eq!(cart.subtotal, dec!(16.20));
        assert_eq!(cart.adjustments.discounts.items.len(), 2);
    }

    #[test]
    fn test_multiple_entries_processed_in_order() {
        // A rule with two entries: 50% off, then $4 off the remainder
        let mut cart = cart_of(vec![item(1, None, dec!(10.00))]);
        let rule = discount_rule(
            AdjustmentMode::Discount,
            vec![percent(dec!(50)), amount(dec!(4.00))],
            "Combo",
        );

        apply_discount(&mut cart, &rule);

        // 50% of 10.00 = 5.00, then 4.00 against the remaining 5.00
        assert_eq!(cart.adjustments.discounts.total, dec!(9.00));
        assert_eq!(cart.subtotal, dec!(1.00));
        // Both entries merge under the one discount ID
        assert_eq!(cart.adjustments.discounts.items.len(), 1);
    }

    #[test]
    fn test_item_tax_and_total_follow_net() {
        let mut cart = cart_of(vec![item(1, None, dec!(10.00))]);
        let rule = discount_rule(AdjustmentMode::Discount, vec![percent(dec!(20))], "20% off");

        apply_discount(&mut cart, &rule);

        assert_eq!(cart.items[0].tax, dec!(0.80));
        assert_eq!(cart.items[0].total, dec!(8.80));
    }
}
