// Credit Applier
//
// Applies a customer's store credit against the post-discount subtotal.
// Pure cart arithmetic: the stored balance is only debited by the ledger
// commit after payment succeeds, so a quote can be recomputed or abandoned
// freely.

use rust_decimal::Decimal;

use crate::checkout::models::{Cart, CreditAdjustment};
use crate::customers::models::Customer;
use crate::discounts::calculator;

/// Apply store credit to the cart
///
/// The effective credit is the smallest of the requested amount, the
/// customer's current balance, and the amount still payable after
/// discounts and surcharges. Replaces any credit adjustment already on the
/// cart, then recomputes tax and totals; paying the whole cart with credit
/// leaves a zero total and zero tax.
pub fn apply_credit(cart: &mut Cart, customer: &Customer, requested: Decimal) {
    let requested = requested.max(Decimal::ZERO);

    let payable = (cart.gross_subtotal() - cart.adjustments.discounts.total
        + cart.adjustments.surcharges.total)
        .max(Decimal::ZERO);

    let effective = requested.min(customer.credit_balance).min(payable);

    cart.adjustments.credits = if effective > Decimal::ZERO {
        Some(CreditAdjustment {
            customer_id: customer.id,
            amount: effective,
        })
    } else {
        None
    };

    calculator::recompute_totals(cart);
}
