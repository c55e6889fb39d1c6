// Rule Matcher
//
// Resolves which cart line items a product/category scope applies to.
// Used both for must-have clauses (does the cart qualify at all) and for
// per-adjustment targeting (which items receive a specific adjustment).

use crate::checkout::models::{Cart, CartItem};
use crate::discounts::models::Scope;

/// Whether a single line item falls inside a scope
///
/// An empty scope matches everything; otherwise the item matches if its
/// product ID or its category ID is listed.
pub fn matches_item(scope: &Scope, item: &CartItem) -> bool {
    if scope.is_empty() {
        return true;
    }
    if scope.products.contains(&item.product_id) {
        return true;
    }
    match item.category_id {
        Some(category_id) => scope.categories.contains(&category_id),
        None => false,
    }
}

/// Indices of the cart line items a scope applies to
///
/// Pure function of (scope, cart); no side effects.
pub fn match_scope(scope: &Scope, cart: &Cart) -> Vec<usize> {
    cart.items
        .iter()
        .enumerate()
        .filter(|(_, item)| matches_item(scope, item))
        .map(|(index, _)| index)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::models::ItemAdjustments;
    use rust_decimal_macros::dec;

    fn item(product_id: i32, category_id: Option<i32>) -> CartItem {
        CartItem {
            product_id,
            category_id,
            name: format!("Item {}", product_id),
            quantity: 1,
            unit_price: dec!(10.00),
            subtotal: dec!(10.00),
            tax: dec!(0),
            total: dec!(0),
            adjustments: ItemAdjustments::default(),
        }
    }

    fn cart(items: Vec<CartItem>) -> Cart {
        Cart {
            items,
            ..Cart::default()
        }
    }

    #[test]
    fn test_empty_scope_matches_every_item() {
        let cart = cart(vec![item(1, None), item(2, Some(5))]);
        let indices = match_scope(&Scope::default(), &cart);
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_product_scope_matches_by_product_id() {
        let cart = cart(vec![item(1, None), item(2, None), item(3, None)]);
        let scope = Scope {
            products: vec![2],
            categories: vec![],
        };
        assert_eq!(match_scope(&scope, &cart), vec![1]);
    }

    #[test]
    fn test_category_scope_matches_by_category_id() {
        let cart = cart(vec![item(1, Some(10)), item(2, Some(20)), item(3, None)]);
        let scope = Scope {
            products: vec![],
            categories: vec![20],
        };
        assert_eq!(match_scope(&scope, &cart), vec![1]);
    }

    #[test]
    fn test_scope_matches_product_or_category() {
        let cart = cart(vec![item(1, Some(10)), item(2, Some(20))]);
        let scope = Scope {
            products: vec![1],
            categories: vec![20],
        };
        assert_eq!(match_scope(&scope, &cart), vec![0, 1]);
    }

    #[test]
    fn test_other_category_does_not_match() {
        // A discount scoped to category X must not touch an item that only
        // belongs to category Y.
        let cart = cart(vec![item(1, Some(7))]);
        let scope = Scope {
            products: vec![],
            categories: vec![8],
        };
        assert!(match_scope(&scope, &cart).is_empty());
    }

    #[test]
    fn test_item_without_category_only_matches_by_product() {
        let uncategorized = item(9, None);
        let scope = Scope {
            products: vec![],
            categories: vec![1, 2, 3],
        };
        assert!(!matches_item(&scope, &uncategorized));

        let scope = Scope {
            products: vec![9],
            categories: vec![],
        };
        assert!(matches_item(&scope, &uncategorized));
    }

    #[test]
    fn test_empty_cart_matches_nothing() {
        let cart = cart(vec![]);
        assert!(match_scope(&Scope::default(), &cart).is_empty());
    }
}
