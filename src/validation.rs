// Validation utilities module
// Provides custom validation functions for domain-specific rules

use rust_decimal::Decimal;
use validator::ValidationError;

/// Validates that a price is non-negative
pub fn validate_price(price: Decimal) -> Result<(), ValidationError> {
    if price < Decimal::ZERO {
        Err(ValidationError::new("price_must_not_be_negative"))
    } else {
        Ok(())
    }
}

/// Validates that a monetary amount is strictly positive
pub fn validate_positive_amount(amount: Decimal) -> Result<(), ValidationError> {
    if amount <= Decimal::ZERO {
        Err(ValidationError::new("amount_must_be_positive"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_price() {
        assert!(validate_price(dec!(0)).is_ok());
        assert!(validate_price(dec!(9.99)).is_ok());
        assert!(validate_price(dec!(-0.01)).is_err());
    }

    #[test]
    fn test_validate_positive_amount() {
        assert!(validate_positive_amount(dec!(0.01)).is_ok());
        assert!(validate_positive_amount(dec!(0)).is_err());
        assert!(validate_positive_amount(dec!(-5)).is_err());
    }
}
