use rust_decimal::Decimal;

use crate::error::ValidationError;

// ============================================================================
// Money
// ============================================================================
//
// Prices and totals are stored as DECIMAL(10, 2): at most two decimal places
// and strictly below 100_000_000. All line and total arithmetic is checked.
//
// ============================================================================

pub const MONEY_SCALE: u32 = 2;

/// Exclusive upper bound of a storable amount.
pub const AMOUNT_LIMIT: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

/// `price * quantity`, failing instead of overflowing.
pub fn line_total(price: Decimal, quantity: i32) -> Result<Decimal, ValidationError> {
    price
        .checked_mul(Decimal::from(quantity))
        .ok_or(ValidationError::AmountOutOfRange)
}

/// Sum of line totals in iteration order.
pub fn checked_sum<I>(amounts: I) -> Result<Decimal, ValidationError>
where
    I: IntoIterator<Item = Result<Decimal, ValidationError>>,
{
    amounts.into_iter().try_fold(Decimal::ZERO, |acc, amount| {
        acc.checked_add(amount?).ok_or(ValidationError::AmountOutOfRange)
    })
}

/// Fits the DECIMAL(10, 2) column without rounding.
pub fn is_storable(amount: Decimal) -> bool {
    amount.abs() < AMOUNT_LIMIT && amount.round_dp(MONEY_SCALE) == amount
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(Decimal::new(1999, 2), 3), Ok(Decimal::new(5997, 2)));
    }

    #[test]
    fn test_line_total_overflow_is_an_error() {
        assert_eq!(line_total(Decimal::MAX, 2), Err(ValidationError::AmountOutOfRange));
    }

    #[test]
    fn test_checked_sum_overflow_is_an_error() {
        let amounts = vec![Ok(Decimal::MAX), Ok(Decimal::ONE)];
        assert_eq!(checked_sum(amounts), Err(ValidationError::AmountOutOfRange));
        assert_eq!(checked_sum(Vec::new()), Ok(Decimal::ZERO));
    }

    #[test]
    fn test_storable_range() {
        assert!(is_storable(Decimal::new(9_999_999_999, 2)));
        assert!(!is_storable(Decimal::new(100_000_000, 0)));
        assert!(!is_storable(Decimal::new(1001, 3)));
        // Trailing zeros beyond two places are still exact cents
        assert!(is_storable(Decimal::new(1000, 3)));
    }
}
