//! Conversion between decimal prices and payment-provider minor units.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Errors converting a price to minor units.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is below zero.
    #[error("amount cannot be negative: {0}")]
    Negative(Decimal),
    /// The amount does not fit in an `i64` of cents.
    #[error("amount is too large: {0}")]
    Overflow(Decimal),
}

/// Convert a major-unit amount (e.g. dollars) into minor units (cents).
///
/// Rounds half away from zero, so `45.995` becomes `4600`.
///
/// # Errors
///
/// Returns [`MoneyError::Negative`] for negative input and
/// [`MoneyError::Overflow`] if the result does not fit in an `i64`.
///
/// # Example
///
/// ```
/// use rust_decimal::Decimal;
/// use terracotta_core::to_minor_units;
///
/// assert_eq!(to_minor_units(Decimal::new(4599, 2)).unwrap(), 4599);
/// ```
pub fn to_minor_units(amount: Decimal) -> Result<i64, MoneyError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(MoneyError::Negative(amount));
    }

    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|cents| cents.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|cents| cents.to_i64())
        .ok_or(MoneyError::Overflow(amount))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_whole_cents() {
        assert_eq!(to_minor_units(dec("45.99")).unwrap(), 4599);
        assert_eq!(to_minor_units(dec("10")).unwrap(), 1000);
        assert_eq!(to_minor_units(Decimal::ZERO).unwrap(), 0);
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        assert_eq!(to_minor_units(dec("0.005")).unwrap(), 1);
        assert_eq!(to_minor_units(dec("45.994")).unwrap(), 4599);
        assert_eq!(to_minor_units(dec("45.995")).unwrap(), 4600);
    }

    #[test]
    fn test_rejects_negative() {
        assert_eq!(
            to_minor_units(dec("-1.00")),
            Err(MoneyError::Negative(dec("-1.00")))
        );
    }

    #[test]
    fn test_overflow() {
        assert!(matches!(
            to_minor_units(Decimal::MAX),
            Err(MoneyError::Overflow(_))
        ));
    }
}
