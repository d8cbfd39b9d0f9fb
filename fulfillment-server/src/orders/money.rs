//! Money helpers for order amounts
//!
//! Decimal-backed addition/comparison for refund accounting; stored values
//! stay `f64`, rounded to 2 decimal places half-up.

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: f64 = 0.01;

#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Precise sum of two stored amounts
pub fn add(a: f64, b: f64) -> f64 {
    to_f64(to_decimal(a) + to_decimal(b))
}

/// `amount` covers `total` within the money tolerance
pub fn covers(amount: f64, total: f64) -> bool {
    to_decimal(amount) + to_decimal(MONEY_TOLERANCE) >= to_decimal(total)
}

/// Validate an externally supplied amount
pub fn validate_amount(amount: f64, field: &str) -> Result<(), String> {
    if !amount.is_finite() {
        return Err(format!("{} must be a finite number, got {}", field, amount));
    }
    if amount <= 0.0 {
        return Err(format!("{} must be positive, got {}", field, amount));
    }
    Ok(())
}
