//! Money rounding helpers with fixed decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All amounts are `rust_decimal::Decimal`.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// Default number of decimal places persisted for monetary amounts.
pub const DEFAULT_PRECISION: u32 = 2;

/// Round a monetary amount to the given precision using Banker's Rounding.
///
/// Uses `RoundingStrategy::MidpointNearestEven` which:
/// - Rounds 2.5 → 2 (to nearest even)
/// - Rounds 3.5 → 4 (to nearest even)
#[must_use]
pub fn round_amount(value: Decimal, precision: u32) -> Decimal {
    value.round_dp_with_strategy(precision, RoundingStrategy::MidpointNearestEven)
}

/// Take a percentage of an amount.
///
/// `rate` is a fraction, e.g. `0.20` for 20%. The result is not rounded;
/// rounding happens once, when an entry is normalized for persistence.
#[must_use]
pub fn take_percent(amount: Decimal, rate: Decimal) -> Decimal {
    amount * rate
}
