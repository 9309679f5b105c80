//! Numeric helpers shared by the economic protocols.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Tolerance for treating two marginal rates or welfare values as equal.
pub const EPSILON: f64 = 1e-9;

/// Round to two decimal places, half-to-even.
///
/// Non-finite inputs are returned unchanged.
pub fn round2(value: f64) -> f64 {
    Decimal::try_from(value)
        .ok()
        .map(|d| d.round_dp(2))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// Whether two values are equal within [`EPSILON`].
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}
