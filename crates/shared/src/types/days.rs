//! Day amounts with half-day granularity.
//!
//! CRITICAL: Never use floating-point for day counts.
//! Leave amounts are `rust_decimal::Decimal` values that must be multiples of 0.5.

use rust_decimal::Decimal;

use crate::error::{AppError, AppResult};

/// Half a working day.
pub const HALF_DAY: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Returns true if `amount` is a whole multiple of half a day.
#[must_use]
pub fn is_half_day_multiple(amount: Decimal) -> bool {
    (amount % HALF_DAY).is_zero()
}

/// Validates a stored day amount: non-negative and half-day granular.
///
/// # Errors
///
/// Returns `AppError::Validation` naming the offending field.
pub fn ensure_day_amount(field: &str, amount: Decimal) -> AppResult<Decimal> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AppError::Validation(format!(
            "{field}: {amount} must not be negative"
        )));
    }
    if !is_half_day_multiple(amount) {
        return Err(AppError::Validation(format!(
            "{field}: {amount} must be a multiple of 0.5 days"
        )));
    }
    Ok(amount.normalize())
}
