use crate::core::entry::ValidationError;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use std::str::FromStr;

/// Two-decimal tolerance below which a balance counts as settled.
///
/// Also the smallest transfer the settlement planner will ever emit.
pub const EPSILON: Decimal = dec!(0.01);

/// Largest amount a single entry may carry.
///
/// Keeps every per-chat sum far inside `Decimal` range.
pub const MAX_AMOUNT: Decimal = dec!(1_000_000_000_000);

/// Parse a user-typed money amount.
///
/// Both `.` and `,` are accepted as the decimal separator, so `"12,50"`
/// and `"12.50"` are the same amount. Range is not checked here; see
/// [`validate_amount`].
///
/// # Examples
///
/// ```
/// use group_ledger::core::amount::parse_amount;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(parse_amount("12,50").unwrap(), dec!(12.50));
/// assert!(parse_amount("lunch").is_err());
/// ```
pub fn parse_amount(raw: &str) -> Result<Decimal, ValidationError> {
    let normalized = raw.trim().replace(',', ".");
    if normalized.is_empty() {
        return Err(ValidationError::MalformedAmount(raw.to_string()));
    }
    Decimal::from_str(&normalized).map_err(|_| ValidationError::MalformedAmount(raw.to_string()))
}

/// Reject zero, negative and oversized amounts.
pub fn validate_amount(amount: Decimal) -> Result<Decimal, ValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount(amount));
    }
    if amount > MAX_AMOUNT {
        return Err(ValidationError::AmountTooLarge(amount));
    }
    Ok(amount)
}

/// True when `amount` is within [`EPSILON`] of zero.
pub fn is_negligible(amount: Decimal) -> bool {
    amount.abs() < EPSILON
}

/// Render an amount with exactly two decimal places, rounding half away
/// from zero.
pub fn format_amount(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}
