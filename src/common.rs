//! Money helpers shared by order responses and the payment providers.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::errors::ServiceError;

/// Normalizes an amount to two decimal places for responses.
///
/// SQLite stores decimals as REAL, so values can come back as `39.999999`
/// or `40`; both render as `40.00` after this.
pub fn money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(2);
    rounded
}

/// Amount in minor units (cents/fils), rounded half-even.
pub fn to_minor_units(amount: Decimal) -> Result<i64, ServiceError> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
        .to_i64()
        .ok_or_else(|| ServiceError::BadRequest(format!("Amount {} is out of range", amount)))
}

/// `"40.00"` style string used by PayPal amount comparisons.
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", money(amount))
}
