//! Scale engine.
//!
//! Turns numeric kinds into decimals and brings decimals to a target scale.
//! Without a target scale values are normalized (trailing zeros stripped).
//! With a target scale and no rounding mode the conversion must be exact;
//! otherwise `MoneyError::InexactRounding` is raised.

pub mod numeric;

#[cfg(test)]
mod props;

use rust_decimal::{Decimal, RoundingStrategy};

use mintage_shared::RoundingMode;

use crate::context;
use crate::currency::MAX_SCALE;
use crate::error::{MoneyError, MoneyResult};

pub use numeric::{Rational, Scalable, parse_decimal};

/// Maximum number of significant digits a decimal can carry.
const MAX_PRECISION: u32 = 28;

/// Returns the scale a value has once converted to a decimal.
///
/// # Errors
///
/// Propagates conversion errors from [`Scalable::to_decimal`].
pub fn scale_of<S: Scalable + ?Sized>(value: &S) -> MoneyResult<u32> {
    Ok(value.to_decimal()?.scale())
}

/// Applies a scale to any scalable value.
///
/// `scale == None` normalizes the value. Otherwise the explicit rounding mode
/// is used, falling back to the ambient one.
///
/// # Errors
///
/// Returns `MoneyError::InexactRounding` if digits would be lost and no mode
/// is in effect (or the mode is `Unnecessary`).
pub fn apply_scale<S: Scalable + ?Sized>(
    value: &S,
    scale: Option<u32>,
    rounding: Option<RoundingMode>,
) -> MoneyResult<Decimal> {
    let value = value.to_decimal()?;
    match scale {
        None => Ok(value.normalize()),
        Some(scale) => set_scale(value, scale, rounding.or_else(context::rounding_mode)),
    }
}

/// Brings a decimal to exactly `scale` fractional digits.
///
/// Only the given rounding mode is consulted; callers resolve ambient
/// defaults themselves.
///
/// # Errors
///
/// Returns `MoneyError::Validation` for a scale above [`MAX_SCALE`] and
/// `MoneyError::InexactRounding` when digits would be lost without a mode.
pub fn set_scale(value: Decimal, scale: u32, rounding: Option<RoundingMode>) -> MoneyResult<Decimal> {
    if scale > MAX_SCALE {
        return Err(MoneyError::validation(format!(
            "Scale {scale} exceeds the maximum of {MAX_SCALE}"
        )));
    }

    let rounded = if value.scale() <= scale {
        value
    } else {
        match rounding.and_then(RoundingMode::strategy) {
            Some(strategy) => value.round_dp_with_strategy(scale, strategy),
            None => {
                let truncated = value.round_dp_with_strategy(scale, RoundingStrategy::ToZero);
                if truncated != value {
                    return Err(MoneyError::InexactRounding { value, scale });
                }
                truncated
            }
        }
    };

    let mut scaled = rounded;
    scaled.rescale(scale);
    if scaled != rounded {
        return Err(MoneyError::validation(format!(
            "Value {value} cannot carry {scale} fractional digits"
        )));
    }
    Ok(scaled)
}

/// Divides two decimals exactly, or within a precision budget when a
/// rounding mode is given.
///
/// The budget is `min(28, prec(dividend) + ceil(10 * prec(divisor) / 3))`
/// significant digits.
///
/// # Errors
///
/// Returns `MoneyError::Validation` on division by zero or overflow and
/// `MoneyError::InexactRounding` when the quotient does not terminate and no
/// rounding mode is given.
pub fn divide(dividend: Decimal, divisor: Decimal, rounding: Option<RoundingMode>) -> MoneyResult<Decimal> {
    let quotient = raw_quotient(dividend, divisor)?;
    if is_exact_quotient(dividend, divisor, quotient) {
        return Ok(quotient);
    }

    let budget = division_precision(dividend, divisor);
    match rounding.and_then(RoundingMode::strategy) {
        Some(strategy) => quotient
            .round_sf_with_strategy(budget, strategy)
            .ok_or_else(|| MoneyError::validation(format!("Cannot round {quotient} to {budget} digits"))),
        None => Err(MoneyError::InexactRounding {
            value: quotient,
            scale: budget,
        }),
    }
}

/// Full-precision quotient (28 significant digits at most).
pub(crate) fn raw_quotient(dividend: Decimal, divisor: Decimal) -> MoneyResult<Decimal> {
    if divisor.is_zero() {
        return Err(MoneyError::validation("Division by zero"));
    }
    dividend
        .checked_div(divisor)
        .ok_or_else(|| MoneyError::validation(format!("Overflow dividing {dividend} by {divisor}")))
}

pub(crate) fn is_exact_quotient(dividend: Decimal, divisor: Decimal, quotient: Decimal) -> bool {
    quotient
        .checked_mul(divisor)
        .is_some_and(|product| product == dividend)
}

/// Number of significant digits of a decimal (at least one).
#[must_use]
pub fn precision(value: Decimal) -> u32 {
    let mut mantissa = value.mantissa().unsigned_abs();
    let mut digits = 1;
    while mantissa >= 10 {
        mantissa /= 10;
        digits += 1;
    }
    digits
}

/// Precision budget for dividing `dividend` by `divisor`.
#[must_use]
pub fn division_precision(dividend: Decimal, divisor: Decimal) -> u32 {
    let extra = (10 * precision(divisor)).div_ceil(3);
    (precision(dividend) + extra).min(MAX_PRECISION)
}

/// The integer part, truncated toward zero.
#[must_use]
pub fn integer_part(value: Decimal) -> Decimal {
    value.trunc()
}

/// The fractional part, keeping the sign and scale of the value.
#[must_use]
pub fn fractional_part(value: Decimal) -> Decimal {
    value.fract()
}

/// Plain (non-scientific) text of a decimal, trailing zeros preserved.
#[must_use]
pub fn to_plain_string(value: Decimal) -> String {
    value.to_string()
}
