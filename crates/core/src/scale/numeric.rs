//! Conversion of numeric kinds to exact decimals.

use std::str::FromStr;

use rust_decimal::Decimal;

use super::divide;
use crate::context;
use crate::error::{MoneyError, MoneyResult};

/// A value that can be turned into an exact decimal and therefore scaled.
pub trait Scalable {
    /// Converts the value to an exact decimal.
    ///
    /// Rationals are realized by division using the ambient rounding mode.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Validation` for malformed numerals or non-finite
    /// floats, and `MoneyError::InexactRounding` for non-terminating rationals
    /// when no rounding mode is in effect.
    fn to_decimal(&self) -> MoneyResult<Decimal>;
}

impl Scalable for Decimal {
    fn to_decimal(&self) -> MoneyResult<Decimal> {
        Ok(*self)
    }
}

macro_rules! scalable_int {
    ($($t:ty),*) => {
        $(
            impl Scalable for $t {
                fn to_decimal(&self) -> MoneyResult<Decimal> {
                    Ok(Decimal::from(*self))
                }
            }
        )*
    };
}

scalable_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Scalable for i128 {
    fn to_decimal(&self) -> MoneyResult<Decimal> {
        Decimal::try_from_i128_with_scale(*self, 0)
            .map_err(|_| MoneyError::validation(format!("Integer {self} is out of decimal range")))
    }
}

impl Scalable for f64 {
    /// Floats go through their shortest round-trip text, so `0.1` becomes
    /// exactly `0.1` rather than its binary expansion.
    fn to_decimal(&self) -> MoneyResult<Decimal> {
        if !self.is_finite() {
            return Err(MoneyError::validation(format!(
                "Non-finite float {self} has no decimal value"
            )));
        }
        parse_decimal(&self.to_string())
    }
}

impl Scalable for f32 {
    fn to_decimal(&self) -> MoneyResult<Decimal> {
        if !self.is_finite() {
            return Err(MoneyError::validation(format!(
                "Non-finite float {self} has no decimal value"
            )));
        }
        parse_decimal(&self.to_string())
    }
}

impl Scalable for str {
    fn to_decimal(&self) -> MoneyResult<Decimal> {
        parse_decimal(self)
    }
}

impl Scalable for String {
    fn to_decimal(&self) -> MoneyResult<Decimal> {
        parse_decimal(self)
    }
}

impl<T: Scalable + ?Sized> Scalable for &T {
    fn to_decimal(&self) -> MoneyResult<Decimal> {
        (**self).to_decimal()
    }
}

/// Parses a textual numeral, accepting plain and scientific notation.
///
/// # Errors
///
/// Returns `MoneyError::Validation` if the text is not a number.
pub fn parse_decimal(text: &str) -> MoneyResult<Decimal> {
    let text = text.trim();
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map_err(|_| MoneyError::validation(format!("Invalid numeral: {text:?}")))
}

/// An exact fraction, realized as a decimal only when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    numerator: Decimal,
    denominator: Decimal,
}

impl Rational {
    /// Creates a fraction.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Validation` if the denominator is zero.
    pub fn new(numerator: impl Into<Decimal>, denominator: impl Into<Decimal>) -> MoneyResult<Self> {
        let denominator = denominator.into();
        if denominator.is_zero() {
            return Err(MoneyError::validation("Rational denominator cannot be zero"));
        }
        Ok(Self {
            numerator: numerator.into(),
            denominator,
        })
    }

    /// The numerator.
    #[must_use]
    pub const fn numerator(&self) -> Decimal {
        self.numerator
    }

    /// The denominator.
    #[must_use]
    pub const fn denominator(&self) -> Decimal {
        self.denominator
    }
}

impl Scalable for Rational {
    fn to_decimal(&self) -> MoneyResult<Decimal> {
        divide(self.numerator, self.denominator, context::rounding_mode())
    }
}

impl std::fmt::Display for Rational {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mintage_shared::RoundingMode;
    use rust_decimal_macros::dec;

    #[test]
    fn test_integers_convert_exactly() {
        assert_eq!(42u8.to_decimal().unwrap(), dec!(42));
        assert_eq!((-7i64).to_decimal().unwrap(), dec!(-7));
        assert_eq!(1_000_000_000_000i128.to_decimal().unwrap(), dec!(1000000000000));
    }

    #[test]
    fn test_i128_out_of_range() {
        assert!(i128::MAX.to_decimal().is_err());
    }

    #[test]
    fn test_floats_use_shortest_text() {
        assert_eq!(0.1f64.to_decimal().unwrap(), dec!(0.1));
        assert_eq!(10.5f64.to_decimal().unwrap().scale(), 1);
        assert!(f64::NAN.to_decimal().is_err());
        assert!(f64::INFINITY.to_decimal().is_err());
    }

    #[test]
    fn test_text_numerals() {
        assert_eq!("12.30".to_decimal().unwrap().scale(), 2);
        assert_eq!(" 1_000.5 ".to_decimal().unwrap(), dec!(1000.5));
        assert_eq!("1.5e3".to_decimal().unwrap(), dec!(1500));
        assert!("twelve".to_decimal().is_err());
        assert_eq!(String::from("-3").to_decimal().unwrap(), dec!(-3));
    }

    #[test]
    fn test_terminating_rational_is_exact() {
        let r = Rational::new(dec!(1), dec!(8)).unwrap();
        assert_eq!(r.to_decimal().unwrap(), dec!(0.125));
    }

    #[test]
    fn test_non_terminating_rational_needs_rounding() {
        let r = Rational::new(dec!(1), dec!(3)).unwrap();
        assert!(matches!(
            r.to_decimal(),
            Err(MoneyError::InexactRounding { .. })
        ));

        let realized =
            context::with_rounding(Some(RoundingMode::HalfUp), || r.to_decimal()).unwrap();
        assert!(realized > dec!(0.333) && realized < dec!(0.334));
    }

    #[test]
    fn test_zero_denominator_rejected() {
        assert!(Rational::new(dec!(1), Decimal::ZERO).is_err());
    }
}
