//! Property-based tests for the scale engine.
//!
//! - Explicit rounding always lands on the requested scale
//! - Exact conversions never change the value
//! - Banker's rounding matches the half-even definition

use proptest::prelude::*;
use rust_decimal::Decimal;

use mintage_shared::RoundingMode;

use super::{apply_scale, divide, set_scale};
use crate::error::MoneyError;

/// Amounts with 0 to 6 fractional digits.
fn amount() -> impl Strategy<Value = Decimal> {
    (-1_000_000_000i64..1_000_000_000i64, 0u32..=6).prop_map(|(m, s)| Decimal::new(m, s))
}

fn target_scale() -> impl Strategy<Value = u32> {
    0u32..=8
}

fn rounding_mode() -> impl Strategy<Value = RoundingMode> {
    prop::sample::select(
        RoundingMode::ALL
            .into_iter()
            .filter(|m| *m != RoundingMode::Unnecessary)
            .collect::<Vec<_>>(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// An explicit rounding mode always succeeds and yields the target scale.
    #[test]
    fn prop_explicit_mode_hits_target_scale(
        value in amount(),
        scale in target_scale(),
        mode in rounding_mode(),
    ) {
        let result = apply_scale(&value, Some(scale), Some(mode)).unwrap();
        prop_assert_eq!(result.scale(), scale);
        let unit = Decimal::new(1, scale);
        prop_assert!((result - value).abs() < unit);
    }

    /// Without a mode, the conversion either preserves the value or fails.
    #[test]
    fn prop_no_mode_is_exact_or_fails(value in amount(), scale in target_scale()) {
        match set_scale(value, scale, None) {
            Ok(result) => {
                prop_assert_eq!(result, value);
                prop_assert_eq!(result.scale(), scale);
            }
            Err(err) => {
                let is_inexact = matches!(err, MoneyError::InexactRounding { .. });
                prop_assert!(is_inexact);
                prop_assert!(value.scale() > scale);
            }
        }
    }

    /// Normalization never changes the numeric value.
    #[test]
    fn prop_normalize_preserves_value(value in amount()) {
        let normalized = apply_scale(&value, None, None).unwrap();
        prop_assert_eq!(normalized, value);
        prop_assert!(normalized.scale() <= value.scale());
    }

    /// Half-even: a midpoint rounds to the neighbour with an even last digit.
    #[test]
    fn prop_half_even_midpoints(whole in -100_000i64..100_000i64) {
        let midpoint = Decimal::new(whole * 10 + 5, 1);
        let rounded = apply_scale(&midpoint, Some(0), Some(RoundingMode::HalfEven)).unwrap();
        prop_assert_eq!(rounded.mantissa() % 2, 0);
    }

    /// Exact division is reversible.
    #[test]
    fn prop_exact_division_reverses(value in amount(), divisor in prop::sample::select(vec![1i64, 2, 4, 5, 8, 10, 20, 25])) {
        let divisor = Decimal::from(divisor);
        let quotient = divide(value, divisor, None).unwrap();
        prop_assert_eq!(quotient * divisor, value);
    }
}
