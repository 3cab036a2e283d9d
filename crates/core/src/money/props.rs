//! Property-based tests for money arithmetic.
//!
//! - Addition keeps the larger operand scale and is exact
//! - Allocation parts always sum to the original amount
//! - Division by a factor then multiplication by it round-trips when exact

use proptest::prelude::*;
use rust_decimal::Decimal;

use mintage_shared::RoundingMode;

use super::{Money, Operand, multiply};
use crate::context::ArithOptions;
use crate::currency::Currency;

fn eur() -> Currency {
    Currency::builder("EUR").numeric(978).scale(2).build().unwrap()
}

/// Strategy to generate amounts (-1,000,000.00 to 1,000,000.00).
fn amount() -> impl Strategy<Value = Decimal> {
    (-100_000_000i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate amounts with 0 to 6 fractional digits.
fn free_amount() -> impl Strategy<Value = Decimal> {
    (-1_000_000_000i64..1_000_000_000i64, 0u32..=6).prop_map(|(m, s)| Decimal::new(m, s))
}

/// Strategy to generate 1 to 10 non-negative ratios with a positive sum.
fn ratios() -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec(0u32..100, 1..10)
        .prop_filter("ratios sum to zero", |values| values.iter().any(|v| *v > 0))
        .prop_map(|values| values.into_iter().map(Decimal::from).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Sums of auto-scaled amounts are exact at the larger scale.
    #[test]
    fn prop_add_scale_is_max(a in free_amount(), b in free_amount()) {
        let auto = eur().with_scale(None);
        let x = Money::with_currency(auto.clone(), a, None).unwrap();
        let y = Money::with_currency(auto, b, None).unwrap();
        let sum = x.add(&y).unwrap();
        prop_assert_eq!(sum.scale(), a.scale().max(b.scale()));
        prop_assert_eq!(sum.amount(), a + b);
        prop_assert_eq!(sum.sub(&y).unwrap().amount(), a);
    }

    /// Allocation parts sum exactly to the total.
    #[test]
    fn prop_allocation_sum_invariant(total in amount(), ratios in ratios()) {
        let money = Money::with_currency(eur(), total, None).unwrap();
        let parts = money.allocate(&ratios).unwrap();
        prop_assert_eq!(parts.len(), ratios.len());
        prop_assert!(parts.iter().all(|p| p.scale() == 2));
        prop_assert_eq!(Money::sum(&parts).unwrap().amount(), total);
    }

    /// Equal shares never differ by more than one minor unit.
    #[test]
    fn prop_distribute_is_fair(total in amount(), count in 1usize..50) {
        let money = Money::with_currency(eur(), total, None).unwrap();
        let parts = money.distribute(count).unwrap();
        let min = parts.iter().map(Money::amount).min().unwrap();
        let max = parts.iter().map(Money::amount).max().unwrap();
        prop_assert!(max - min <= Decimal::new(1, 2));
    }

    /// Multiplication always lands on the nominal scale with a rounding mode.
    #[test]
    fn prop_multiply_hits_nominal_scale(total in amount(), factor in free_amount()) {
        let money = Money::with_currency(eur(), total, None).unwrap();
        let opts = ArithOptions::default().with_rounding(Some(RoundingMode::HalfEven));
        let product = multiply(&[Operand::Money(money), Operand::Number(factor)], opts)
            .unwrap()
            .into_money()
            .unwrap();
        prop_assert_eq!(product.scale(), 2);
    }
}
