//! Splitting amounts using the Largest Remainder Method.
//!
//! The amount is split in minor units of its own scale:
//! 1. Calculate exact shares
//! 2. Truncate each share to the amount's scale
//! 3. Hand the remaining minor units to the shares with the largest
//!    truncated fractions, earliest share first on ties
//!
//! The parts always sum exactly to the original amount.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{MoneyError, MoneyResult};

use super::Money;

impl Money {
    /// Splits the amount proportionally to `ratios`.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Validation` if `ratios` is empty, contains a
    /// negative ratio or sums to zero.
    ///
    /// # Example
    ///
    /// ```
    /// use mintage_core::{Currency, Money};
    /// use rust_decimal_macros::dec;
    ///
    /// let eur = Currency::builder("EUR").numeric(978).scale(2).build().unwrap();
    /// let total = Money::with_currency(eur, dec!(100), None).unwrap();
    /// let parts = total.allocate(&[dec!(1), dec!(1), dec!(1)]).unwrap();
    /// let amounts: Vec<_> = parts.iter().map(Money::amount).collect();
    /// assert_eq!(amounts, vec![dec!(33.34), dec!(33.33), dec!(33.33)]);
    /// ```
    pub fn allocate(&self, ratios: &[Decimal]) -> MoneyResult<Vec<Self>> {
        validate_ratios(ratios)?;
        let scale = self.scale();
        let negative = self.amount().is_sign_negative();
        let shares = split(self.amount().abs(), ratios, scale)?;
        Ok(shares
            .into_iter()
            .map(|share| {
                let amount = if negative { -share } else { share };
                Self::from_parts(self.currency().clone(), amount)
            })
            .collect())
    }

    /// Splits the amount into `parts` equal shares.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Validation` if `parts` is zero.
    pub fn distribute(&self, parts: usize) -> MoneyResult<Vec<Self>> {
        if parts == 0 {
            return Err(MoneyError::validation("Cannot distribute into zero parts"));
        }
        self.allocate(&vec![Decimal::ONE; parts])
    }
}

fn validate_ratios(ratios: &[Decimal]) -> MoneyResult<()> {
    if ratios.is_empty() {
        return Err(MoneyError::validation("At least one ratio is required"));
    }
    if let Some(r) = ratios.iter().find(|r| r.is_sign_negative() && !r.is_zero()) {
        return Err(MoneyError::validation(format!("Ratio {r} is negative")));
    }
    if ratios.iter().all(Decimal::is_zero) {
        return Err(MoneyError::validation("Ratios must not all be zero"));
    }
    Ok(())
}

/// Splits a non-negative `total` at `scale`.
fn split(total: Decimal, ratios: &[Decimal], scale: u32) -> MoneyResult<Vec<Decimal>> {
    let unit = Decimal::new(1, scale);
    let ratio_sum = ratios
        .iter()
        .try_fold(Decimal::ZERO, |acc, r| acc.checked_add(*r))
        .ok_or_else(|| MoneyError::validation("Ratios overflow"))?;

    let exact = ratios
        .iter()
        .map(|r| {
            total
                .checked_mul(*r)
                .and_then(|v| v.checked_div(ratio_sum))
                .ok_or_else(|| MoneyError::validation(format!("Overflow allocating {total} by {r}")))
        })
        .collect::<MoneyResult<Vec<_>>>()?;

    let mut shares: Vec<Decimal> = exact
        .iter()
        .map(|e| {
            let mut base = e.round_dp_with_strategy(scale, RoundingStrategy::ToZero);
            base.rescale(scale);
            base
        })
        .collect();

    let allocated: Decimal = shares.iter().copied().sum();
    let units = ((total - allocated) / unit).trunc().to_usize().unwrap_or(0);
    if units == 0 {
        return Ok(shares);
    }

    // Stable sort keeps earlier shares first among equal fractions.
    let mut order: Vec<(usize, Decimal)> = exact
        .iter()
        .zip(&shares)
        .enumerate()
        .map(|(i, (e, s))| (i, *e - *s))
        .collect();
    order.sort_by(|a, b| b.1.cmp(&a.1));

    for (idx, _) in order.iter().cycle().take(units) {
        shares[*idx] += unit;
    }
    Ok(shares)
}
