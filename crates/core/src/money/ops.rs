//! Money arithmetic.
//!
//! Addition and subtraction require one currency and produce the larger of
//! the operand scales. Multiplication and division chains take at most one
//! monetary operand per product; dividing money by money of the same
//! currency yields a plain number. By default the nominal scale is applied
//! once, at the end of a chain; with `rescale_each` after every step.

use rust_decimal::Decimal;

use mintage_shared::RoundingMode;

use crate::context::ArithOptions;
use crate::currency::Currency;
use crate::error::{MoneyError, MoneyResult};
use crate::scale::{self, Scalable};

use super::Money;

/// One operand of a multiplication or division chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A monetary amount.
    Money(Money),
    /// A plain number.
    Number(Decimal),
}

impl Operand {
    /// Wraps any scalable value as a plain number.
    ///
    /// # Errors
    ///
    /// Propagates conversion errors.
    pub fn number(value: impl Scalable) -> MoneyResult<Self> {
        Ok(Self::Number(value.to_decimal()?))
    }

    /// The monetary value, if any.
    #[must_use]
    pub fn as_money(&self) -> Option<&Money> {
        match self {
            Self::Money(m) => Some(m),
            Self::Number(_) => None,
        }
    }

    /// The plain number, if any.
    #[must_use]
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Money(_) => None,
        }
    }

    /// Converts into money.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Validation` for plain numbers.
    pub fn into_money(self) -> MoneyResult<Money> {
        match self {
            Self::Money(m) => Ok(m),
            Self::Number(n) => Err(MoneyError::validation(format!("Expected money, got the number {n}"))),
        }
    }
}

impl From<Money> for Operand {
    fn from(money: Money) -> Self {
        Self::Money(money)
    }
}

impl From<&Money> for Operand {
    fn from(money: &Money) -> Self {
        Self::Money(money.clone())
    }
}

impl From<Decimal> for Operand {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

fn overflow(op: &str, a: Decimal, b: Decimal) -> MoneyError {
    MoneyError::validation(format!("Overflow computing {a} {op} {b}"))
}

/// Picks the currency carrying `scale`: an operand's own when it matches,
/// otherwise an overriding copy.
fn currency_for_scale(a: &Currency, b: &Currency, scale: u32) -> Currency {
    if a.is_auto_scaled() || a.scale() == Some(scale) {
        a.clone()
    } else if b.scale() == Some(scale) {
        b.clone()
    } else {
        a.with_scale(Some(scale))
    }
}

impl Money {
    /// Adds two amounts in the same currency.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::CurrencyMismatch` for different currencies.
    pub fn add(&self, other: &Self) -> MoneyResult<Self> {
        self.combine(other, "+", Decimal::checked_add)
    }

    /// Subtracts an amount in the same currency.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::CurrencyMismatch` for different currencies.
    pub fn sub(&self, other: &Self) -> MoneyResult<Self> {
        self.combine(other, "-", Decimal::checked_sub)
    }

    fn combine(&self, other: &Self, op: &str, f: fn(Decimal, Decimal) -> Option<Decimal>) -> MoneyResult<Self> {
        self.ensure_same_currency(other)?;
        let (a, b) = (self.amount(), other.amount());
        let scale = a.scale().max(b.scale());
        let mut amount = f(a, b).ok_or_else(|| overflow(op, a, b))?;
        amount.rescale(scale);
        let currency = currency_for_scale(self.currency(), other.currency(), scale);
        Ok(Self::from_parts(currency, amount))
    }

    /// Sums amounts in one currency.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Validation` for an empty input and
    /// `MoneyError::CurrencyMismatch` for mixed currencies.
    pub fn sum<'a>(amounts: impl IntoIterator<Item = &'a Self>) -> MoneyResult<Self> {
        let mut iter = amounts.into_iter();
        let first = iter
            .next()
            .ok_or_else(|| MoneyError::validation("Cannot sum an empty list of amounts"))?;
        iter.try_fold(first.clone(), |total, next| total.add(next))
    }

    /// Multiplies by a plain factor using the ambient arithmetic options.
    ///
    /// # Errors
    ///
    /// See [`multiply`].
    pub fn mul_by(&self, factor: impl Scalable) -> MoneyResult<Self> {
        multiply(
            &[Operand::from(self), Operand::number(factor)?],
            ArithOptions::ambient(),
        )?
        .into_money()
    }

    /// Divides by a plain divisor using the ambient arithmetic options.
    ///
    /// # Errors
    ///
    /// See [`divide`].
    pub fn div_by(&self, divisor: impl Scalable) -> MoneyResult<Self> {
        divide(
            &[Operand::from(self), Operand::number(divisor)?],
            ArithOptions::ambient(),
        )?
        .into_money()
    }

    /// The ratio of two amounts in the same currency.
    ///
    /// # Errors
    ///
    /// See [`divide`].
    pub fn ratio(&self, other: &Self) -> MoneyResult<Decimal> {
        match divide(&[Operand::from(self), Operand::from(other)], ArithOptions::ambient())? {
            Operand::Number(n) => Ok(n),
            Operand::Money(m) => Err(MoneyError::validation(format!("Expected a ratio, got {m}"))),
        }
    }
}

/// Brings an intermediate or final value to the currency's nominal scale.
fn to_nominal(value: Decimal, currency: &Currency, opts: ArithOptions) -> MoneyResult<Decimal> {
    match currency.scale() {
        Some(scale) => scale::set_scale(value, scale, opts.rounding),
        None => Ok(value),
    }
}

/// Multiplies a chain of operands, at most one of which is money.
///
/// # Errors
///
/// Returns `MoneyError::MultipleMonetaryOperands` for a second monetary
/// operand, `MoneyError::InexactRounding` if the result does not fit the
/// currency's scale without rounding, and `MoneyError::Validation` for an
/// empty chain or overflow.
pub fn multiply(operands: &[Operand], opts: ArithOptions) -> MoneyResult<Operand> {
    let (first, rest) = operands
        .split_first()
        .ok_or_else(|| MoneyError::validation("Multiplication needs at least one operand"))?;

    let (mut currency, mut acc) = match first {
        Operand::Money(m) => (Some(m.currency().clone()), m.amount()),
        Operand::Number(n) => (None, *n),
    };

    for operand in rest {
        let factor = match operand {
            Operand::Money(m) => {
                if currency.is_some() {
                    return Err(MoneyError::MultipleMonetaryOperands);
                }
                currency = Some(m.currency().clone());
                m.amount()
            }
            Operand::Number(n) => *n,
        };
        acc = acc.checked_mul(factor).ok_or_else(|| overflow("*", acc, factor))?;
        if opts.rescale_each {
            if let Some(c) = &currency {
                acc = to_nominal(acc, c, opts)?;
            }
        }
    }

    finish(acc, currency, opts)
}

/// Divides the first operand by each following one.
///
/// Money divided by money of the same currency becomes a plain number;
/// a plain number cannot be divided by money.
///
/// # Errors
///
/// Returns `MoneyError::CurrencyMismatch` for money of another currency,
/// `MoneyError::Validation` for division by zero or by money of a plain
/// number, and `MoneyError::InexactRounding` for non-terminating results
/// without a rounding mode.
pub fn divide(operands: &[Operand], opts: ArithOptions) -> MoneyResult<Operand> {
    let (first, rest) = operands
        .split_first()
        .ok_or_else(|| MoneyError::validation("Division needs at least one operand"))?;

    let (mut currency, mut acc) = match first {
        Operand::Money(m) => (Some(m.currency().clone()), m.amount()),
        Operand::Number(n) => (None, *n),
    };

    for operand in rest {
        match operand {
            Operand::Money(m) => {
                let Some(c) = &currency else {
                    return Err(MoneyError::validation(format!("Cannot divide the number {acc} by money")));
                };
                if !c.same_id(m.currency()) {
                    return Err(MoneyError::CurrencyMismatch {
                        expected: c.id().clone(),
                        actual: m.currency().id().clone(),
                    });
                }
                acc = scale::divide(acc, m.amount(), opts.rounding)?;
                currency = None;
            }
            Operand::Number(n) => {
                acc = match &currency {
                    Some(c) if c.scale().is_some() => monetary_quotient(acc, *n, c, opts)?,
                    _ => scale::divide(acc, *n, opts.rounding)?,
                };
            }
        }
    }

    finish(acc, currency, opts)
}

/// Money with a nominal scale divided by a number: the exact quotient when
/// it terminates, otherwise the full-precision quotient left for the final
/// rounding to the nominal scale.
fn monetary_quotient(acc: Decimal, divisor: Decimal, currency: &Currency, opts: ArithOptions) -> MoneyResult<Decimal> {
    let quotient = scale::raw_quotient(acc, divisor)?;
    if scale::is_exact_quotient(acc, divisor, quotient) {
        return if opts.rescale_each { to_nominal(quotient, currency, opts) } else { Ok(quotient) };
    }
    match opts.rounding.and_then(RoundingMode::strategy) {
        Some(_) if opts.rescale_each => to_nominal(quotient, currency, opts),
        Some(_) => Ok(quotient),
        None => Err(MoneyError::InexactRounding {
            value: quotient,
            scale: currency.scale().unwrap_or_default(),
        }),
    }
}

fn finish(acc: Decimal, currency: Option<Currency>, opts: ArithOptions) -> MoneyResult<Operand> {
    match currency {
        Some(c) => {
            let amount = to_nominal(acc, &c, opts)?;
            Ok(Operand::Money(Money::from_parts(c, amount)))
        }
        None => Ok(Operand::Number(acc)),
    }
}
