//! Money value type.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are `rust_decimal::Decimal` values carried together with their
//! currency. For currencies with a nominal scale the amount always has
//! exactly that many fractional digits; auto-scaled currencies keep whatever
//! scale the amount naturally has.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use rust_decimal::Decimal;

use mintage_shared::RoundingMode;

use crate::context;
use crate::currency::Currency;
use crate::error::{MoneyError, MoneyResult};
use crate::registry::Registry;
use crate::resolve::{CurrencyRef, resolve_strict};
use crate::scale::{self, Scalable};

/// A monetary amount in a currency.
#[derive(Debug, Clone)]
pub struct Money {
    currency: Currency,
    amount: Decimal,
}

impl Money {
    /// Creates money in a known currency, bringing the amount to its scale.
    ///
    /// The explicit rounding mode wins over the ambient one.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::InexactRounding` if the amount has more digits
    /// than the currency allows and no rounding mode is in effect.
    pub fn with_currency(
        currency: Currency,
        amount: impl Scalable,
        rounding: Option<RoundingMode>,
    ) -> MoneyResult<Self> {
        let value = amount.to_decimal()?;
        let amount = match currency.scale() {
            Some(scale) => scale::set_scale(value, scale, rounding.or_else(context::rounding_mode))?,
            None => value,
        };
        Ok(Self { currency, amount })
    }

    /// Creates money by resolving a currency reference against a registry.
    ///
    /// An absent reference falls back to the default currency in context.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::CurrencyRequired` without a currency or default,
    /// `MoneyError::CurrencyNotFound` for unknown currencies, and scaling
    /// errors from [`Money::with_currency`].
    pub fn new_in(
        registry: &Registry,
        currency: impl Into<CurrencyRef>,
        amount: impl Scalable,
        rounding: Option<RoundingMode>,
    ) -> MoneyResult<Self> {
        let reference = match currency.into() {
            CurrencyRef::Absent => context::default_currency().ok_or(MoneyError::CurrencyRequired)?,
            other => other,
        };
        let currency = resolve_strict(registry, &reference)?;
        Self::with_currency(currency, amount, rounding)
    }

    /// Creates money against the registry in context.
    ///
    /// # Errors
    ///
    /// See [`Money::new_in`].
    pub fn of(currency: impl Into<CurrencyRef>, amount: impl Scalable) -> MoneyResult<Self> {
        Self::new_in(&context::registry(), currency, amount, None)
    }

    /// Zero in the given currency, at its nominal scale.
    #[must_use]
    pub fn zero(currency: Currency) -> Self {
        let mut amount = Decimal::ZERO;
        if let Some(scale) = currency.scale() {
            amount.rescale(scale);
        }
        Self { currency, amount }
    }

    pub(crate) fn from_parts(currency: Currency, amount: Decimal) -> Self {
        Self { currency, amount }
    }

    /// The currency.
    #[must_use]
    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    /// The amount.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// The amount's scale.
    #[must_use]
    pub fn scale(&self) -> u32 {
        self.amount.scale()
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// Returns true if both amounts are in the same currency (by id).
    #[must_use]
    pub fn same_currency(&self, other: &Self) -> bool {
        self.currency.same_id(&other.currency)
    }

    pub(crate) fn ensure_same_currency(&self, other: &Self) -> MoneyResult<()> {
        if self.same_currency(other) {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch {
                expected: self.currency.id().clone(),
                actual: other.currency.id().clone(),
            })
        }
    }

    // ========== Comparison ==========

    /// Compares two amounts in the same currency by value.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::CurrencyMismatch` for different currencies.
    pub fn compare(&self, other: &Self) -> MoneyResult<Ordering> {
        self.ensure_same_currency(other)?;
        Ok(self.amount.cmp(&other.amount))
    }

    /// Value equality that also requires equal scales.
    #[must_use]
    pub fn eq_strict(&self, other: &Self) -> bool {
        self == other && self.amount.scale() == other.amount.scale()
    }

    /// The smaller amount.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::CurrencyMismatch` for different currencies.
    pub fn min(&self, other: &Self) -> MoneyResult<Self> {
        Ok(match self.compare(other)? {
            Ordering::Greater => other.clone(),
            _ => self.clone(),
        })
    }

    /// The larger amount.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::CurrencyMismatch` for different currencies.
    pub fn max(&self, other: &Self) -> MoneyResult<Self> {
        Ok(match self.compare(other)? {
            Ordering::Less => other.clone(),
            _ => self.clone(),
        })
    }

    // ========== Sign ==========

    /// The negated amount.
    #[must_use]
    pub fn neg(&self) -> Self {
        Self {
            currency: self.currency.clone(),
            amount: -self.amount,
        }
    }

    /// The absolute amount.
    #[must_use]
    pub fn abs(&self) -> Self {
        Self {
            currency: self.currency.clone(),
            amount: self.amount.abs(),
        }
    }

    // ========== Scale ==========

    /// Brings the amount to a new scale, carried by an overriding currency.
    ///
    /// Auto-scaled currencies stay auto-scaled.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::InexactRounding` if digits would be lost without
    /// a rounding mode in effect.
    pub fn rescale(&self, scale: u32, rounding: Option<RoundingMode>) -> MoneyResult<Self> {
        let amount = scale::set_scale(self.amount, scale, rounding.or_else(context::rounding_mode))?;
        let currency = if self.currency.is_auto_scaled() || self.currency.scale() == Some(scale) {
            self.currency.clone()
        } else {
            self.currency.with_scale(Some(scale))
        };
        Ok(Self { currency, amount })
    }

    /// Rounds the value to `scale` fractional digits while keeping the
    /// amount's own scale (e.g. `12.345` to 1 digit gives `12.300`).
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::InexactRounding` if digits would be lost without
    /// a rounding mode in effect.
    pub fn round_to(&self, scale: u32, rounding: Option<RoundingMode>) -> MoneyResult<Self> {
        if scale >= self.amount.scale() {
            return Ok(self.clone());
        }
        let rounded = scale::set_scale(self.amount, scale, rounding.or_else(context::rounding_mode))?;
        let amount = scale::set_scale(rounded, self.amount.scale(), None)?;
        Ok(Self {
            currency: self.currency.clone(),
            amount,
        })
    }

    /// Drops the nominal scale: an auto-scaled currency and a normalized amount.
    #[must_use]
    pub fn strip(&self) -> Self {
        Self {
            currency: self.currency.with_scale(None),
            amount: self.amount.normalize(),
        }
    }

    // ========== Major and minor units ==========

    /// The whole units, truncated toward zero.
    #[must_use]
    pub fn major(&self) -> Decimal {
        scale::integer_part(self.amount)
    }

    /// The fractional part expressed in minor units (e.g. cents).
    #[must_use]
    pub fn minor(&self) -> Decimal {
        let fraction = scale::fractional_part(self.amount);
        Decimal::from_i128_with_scale(fraction.mantissa(), 0)
    }

    /// Major and minor units together.
    #[must_use]
    pub fn major_minor(&self) -> (Decimal, Decimal) {
        (self.major(), self.minor())
    }

    /// The whole amount in minor units (`12.34` gives `1234`).
    #[must_use]
    pub fn in_minor_units(&self) -> Decimal {
        Decimal::from_i128_with_scale(self.amount.mantissa(), 0)
    }

    /// Adds whole units, keeping the minor part.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Validation` on overflow.
    pub fn add_major(&self, units: i64) -> MoneyResult<Self> {
        self.shift(Decimal::from(units))
    }

    /// Subtracts whole units, keeping the minor part.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Validation` on overflow.
    pub fn sub_major(&self, units: i64) -> MoneyResult<Self> {
        self.shift(-Decimal::from(units))
    }

    /// Adds minor units at the amount's scale.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Validation` on overflow.
    pub fn add_minor(&self, units: i64) -> MoneyResult<Self> {
        self.shift(Decimal::new(units, self.amount.scale()))
    }

    /// Subtracts minor units at the amount's scale.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Validation` on overflow.
    pub fn sub_minor(&self, units: i64) -> MoneyResult<Self> {
        self.shift(-Decimal::new(units, self.amount.scale()))
    }

    fn shift(&self, delta: Decimal) -> MoneyResult<Self> {
        let mut amount = self
            .amount
            .checked_add(delta)
            .ok_or_else(|| MoneyError::validation(format!("Overflow adding {delta} to {self}")))?;
        amount.rescale(self.amount.scale());
        Ok(Self {
            currency: self.currency.clone(),
            amount,
        })
    }
}

impl PartialEq for Money {
    /// Same currency id and numerically equal amounts; see [`Money::eq_strict`].
    fn eq(&self, other: &Self) -> bool {
        self.same_currency(other) && self.amount == other.amount
    }
}

impl Eq for Money {}

impl Hash for Money {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.currency.id().hash(state);
        self.amount.normalize().hash(state);
    }
}

impl PartialOrd for Money {
    /// Amounts in different currencies are unordered.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other).ok()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency.id())
    }
}
