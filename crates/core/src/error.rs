//! Error types for currency, registry and money operations.
//!
//! Every failure is synchronous and surfaced immediately. Soft queries never
//! produce these errors; they return `None` or empty collections instead.

use rust_decimal::Decimal;
use thiserror::Error;

use mintage_shared::AppError;

use crate::currency::{Currency, CurrencyId};

/// Result type alias using `MoneyError`.
pub type MoneyResult<T> = Result<T, MoneyError>;

/// Errors that can occur during currency and money operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MoneyError {
    // ========== Construction Errors ==========
    /// Malformed construction input, domain/qualifier conflict, or an
    /// invalid or cyclic hierarchy specification.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A monetary value was requested without a currency and no default is set.
    #[error("Currency required: no currency given and no default currency set")]
    CurrencyRequired,

    // ========== Registry Errors ==========
    /// Registration of an id that is already present (not in update mode).
    #[error("Currency {} already exists in the registry", .0.id())]
    DuplicateCurrency(Box<Currency>),

    /// Strict resolution miss or a mutator precondition failure.
    #[error("Currency not found: {0}")]
    CurrencyNotFound(String),

    // ========== Arithmetic Errors ==========
    /// Operands carry different currencies.
    #[error("Currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch {
        /// Currency of the left-hand operand.
        expected: CurrencyId,
        /// Currency of the offending operand.
        actual: CurrencyId,
    },

    /// More than one monetary operand in a multiplication step.
    #[error("Only one operand of a multiplication may be monetary")]
    MultipleMonetaryOperands,

    /// Digits would be lost and no rounding mode is in effect.
    #[error("Rounding necessary to bring {value} to scale {scale}")]
    InexactRounding {
        /// The value that could not be represented exactly.
        value: Decimal,
        /// The requested scale (or division precision budget).
        scale: u32,
    },

    // ========== Representation Errors ==========
    /// Wrong wire shape or missing required field.
    #[error("Invalid representation: {0}")]
    InvalidRepresentation(String),
}

impl MoneyError {
    /// Returns the stable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::CurrencyRequired => "CURRENCY_REQUIRED",
            Self::DuplicateCurrency(_) => "DUPLICATE_CURRENCY",
            Self::CurrencyNotFound(_) => "CURRENCY_NOT_FOUND",
            Self::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            Self::MultipleMonetaryOperands => "MULTIPLE_MONETARY_OPERANDS",
            Self::InexactRounding { .. } => "INEXACT_ROUNDING",
            Self::InvalidRepresentation(_) => "INVALID_REPRESENTATION",
        }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn not_found(what: impl std::fmt::Display) -> Self {
        Self::CurrencyNotFound(what.to_string())
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRepresentation(msg.into())
    }
}

impl From<MoneyError> for AppError {
    fn from(err: MoneyError) -> Self {
        match err {
            MoneyError::CurrencyNotFound(_) => Self::NotFound(err.to_string()),
            MoneyError::DuplicateCurrency(_) => Self::Conflict(err.to_string()),
            _ => Self::Validation(err.to_string()),
        }
    }
}
