//! Currency and country identifiers.
//!
//! A currency id is an optional qualifier plus a code. Codes are always
//! upper-cased (ASCII only); qualifiers keep their case, except the
//! `ISO-4217` marker which is stripped in any case.

use serde::{Deserialize, Serialize};

use crate::error::{MoneyError, MoneyResult};

/// Domain tag of official ISO 4217 currencies (and the stripped id marker).
pub const ISO_4217: &str = "ISO-4217";

/// Separator between qualifier and code in the textual form.
const QUALIFIER_SEPARATOR: char = '/';

/// Globally unique key of a currency within a registry.
///
/// Ordering is `(qualifier, code)` with unqualified ids first; it is the
/// final tie-breaker of every weighted bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyId {
    qualifier: Option<String>,
    code: String,
}

impl CurrencyId {
    /// Creates an id from a qualifier and a code.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Validation` if the code or qualifier is empty or
    /// contains whitespace or a `/`.
    pub fn new(qualifier: Option<&str>, code: &str) -> MoneyResult<Self> {
        Self::normalize(qualifier, code).map(|(id, _)| id)
    }

    /// Parses `"CODE"` or `"qualifier/CODE"`.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Validation` on malformed input.
    pub fn parse(s: &str) -> MoneyResult<Self> {
        let (qualifier, code) = split_identifier(s);
        Self::new(qualifier, code)
    }

    /// Normalizes the parts, reporting whether an `ISO-4217` marker was stripped.
    pub(crate) fn normalize(qualifier: Option<&str>, code: &str) -> MoneyResult<(Self, bool)> {
        let code = code.trim();
        validate_segment("code", code)?;

        let (qualifier, iso_marker) = match qualifier.map(str::trim) {
            None => (None, false),
            Some(q) if q.eq_ignore_ascii_case(ISO_4217) => (None, true),
            Some(q) => {
                validate_segment("qualifier", q)?;
                (Some(q.to_string()), false)
            }
        };

        Ok((
            Self {
                qualifier,
                code: code.to_ascii_uppercase(),
            },
            iso_marker,
        ))
    }

    /// The currency code (upper-case).
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The qualifier, if any.
    #[must_use]
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// Returns true if the id carries a qualifier.
    #[must_use]
    pub fn is_qualified(&self) -> bool {
        self.qualifier.is_some()
    }

    /// Returns true if the code is exactly three upper-case ASCII letters.
    #[must_use]
    pub fn has_iso_shaped_code(&self) -> bool {
        self.code.len() == 3 && self.code.bytes().all(|b| b.is_ascii_uppercase())
    }
}

/// Splits `"qualifier/CODE"` at the last separator; the code never contains one.
pub(crate) fn split_identifier(s: &str) -> (Option<&str>, &str) {
    match s.trim().rsplit_once(QUALIFIER_SEPARATOR) {
        Some((qualifier, code)) => (Some(qualifier), code),
        None => (None, s.trim()),
    }
}

fn validate_segment(what: &str, segment: &str) -> MoneyResult<()> {
    if segment.is_empty() {
        return Err(MoneyError::validation(format!("Currency {what} cannot be empty")));
    }
    if segment
        .chars()
        .any(|c| c.is_whitespace() || c == QUALIFIER_SEPARATOR)
    {
        return Err(MoneyError::validation(format!(
            "Currency {what} contains invalid characters: {segment:?}"
        )));
    }
    Ok(())
}

impl std::fmt::Display for CurrencyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{q}{QUALIFIER_SEPARATOR}{}", self.code),
            None => f.write_str(&self.code),
        }
    }
}

impl std::str::FromStr for CurrencyId {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyId {
    type Error = MoneyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<CurrencyId> for String {
    fn from(id: CurrencyId) -> Self {
        id.to_string()
    }
}

/// Country code (ISO 3166 alpha-2 by convention), upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryId(String);

impl CountryId {
    /// Creates a country id.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Validation` if the code is empty or not alphanumeric.
    pub fn new(code: &str) -> MoneyResult<Self> {
        let code = code.trim();
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(MoneyError::validation(format!("Invalid country code: {code:?}")));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    /// The upper-cased code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CountryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CountryId {
    type Error = MoneyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(&s)
    }
}

impl From<CountryId> for String {
    fn from(id: CountryId) -> Self {
        id.0
    }
}
