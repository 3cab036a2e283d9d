//! Single-line text forms.
//!
//! Money is written as `"<amount> <identifier>"`. Reading also accepts
//! `"<identifier> <amount>"` and both orders without the space. Without a
//! space, text starting with a digit, a sign or `.` is amount-first;
//! anything else is identifier-first, the identifier ending at the first
//! digit, sign or `.` of its code.

use rust_decimal::Decimal;

use mintage_shared::RoundingMode;

use crate::currency::Currency;
use crate::error::{MoneyError, MoneyResult};
use crate::money::Money;
use crate::registry::Registry;
use crate::resolve::{CurrencyRef, resolve_strict};
use crate::scale::parse_decimal;

/// Canonical text of money.
#[must_use]
pub fn money_to_string(money: &Money) -> String {
    money.to_string()
}

/// Canonical text of a currency: its id.
#[must_use]
pub fn currency_to_string(currency: &Currency) -> String {
    currency.id().to_string()
}

/// Resolves a bare identifier.
///
/// # Errors
///
/// Returns `MoneyError::InvalidRepresentation` for blank text and
/// `MoneyError::CurrencyNotFound` on a miss.
pub fn parse_currency(registry: &Registry, text: &str) -> MoneyResult<Currency> {
    let text = text.trim();
    if text.is_empty() || text.chars().any(char::is_whitespace) {
        return Err(MoneyError::invalid(format!("Invalid currency identifier {text:?}")));
    }
    resolve_strict(registry, &CurrencyRef::from(text))
}

/// Parses money in any accepted layout.
///
/// Without a rounding mode, digits beyond the currency's scale are kept in an
/// overriding-scale currency; with one, the amount is rounded to that scale.
///
/// # Errors
///
/// Returns `MoneyError::InvalidRepresentation` if no layout fits, plus
/// resolution and scaling errors.
pub fn parse_money(registry: &Registry, text: &str, rounding: Option<RoundingMode>) -> MoneyResult<Money> {
    let (amount, identifier) = split_money(text)?;
    let currency = parse_currency(registry, identifier)?;
    super::decoded_money(currency, amount, rounding)
}

fn split_money(text: &str) -> MoneyResult<(Decimal, &str)> {
    let text = text.trim();
    let invalid = || MoneyError::invalid(format!("Invalid money text {text:?}"));
    if text.is_empty() {
        return Err(invalid());
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    match tokens.as_slice() {
        [first, second] => parse_decimal(first)
            .map(|amount| (amount, *second))
            .or_else(|_| parse_decimal(second).map(|amount| (amount, *first)))
            .map_err(|_| invalid()),
        [single] => split_unspaced(single).ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

fn starts_amount(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '+' | '-' | '.')
}

fn split_unspaced(text: &str) -> Option<(Decimal, &str)> {
    let first = text.chars().next()?;
    if starts_amount(first) {
        // Longest numeric prefix that parses.
        let end = text
            .char_indices()
            .find(|(_, c)| !(starts_amount(*c) || *c == '_'))
            .map_or(text.len(), |(i, _)| i);
        let (amount, identifier) = text.split_at(end);
        if identifier.is_empty() {
            return None;
        }
        parse_decimal(amount).ok().map(|amount| (amount, identifier))
    } else {
        // The code starts after the qualifier, which may itself hold digits.
        let code_start = text.rfind('/').map_or(0, |slash| slash + 1);
        let end = text[code_start..]
            .char_indices()
            .skip(1)
            .find(|(_, c)| starts_amount(*c))?
            .0;
        let (identifier, amount) = text.split_at(code_start + end);
        parse_decimal(amount).ok().map(|amount| (amount, identifier))
    }
}
