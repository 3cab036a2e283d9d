//! JSON maps for currencies and money.
//!
//! Minimal forms carry only the id; full forms add the attributes. Decoding
//! always re-resolves against a registry, so a wire value never yields a
//! currency the registry does not know. A full map whose scale differs from
//! the registered one decodes to an overriding-scale copy.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use mintage_shared::RoundingMode;

use crate::currency::Currency;
use crate::error::{MoneyError, MoneyResult};
use crate::money::Money;
use crate::registry::Registry;
use crate::resolve::{ConstraintMap, CurrencyRef, resolve_strict};
use crate::scale::parse_decimal;

/// Keys that may carry the scale in a currency map.
const SCALE_KEYS: [&str; 2] = ["scale", "sc"];

/// Wire form of a currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyRecord {
    /// Textual id, `"CODE"` or `"qualifier/CODE"`.
    pub id: String,
    /// ISO numeric id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric: Option<u32>,
    /// Nominal scale; absent for auto-scaled currencies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    /// Domain tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Kind tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl CurrencyRecord {
    /// The id-only record.
    #[must_use]
    pub fn minimal(currency: &Currency) -> Self {
        Self {
            id: currency.id().to_string(),
            numeric: None,
            scale: None,
            domain: None,
            kind: None,
        }
    }

    /// The record with every attribute.
    #[must_use]
    pub fn full(currency: &Currency) -> Self {
        Self {
            id: currency.id().to_string(),
            numeric: currency.numeric(),
            scale: currency.scale(),
            domain: currency.domain().map(str::to_string),
            kind: currency.kind().map(str::to_string),
        }
    }
}

/// Wire form of money.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MoneyRecord {
    Minimal { currency: String, amount: String },
    Full { currency: CurrencyRecord, amount: String },
}

fn to_value<T: Serialize>(record: &T) -> MoneyResult<Value> {
    serde_json::to_value(record).map_err(|e| MoneyError::invalid(format!("Cannot encode as JSON: {e}")))
}

/// `{"id": "EUR"}`
///
/// # Errors
///
/// Returns `MoneyError::InvalidRepresentation` if the record cannot be encoded.
pub fn currency_to_minimal(currency: &Currency) -> MoneyResult<Value> {
    to_value(&CurrencyRecord::minimal(currency))
}

/// `{"id": "EUR", "numeric": 978, "scale": 2, "domain": "ISO-4217", ...}`
///
/// # Errors
///
/// Returns `MoneyError::InvalidRepresentation` if the record cannot be encoded.
pub fn currency_to_full(currency: &Currency) -> MoneyResult<Value> {
    to_value(&CurrencyRecord::full(currency))
}

/// `{"currency": "EUR", "amount": "12.30"}`
///
/// # Errors
///
/// Returns `MoneyError::InvalidRepresentation` if the record cannot be encoded.
pub fn money_to_minimal(money: &Money) -> MoneyResult<Value> {
    to_value(&MoneyRecord::Minimal {
        currency: money.currency().id().to_string(),
        amount: money.amount().to_string(),
    })
}

/// `{"currency": {<full currency>}, "amount": "12.30"}`
///
/// # Errors
///
/// Returns `MoneyError::InvalidRepresentation` if the record cannot be encoded.
pub fn money_to_full(money: &Money) -> MoneyResult<Value> {
    to_value(&MoneyRecord::Full {
        currency: CurrencyRecord::full(money.currency()),
        amount: money.amount().to_string(),
    })
}

/// Decodes a currency from an identifier string or a currency map.
///
/// # Errors
///
/// Returns `MoneyError::InvalidRepresentation` for other JSON shapes and
/// `MoneyError::CurrencyNotFound` if the registry has no match.
pub fn currency_from_json(registry: &Registry, value: &Value) -> MoneyResult<Currency> {
    match value {
        Value::String(s) if !s.trim().is_empty() => resolve_strict(registry, &CurrencyRef::from(s.trim())),
        Value::Number(n) => {
            let numeric = n
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| MoneyError::invalid(format!("Invalid numeric currency id {n}")))?;
            resolve_strict(registry, &CurrencyRef::Numeric(numeric))
        }
        Value::Object(object) => currency_from_map(registry, object),
        other => Err(MoneyError::invalid(format!("Expected a currency identifier or map, got {other}"))),
    }
}

fn currency_from_map(registry: &Registry, object: &Map<String, Value>) -> MoneyResult<Currency> {
    if object.is_empty() {
        return Err(MoneyError::invalid("Currency map is empty"));
    }
    let mut rest = object.clone();
    let mut scale = None;
    for key in SCALE_KEYS {
        if let Some(raw) = rest.remove(key) {
            scale = Some(scale_value(&raw)?);
        }
    }

    let constraints = ConstraintMap::from_json(&rest)?;
    let currency = resolve_strict(registry, &CurrencyRef::Constraints(constraints))?;
    match scale {
        Some(scale) if scale != currency.scale() => Ok(currency.with_scale(scale)),
        _ => Ok(currency),
    }
}

/// JSON null means auto-scaled.
fn scale_value(raw: &Value) -> MoneyResult<Option<u32>> {
    match raw {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| MoneyError::invalid(format!("Invalid scale {n}"))),
        Value::String(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| MoneyError::invalid(format!("Invalid scale {s:?}"))),
        other => Err(MoneyError::invalid(format!("Invalid scale {other}"))),
    }
}

/// Decodes money from a `{currency, amount}` map.
///
/// Without a rounding mode, digits beyond the currency's scale are kept in an
/// overriding-scale currency; with one, the amount is rounded to that scale.
///
/// # Errors
///
/// Returns `MoneyError::InvalidRepresentation` for a wrong shape or a
/// missing field, plus resolution and scaling errors.
pub fn money_from_json(registry: &Registry, value: &Value, rounding: Option<RoundingMode>) -> MoneyResult<Money> {
    let Value::Object(object) = value else {
        return Err(MoneyError::invalid(format!("Expected a money map, got {value}")));
    };
    let currency = object
        .get("currency")
        .ok_or_else(|| MoneyError::invalid("Money map has no currency"))?;
    let amount = object
        .get("amount")
        .ok_or_else(|| MoneyError::invalid("Money map has no amount"))?;

    let currency = currency_from_json(registry, currency)?;
    super::decoded_money(currency, amount_value(amount)?, rounding)
}

fn amount_value(raw: &Value) -> MoneyResult<Decimal> {
    let text = match raw {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => return Err(MoneyError::invalid(format!("Invalid amount {other}"))),
    };
    parse_decimal(&text).map_err(|_| MoneyError::invalid(format!("Invalid amount {text:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn registry() -> Registry {
        Registry::builtin().unwrap()
    }

    #[test]
    fn test_currency_minimal_and_full() {
        let registry = registry();
        let eth = registry.resolve_strict("crypto/ETH").unwrap();
        assert_eq!(currency_to_minimal(&eth).unwrap(), json!({"id": "crypto/ETH"}));
        let full = currency_to_full(&eth).unwrap();
        assert_eq!(full["id"], json!("crypto/ETH"));
        assert_eq!(full["scale"], json!(18));
        assert_eq!(full["domain"], json!(eth.domain()));
        assert!(full.get("numeric").is_none());
    }

    #[test]
    fn test_currency_round_trip() {
        let registry = registry();
        for id in ["EUR", "JPY", "XAU", "crypto/BTC", "old/PLZ"] {
            let currency = registry.resolve_strict(id).unwrap();
            let full = currency_from_json(&registry, &currency_to_full(&currency).unwrap()).unwrap();
            let minimal = currency_from_json(&registry, &currency_to_minimal(&currency).unwrap()).unwrap();
            assert_eq!(full, currency);
            assert_eq!(minimal, currency);
        }
    }

    #[test]
    fn test_currency_from_string_and_number() {
        let registry = registry();
        let pln = currency_from_json(&registry, &json!("PLN")).unwrap();
        assert_eq!(pln.code(), "PLN");
        assert_eq!(currency_from_json(&registry, &json!(985)).unwrap(), pln);
    }

    #[test]
    fn test_currency_overriding_scale() {
        let registry = registry();
        let decoded = currency_from_json(&registry, &json!({"id": "EUR", "scale": 4})).unwrap();
        assert_eq!(decoded.scale(), Some(4));
        assert_eq!(decoded.numeric(), Some(978));

        let auto = currency_from_json(&registry, &json!({"id": "EUR", "scale": null})).unwrap();
        assert!(auto.is_auto_scaled());
    }

    #[test]
    fn test_currency_bad_shapes() {
        let registry = registry();
        for value in [json!(null), json!([]), json!(true), json!({}), json!(""), json!({"colour": "red"})] {
            assert_eq!(
                currency_from_json(&registry, &value).unwrap_err().error_code(),
                "INVALID_REPRESENTATION",
                "{value}"
            );
        }
        assert!(matches!(
            currency_from_json(&registry, &json!("XYZ")),
            Err(MoneyError::CurrencyNotFound(_))
        ));
    }

    #[test]
    fn test_money_round_trip() {
        let registry = registry();
        let money = Money::new_in(&registry, "PLN", dec!(12.3), None).unwrap();
        let minimal = money_to_minimal(&money).unwrap();
        assert_eq!(minimal, json!({"currency": "PLN", "amount": "12.30"}));
        assert!(money_from_json(&registry, &minimal, None).unwrap().eq_strict(&money));

        let full = money_to_full(&money).unwrap();
        assert_eq!(full["currency"]["numeric"], json!(985));
        assert!(money_from_json(&registry, &full, None).unwrap().eq_strict(&money));
    }

    #[test]
    fn test_money_numeric_amount_and_rounding() {
        let registry = registry();
        let value = json!({"currency": "JPY", "amount": 10.5});
        let kept = money_from_json(&registry, &value, None).unwrap();
        assert_eq!(kept.amount(), dec!(10.5));
        assert_eq!(kept.currency().scale(), Some(1));
        let yen = money_from_json(&registry, &value, Some(RoundingMode::HalfUp)).unwrap();
        assert_eq!(yen.amount(), dec!(11));
        assert_eq!(yen.currency().scale(), Some(0));
    }

    #[test]
    fn test_overriding_scale_money_round_trip() {
        let registry = registry();
        let money = Money::new_in(&registry, "EUR", dec!(1.50), None)
            .unwrap()
            .rescale(4, None)
            .unwrap();
        let money = Money::with_currency(money.currency().clone(), dec!(1.5005), None).unwrap();
        assert_eq!(money.currency().scale(), Some(4));

        let minimal = money_to_minimal(&money).unwrap();
        assert_eq!(minimal, json!({"currency": "EUR", "amount": "1.5005"}));
        let decoded = money_from_json(&registry, &minimal, None).unwrap();
        assert!(decoded.eq_strict(&money));
        assert_eq!(decoded.currency().id(), money.currency().id());

        let decoded = money_from_json(&registry, &money_to_full(&money).unwrap(), None).unwrap();
        assert!(decoded.eq_strict(&money));
        assert_eq!(decoded.currency(), money.currency());
    }

    #[test]
    fn test_money_bad_shapes() {
        let registry = registry();
        for value in [
            json!("12 EUR"),
            json!({"amount": "1"}),
            json!({"currency": "EUR"}),
            json!({"currency": "EUR", "amount": "abc"}),
            json!({"currency": "EUR", "amount": [1]}),
        ] {
            assert_eq!(
                money_from_json(&registry, &value, None).unwrap_err().error_code(),
                "INVALID_REPRESENTATION",
                "{value}"
            );
        }
    }
}
