//! Currency resolution.
//!
//! Turns loose references (a currency value, an identifier, a numeric id, a
//! constraint map) into registered currencies. One search routine produces
//! the ordered candidates; `resolve` takes the best, `resolve_all` keeps all
//! of them and `resolve_strict` fails on a miss.

pub mod constraints;

use crate::currency::{Currency, CurrencyId, ISO_4217};
use crate::error::{MoneyError, MoneyResult};
use crate::registry::Registry;

pub use constraints::{Constraint, ConstraintMap};

/// Anything that can denote a currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrencyRef {
    /// A currency value; matched exactly against the registry.
    Currency(Currency),
    /// A textual identifier with its raw qualifier.
    Identifier {
        /// Qualifier as written (`ISO-4217` handled specially).
        qualifier: Option<String>,
        /// Code as written.
        code: String,
    },
    /// A numeric id.
    Numeric(u32),
    /// Attribute constraints.
    Constraints(ConstraintMap),
    /// No currency given.
    Absent,
}

impl From<&str> for CurrencyRef {
    fn from(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            return Self::Absent;
        }
        if s.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(numeric) = s.parse() {
                return Self::Numeric(numeric);
            }
        }
        let (qualifier, code) = crate::currency::id::split_identifier(s);
        Self::Identifier {
            qualifier: qualifier.map(str::to_string),
            code: code.to_string(),
        }
    }
}

impl From<&String> for CurrencyRef {
    fn from(s: &String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<String> for CurrencyRef {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<u32> for CurrencyRef {
    fn from(numeric: u32) -> Self {
        Self::Numeric(numeric)
    }
}

impl From<CurrencyId> for CurrencyRef {
    fn from(id: CurrencyId) -> Self {
        Self::Identifier {
            qualifier: id.qualifier().map(str::to_string),
            code: id.code().to_string(),
        }
    }
}

impl From<&CurrencyId> for CurrencyRef {
    fn from(id: &CurrencyId) -> Self {
        Self::from(id.clone())
    }
}

impl From<Currency> for CurrencyRef {
    fn from(currency: Currency) -> Self {
        Self::Currency(currency)
    }
}

impl From<&Currency> for CurrencyRef {
    fn from(currency: &Currency) -> Self {
        Self::Currency(currency.clone())
    }
}

impl From<ConstraintMap> for CurrencyRef {
    fn from(map: ConstraintMap) -> Self {
        Self::Constraints(map)
    }
}

impl<T: Into<Self>> From<Option<T>> for CurrencyRef {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Into::into)
    }
}

impl std::fmt::Display for CurrencyRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Currency(c) => write!(f, "{c}"),
            Self::Identifier {
                qualifier: Some(q),
                code,
            } => write!(f, "{q}/{code}"),
            Self::Identifier { qualifier: None, code } => f.write_str(code),
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Constraints(m) => write!(f, "{m}"),
            Self::Absent => f.write_str("<none>"),
        }
    }
}

/// Ordered candidates for a reference, best first.
#[must_use]
pub fn search(registry: &Registry, reference: &CurrencyRef) -> Vec<Currency> {
    match reference {
        CurrencyRef::Absent => Vec::new(),
        CurrencyRef::Currency(currency) => exact(registry, currency).into_iter().collect(),
        CurrencyRef::Identifier { qualifier, code } => by_identifier(registry, qualifier.as_deref(), code),
        CurrencyRef::Numeric(numeric) => registry
            .numeric_bucket(*numeric)
            .into_iter()
            .flatten()
            .cloned()
            .collect(),
        CurrencyRef::Constraints(map) => map.search(registry),
    }
}

/// The best match, or `None`.
#[must_use]
pub fn resolve(registry: &Registry, reference: &CurrencyRef) -> Option<Currency> {
    search(registry, reference).into_iter().next()
}

/// Every match, best first; empty on a miss.
#[must_use]
pub fn resolve_all(registry: &Registry, reference: &CurrencyRef) -> Vec<Currency> {
    search(registry, reference)
}

/// The best match.
///
/// # Errors
///
/// Returns `MoneyError::CurrencyRequired` for an absent reference and
/// `MoneyError::CurrencyNotFound` on a miss.
pub fn resolve_strict(registry: &Registry, reference: &CurrencyRef) -> MoneyResult<Currency> {
    if matches!(reference, CurrencyRef::Absent) {
        return Err(MoneyError::CurrencyRequired);
    }
    resolve(registry, reference).ok_or_else(|| MoneyError::not_found(reference))
}

/// Returns true if the reference resolves to at least one currency.
#[must_use]
pub fn is_defined(registry: &Registry, reference: &CurrencyRef) -> bool {
    !search(registry, reference).is_empty()
}

/// A registered currency equal in id, numeric id and scale; domain and kind
/// only constrain when the wanted currency carries them. On an id miss the numeric
/// bucket is scanned for a currency agreeing on everything but the id.
fn exact(registry: &Registry, wanted: &Currency) -> Option<Currency> {
    let attributes_agree = |candidate: &Currency| {
        candidate.numeric() == wanted.numeric()
            && candidate.scale() == wanted.scale()
            && wanted.domain().is_none_or(|d| candidate.domain() == Some(d))
            && wanted.kind().is_none_or(|k| candidate.kind() == Some(k))
    };

    if let Some(found) = registry.get(wanted.id()).filter(|c| attributes_agree(c)) {
        return Some(found.clone());
    }
    wanted
        .numeric()
        .and_then(|n| registry.numeric_bucket(n))
        .and_then(|bucket| bucket.iter().find(|c| attributes_agree(c)))
        .cloned()
}

fn by_identifier(registry: &Registry, qualifier: Option<&str>, code: &str) -> Vec<Currency> {
    let code = code.trim();
    match qualifier.map(str::trim) {
        Some(q) if q.eq_ignore_ascii_case(ISO_4217) => unqualified(registry, code)
            .into_iter()
            .filter(Currency::is_iso)
            .collect(),
        Some(q) => CurrencyId::new(Some(q), code)
            .ok()
            .and_then(|id| registry.get(&id).cloned())
            .into_iter()
            .collect(),
        None => unqualified(registry, code),
    }
}

/// Code bucket first (qualified currencies included), then the bare id.
fn unqualified(registry: &Registry, code: &str) -> Vec<Currency> {
    if let Some(bucket) = registry.code_bucket(code) {
        return bucket.iter().cloned().collect();
    }
    CurrencyId::new(None, code)
        .ok()
        .and_then(|id| registry.get(&id).cloned())
        .into_iter()
        .collect()
}

impl Registry {
    /// Soft resolution against this registry.
    #[must_use]
    pub fn resolve(&self, reference: impl Into<CurrencyRef>) -> Option<Currency> {
        resolve(self, &reference.into())
    }

    /// All matches against this registry, best first.
    #[must_use]
    pub fn resolve_all(&self, reference: impl Into<CurrencyRef>) -> Vec<Currency> {
        resolve_all(self, &reference.into())
    }

    /// Strict resolution against this registry.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::CurrencyNotFound` on a miss.
    pub fn resolve_strict(&self, reference: impl Into<CurrencyRef>) -> MoneyResult<Currency> {
        resolve_strict(self, &reference.into())
    }

    /// Returns true if the reference resolves.
    #[must_use]
    pub fn is_defined(&self, reference: impl Into<CurrencyRef>) -> bool {
        is_defined(self, &reference.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn registry() -> Registry {
        let currencies = [
            Currency::builder("PLN").numeric(985).scale(2).build().unwrap(),
            Currency::builder("EUR").numeric(978).scale(2).build().unwrap(),
            Currency::builder("XYZ").scale(2).build().unwrap(),
            Currency::builder("crypto/ETH").scale(18).domain("CRYPTO").build().unwrap(),
            Currency::builder("crypto/USDT").scale(6).domain("CRYPTO").kind("stable").build().unwrap(),
            Currency::builder("legacy/EUR").numeric(978).scale(2).domain("LEGACY").build().unwrap().with_weight(5),
        ];
        currencies
            .into_iter()
            .try_fold(Registry::new(), |r, c| r.add_currency(c))
            .unwrap()
    }

    fn code(c: &Currency) -> String {
        c.id().to_string()
    }

    #[rstest]
    #[case("PLN", "PLN")]
    #[case("pln", "PLN")]
    #[case("ISO-4217/PLN", "PLN")]
    #[case("XYZ", "XYZ")]
    #[case("ETH", "crypto/ETH")]
    #[case("crypto/ETH", "crypto/ETH")]
    #[case("crypto/eth", "crypto/ETH")]
    #[case("978", "EUR")]
    fn test_resolves(#[case] input: &str, #[case] expected: &str) {
        let found = registry().resolve(input).unwrap();
        assert_eq!(code(&found), expected);
    }

    #[rstest]
    #[case("ISO-4217/XYZ")]
    #[case("ISO-4217/ETH")]
    #[case("Crypto/ETH")]
    #[case("QQQ")]
    #[case("1")]
    fn test_misses(#[case] input: &str) {
        let registry = registry();
        assert!(registry.resolve(input).is_none());
        assert!(!registry.is_defined(input));
        assert!(matches!(
            registry.resolve_strict(input),
            Err(MoneyError::CurrencyNotFound(_))
        ));
    }

    #[test]
    fn test_numeric_bucket_in_weight_order() {
        let all: Vec<String> = registry().resolve_all(978u32).iter().map(code).collect();
        assert_eq!(all, vec!["EUR", "legacy/EUR"]);
    }

    #[test]
    fn test_code_bucket_spans_qualifiers() {
        let all: Vec<String> = registry().resolve_all("EUR").iter().map(code).collect();
        assert_eq!(all, vec!["EUR", "legacy/EUR"]);
    }

    #[test]
    fn test_exact_currency_match() {
        let registry = registry();
        let wanted = Currency::builder("EUR").numeric(978).scale(2).build().unwrap();
        assert_eq!(code(&registry.resolve(&wanted).unwrap()), "EUR");

        let wrong_scale = wanted.with_scale(Some(4));
        assert!(registry.resolve(wrong_scale).is_none());
    }

    #[test]
    fn test_exact_falls_back_to_numeric_bucket() {
        let registry = [
            Currency::builder("AAA").numeric(999).scale(2).build().unwrap(),
            Currency::builder("BBB").numeric(999).scale(4).build().unwrap(),
        ]
        .into_iter()
        .try_fold(Registry::new(), |r, c| r.add_currency(c))
        .unwrap();

        let wanted = Currency::builder("ZZZ").numeric(999).scale(2).build().unwrap();
        assert_eq!(code(&registry.resolve(&wanted).unwrap()), "AAA");
        let wanted = Currency::builder("ZZZ").numeric(999).scale(4).build().unwrap();
        assert_eq!(code(&registry.resolve(&wanted).unwrap()), "BBB");
        let wanted = Currency::builder("ZZZ").numeric(999).scale(0).build().unwrap();
        assert!(registry.resolve(wanted).is_none());
        let unnumbered = Currency::builder("ZZZ").scale(2).build().unwrap();
        assert!(registry.resolve(unnumbered).is_none());
    }

    #[test]
    fn test_exact_match_ignores_absent_kind() {
        let registry = registry();
        let wanted = Currency::builder("crypto/USDT").scale(6).domain("CRYPTO").build().unwrap();
        assert_eq!(code(&registry.resolve(wanted).unwrap()), "crypto/USDT");

        let wanted = Currency::builder("crypto/USDT")
            .scale(6)
            .domain("CRYPTO")
            .kind("volatile")
            .build()
            .unwrap();
        assert!(registry.resolve(wanted).is_none());
    }

    #[test]
    fn test_absent_reference() {
        let registry = registry();
        assert!(registry.resolve(CurrencyRef::Absent).is_none());
        assert_eq!(registry.resolve_strict(None::<&str>), Err(MoneyError::CurrencyRequired));
        assert_eq!(CurrencyRef::from("  "), CurrencyRef::Absent);
    }

    #[test]
    fn test_digit_strings_are_numeric() {
        assert_eq!(CurrencyRef::from("978"), CurrencyRef::Numeric(978));
        assert!(matches!(CurrencyRef::from("X978"), CurrencyRef::Identifier { .. }));
    }

    #[test]
    fn test_constraints_by_domain_sorted() {
        let map = ConstraintMap::new().with_domain("crypto");
        let all: Vec<String> = registry().resolve_all(map).iter().map(code).collect();
        assert_eq!(all, vec!["crypto/ETH", "crypto/USDT"]);
    }

    #[test]
    fn test_constraints_null_means_absent() {
        let map = ConstraintMap::new().with_domain("crypto").without_kind();
        let all: Vec<String> = registry().resolve_all(map).iter().map(code).collect();
        assert_eq!(all, vec!["crypto/ETH"]);

        let map = ConstraintMap::new().without_numeric().with_scale(2);
        let all: Vec<String> = registry().resolve_all(map).iter().map(code).collect();
        assert_eq!(all, vec!["XYZ"]);
    }

    #[test]
    fn test_constraints_union_of_hints_then_filter() {
        let map = ConstraintMap::from_pairs([("nr", Some("978")), ("do", Some("legacy"))]).unwrap();
        let all: Vec<String> = registry().resolve_all(map).iter().map(code).collect();
        assert_eq!(all, vec!["legacy/EUR"]);

        let map = ConstraintMap::from_pairs([("code", Some("eth")), ("sc", Some("18"))]).unwrap();
        assert_eq!(code(&registry().resolve(map).unwrap()), "crypto/ETH");
    }

    #[test]
    fn test_conflicting_aliases_match_nothing() {
        let map = ConstraintMap::from_pairs([("numeric", Some("978")), ("nr", Some("985"))]).unwrap();
        assert!(map.is_conflicting());
        assert!(registry().resolve_all(map).is_empty());

        let agreeing = ConstraintMap::from_pairs([("scale", Some("2")), ("sc", Some("2"))]).unwrap();
        assert!(!agreeing.is_conflicting());
    }

    #[test]
    fn test_constraint_key_errors() {
        assert!(matches!(
            ConstraintMap::from_pairs([("colour", Some("red"))]),
            Err(MoneyError::InvalidRepresentation(_))
        ));
        assert!(matches!(
            ConstraintMap::from_pairs([("scale", Some("two"))]),
            Err(MoneyError::InvalidRepresentation(_))
        ));
    }

    #[test]
    fn test_constraints_from_json() {
        let value = serde_json::json!({ "id": "crypto/USDT", "numeric": null, "kind": "stable" });
        let map = ConstraintMap::from_json(value.as_object().unwrap()).unwrap();
        assert_eq!(code(&registry().resolve(map).unwrap()), "crypto/USDT");

        let value = serde_json::json!({ "id": ["EUR"] });
        assert!(ConstraintMap::from_json(value.as_object().unwrap()).is_err());
    }

    #[test]
    fn test_constraint_id_keeps_iso_qualifier() {
        let registry = registry();
        let value = serde_json::json!({ "id": "ISO-4217/XYZ" });
        let map = ConstraintMap::from_json(value.as_object().unwrap()).unwrap();
        assert!(registry.resolve(map).is_none());

        let value = serde_json::json!({ "id": "iso-4217/pln" });
        let map = ConstraintMap::from_json(value.as_object().unwrap()).unwrap();
        assert_eq!(code(&registry.resolve(map).unwrap()), "PLN");

        let map = ConstraintMap::from_pairs([("id", Some("ISO-4217/EUR")), ("domain", Some("legacy"))]).unwrap();
        assert!(map.is_conflicting());
    }

    #[test]
    fn test_empty_constraints_list_everything() {
        assert_eq!(registry().resolve_all(ConstraintMap::new()).len(), 6);
    }

    #[test]
    fn test_display() {
        assert_eq!(CurrencyRef::from("crypto/ETH").to_string(), "crypto/ETH");
        let map = ConstraintMap::new().with_code("eur").without_domain();
        assert_eq!(map.to_string(), "{code=EUR, domain=nil}");
    }
}
