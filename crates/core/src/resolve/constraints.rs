//! Constraint maps: currencies described by attribute values.
//!
//! Each attribute is either absent (no constraint), present with a value
//! (must equal) or present as null (must have no value). Loose keys accept
//! short aliases; two aliases of the same key with different values make the
//! map unsatisfiable.

use std::borrow::Borrow;
use std::collections::BTreeMap;

use serde_json::Value;

use crate::currency::id::split_identifier;
use crate::currency::{Currency, CurrencyId, ISO_4217};
use crate::error::{MoneyError, MoneyResult};
use crate::registry::Registry;
use crate::registry::bucket::compare;

use super::{CurrencyRef, search};

/// A present constraint: an exact value, or an explicit null.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint<T> {
    /// The attribute must be absent.
    Null,
    /// The attribute must equal this value.
    Value(T),
}

/// Attribute constraints describing zero or more currencies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintMap {
    id: Option<Constraint<CurrencyId>>,
    code: Option<Constraint<String>>,
    numeric: Option<Constraint<u32>>,
    scale: Option<Constraint<u32>>,
    domain: Option<Constraint<String>>,
    kind: Option<Constraint<String>>,
    weight: Option<Constraint<i32>>,
    conflicting: bool,
}

/// Canonical constraint keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Id,
    Code,
    Numeric,
    Scale,
    Domain,
    Kind,
    Weight,
}

impl Key {
    fn parse(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "id" => Some(Self::Id),
            "code" => Some(Self::Code),
            "numeric" | "nr" | "numeric-id" | "numeric_id" => Some(Self::Numeric),
            "scale" | "sc" => Some(Self::Scale),
            "domain" | "do" => Some(Self::Domain),
            "kind" | "ki" => Some(Self::Kind),
            "weight" | "we" => Some(Self::Weight),
            _ => None,
        }
    }
}

fn set<T: PartialEq>(slot: &mut Option<Constraint<T>>, value: Constraint<T>, conflicting: &mut bool) {
    match slot {
        Some(existing) if *existing != value => *conflicting = true,
        Some(_) => {}
        None => *slot = Some(value),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> MoneyResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| MoneyError::invalid(format!("Constraint {key} expects an integer, got {raw:?}")))
}

impl ConstraintMap {
    /// An empty map (matches every currency).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from loose `(key, value)` pairs; `None` values mean null.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::InvalidRepresentation` for unknown keys or values
    /// of the wrong shape.
    pub fn from_pairs<I, K, V>(pairs: I) -> MoneyResult<Self>
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut map = Self::new();
        for (key, value) in pairs {
            let key = key.as_ref();
            let canonical =
                Key::parse(key).ok_or_else(|| MoneyError::invalid(format!("Unknown constraint key {key:?}")))?;
            map.insert(canonical, key, value.as_ref().map(AsRef::as_ref))?;
        }
        Ok(map)
    }

    /// Builds a map from a JSON object; JSON null means "must be absent".
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::InvalidRepresentation` for unknown keys or
    /// non-scalar values.
    pub fn from_json(object: &serde_json::Map<String, Value>) -> MoneyResult<Self> {
        let pairs = object
            .iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::Null => None,
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    other => {
                        return Err(MoneyError::invalid(format!(
                            "Constraint {key} must be a string, number or null, got {other}"
                        )));
                    }
                };
                Ok((key.clone(), text))
            })
            .collect::<MoneyResult<Vec<_>>>()?;
        Self::from_pairs(pairs)
    }

    fn insert(&mut self, key: Key, name: &str, value: Option<&str>) -> MoneyResult<()> {
        let conflicting = &mut self.conflicting;
        match (key, value) {
            (Key::Id, None) => set(&mut self.id, Constraint::Null, conflicting),
            (Key::Id, Some(v)) => {
                let (qualifier, code) = split_identifier(v);
                let (id, iso_marker) =
                    CurrencyId::normalize(qualifier, code).map_err(|e| MoneyError::invalid(e.to_string()))?;
                set(&mut self.id, Constraint::Value(id), conflicting);
                if iso_marker {
                    set(&mut self.domain, Constraint::Value(ISO_4217.to_string()), conflicting);
                }
            }
            (Key::Code, None) => set(&mut self.code, Constraint::Null, conflicting),
            (Key::Code, Some(v)) => set(&mut self.code, Constraint::Value(v.trim().to_ascii_uppercase()), conflicting),
            (Key::Numeric, None) => set(&mut self.numeric, Constraint::Null, conflicting),
            (Key::Numeric, Some(v)) => set(&mut self.numeric, Constraint::Value(parse_number(name, v)?), conflicting),
            (Key::Scale, None) => set(&mut self.scale, Constraint::Null, conflicting),
            (Key::Scale, Some(v)) => set(&mut self.scale, Constraint::Value(parse_number(name, v)?), conflicting),
            (Key::Domain, None) => set(&mut self.domain, Constraint::Null, conflicting),
            (Key::Domain, Some(v)) => {
                set(&mut self.domain, Constraint::Value(v.trim().to_ascii_uppercase()), conflicting);
            }
            (Key::Kind, None) => set(&mut self.kind, Constraint::Null, conflicting),
            (Key::Kind, Some(v)) => set(&mut self.kind, Constraint::Value(v.trim().to_string()), conflicting),
            (Key::Weight, None) => set(&mut self.weight, Constraint::Null, conflicting),
            (Key::Weight, Some(v)) => set(&mut self.weight, Constraint::Value(parse_number(name, v)?), conflicting),
        }
        Ok(())
    }

    /// Requires this exact id.
    #[must_use]
    pub fn with_id(mut self, id: CurrencyId) -> Self {
        set(&mut self.id, Constraint::Value(id), &mut self.conflicting);
        self
    }

    /// Requires this code.
    #[must_use]
    pub fn with_code(mut self, code: &str) -> Self {
        set(&mut self.code, Constraint::Value(code.trim().to_ascii_uppercase()), &mut self.conflicting);
        self
    }

    /// Requires this numeric id.
    #[must_use]
    pub fn with_numeric(mut self, numeric: u32) -> Self {
        set(&mut self.numeric, Constraint::Value(numeric), &mut self.conflicting);
        self
    }

    /// Requires the currency to have no numeric id.
    #[must_use]
    pub fn without_numeric(mut self) -> Self {
        set(&mut self.numeric, Constraint::Null, &mut self.conflicting);
        self
    }

    /// Requires this nominal scale.
    #[must_use]
    pub fn with_scale(mut self, scale: u32) -> Self {
        set(&mut self.scale, Constraint::Value(scale), &mut self.conflicting);
        self
    }

    /// Requires an auto-scaled currency.
    #[must_use]
    pub fn auto_scaled(mut self) -> Self {
        set(&mut self.scale, Constraint::Null, &mut self.conflicting);
        self
    }

    /// Requires this domain.
    #[must_use]
    pub fn with_domain(mut self, domain: &str) -> Self {
        set(&mut self.domain, Constraint::Value(domain.trim().to_ascii_uppercase()), &mut self.conflicting);
        self
    }

    /// Requires the currency to have no domain.
    #[must_use]
    pub fn without_domain(mut self) -> Self {
        set(&mut self.domain, Constraint::Null, &mut self.conflicting);
        self
    }

    /// Requires this kind.
    #[must_use]
    pub fn with_kind(mut self, kind: &str) -> Self {
        set(&mut self.kind, Constraint::Value(kind.trim().to_string()), &mut self.conflicting);
        self
    }

    /// Requires the currency to have no kind.
    #[must_use]
    pub fn without_kind(mut self) -> Self {
        set(&mut self.kind, Constraint::Null, &mut self.conflicting);
        self
    }

    /// Requires this weight.
    #[must_use]
    pub fn with_weight(mut self, weight: i32) -> Self {
        set(&mut self.weight, Constraint::Value(weight), &mut self.conflicting);
        self
    }

    /// Returns true if two inputs disagreed on the same key.
    #[must_use]
    pub fn is_conflicting(&self) -> bool {
        self.conflicting
    }

    /// Returns true if the currency satisfies every present constraint.
    #[must_use]
    pub fn matches(&self, currency: &Currency) -> bool {
        if self.conflicting {
            return false;
        }
        let id_ok = match &self.id {
            None => true,
            Some(Constraint::Null) => false,
            Some(Constraint::Value(id)) => currency.id() == id,
        };
        let code_ok = match &self.code {
            None => true,
            Some(Constraint::Null) => false,
            Some(Constraint::Value(code)) => currency.code() == code,
        };
        let weight_ok = match &self.weight {
            None => true,
            Some(Constraint::Null) => currency.weight() == 0,
            Some(Constraint::Value(weight)) => currency.weight() == *weight,
        };
        id_ok
            && code_ok
            && weight_ok
            && admits(self.numeric.as_ref(), currency.numeric().as_ref())
            && admits(self.scale.as_ref(), currency.scale().as_ref())
            && admits(self.domain.as_ref(), currency.domain())
            && admits(self.kind.as_ref(), currency.kind())
    }

    /// All registered currencies matching the map, best first.
    pub(super) fn search(&self, registry: &Registry) -> Vec<Currency> {
        if self.conflicting {
            return Vec::new();
        }

        let mut hinted = false;
        let mut candidates: BTreeMap<CurrencyId, Currency> = BTreeMap::new();
        let mut collect = |found: Vec<Currency>| {
            candidates.extend(found.into_iter().map(|c| (c.id().clone(), c)));
        };

        if let Some(Constraint::Value(id)) = &self.id {
            hinted = true;
            collect(registry.get(id).cloned().into_iter().collect());
            collect(search(registry, &CurrencyRef::from(id.clone())));
        }
        if let Some(Constraint::Value(code)) = &self.code {
            hinted = true;
            collect(registry.code_bucket(code).into_iter().flatten().cloned().collect());
        }
        if let Some(Constraint::Value(numeric)) = &self.numeric {
            hinted = true;
            collect(search(registry, &CurrencyRef::Numeric(*numeric)));
        }
        if !hinted {
            match &self.domain {
                Some(Constraint::Value(domain)) => {
                    collect(registry.domain_bucket(domain).into_iter().flatten().cloned().collect());
                }
                _ => collect(registry.currencies().cloned().collect()),
            }
        }

        let mut found: Vec<Currency> = candidates.into_values().filter(|c| self.matches(c)).collect();
        found.sort_by(compare);
        found
    }
}

impl<T> Constraint<T> {
    fn admits<U>(&self, actual: Option<&U>) -> bool
    where
        T: Borrow<U>,
        U: PartialEq + ?Sized,
    {
        match self {
            Self::Null => actual.is_none(),
            Self::Value(expected) => actual.is_some_and(|a| Borrow::<U>::borrow(expected) == a),
        }
    }
}

fn admits<T, U>(constraint: Option<&Constraint<T>>, actual: Option<&U>) -> bool
where
    T: Borrow<U>,
    U: PartialEq + ?Sized,
{
    constraint.is_none_or(|c| c.admits(actual))
}

impl std::fmt::Display for ConstraintMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn entry<T: std::fmt::Display>(name: &str, c: Option<&Constraint<T>>) -> Option<String> {
            c.map(|c| match c {
                Constraint::Null => format!("{name}=nil"),
                Constraint::Value(v) => format!("{name}={v}"),
            })
        }
        let parts: Vec<String> = [
            entry("id", self.id.as_ref()),
            entry("code", self.code.as_ref()),
            entry("numeric", self.numeric.as_ref()),
            entry("scale", self.scale.as_ref()),
            entry("domain", self.domain.as_ref()),
            entry("kind", self.kind.as_ref()),
            entry("weight", self.weight.as_ref()),
        ]
        .into_iter()
        .flatten()
        .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}
