//! Registry value: primary map, secondary indexes and read-only queries.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::Utc;

use super::bucket::{self, Bucket};
use crate::currency::{CountryId, Currency, CurrencyId};
use crate::display::LocalizedProperties;
use crate::hierarchy::Hierarchies;

/// Timestamp format of registry versions (sortable, millisecond precision).
const VERSION_FORMAT: &str = "%Y%m%d%H%M%S%3f";

/// An immutable snapshot of currencies with all lookup indexes.
///
/// Every transform returns a new registry; existing snapshots never change.
/// Within one snapshot the indexes are kept consistent with the primary map
/// (see [`Registry::check_integrity`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    pub(super) by_id: BTreeMap<CurrencyId, Currency>,
    pub(super) canonical_by_numeric: BTreeMap<u32, Currency>,
    pub(super) by_numeric: BTreeMap<u32, Bucket>,
    pub(super) by_code: BTreeMap<String, Bucket>,
    pub(super) by_domain: BTreeMap<String, Bucket>,
    pub(super) country_to_currency: BTreeMap<CountryId, CurrencyId>,
    pub(super) currency_to_countries: BTreeMap<CurrencyId, BTreeSet<CountryId>>,
    pub(super) localized: BTreeMap<CurrencyId, BTreeMap<String, LocalizedProperties>>,
    pub(super) traits: BTreeMap<CurrencyId, BTreeSet<String>>,
    pub(super) weights: BTreeMap<CurrencyId, i32>,
    pub(super) hierarchies: Arc<Hierarchies>,
    pub(super) version: String,
    pub(super) ext: BTreeMap<String, serde_json::Value>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates an empty registry versioned with the current timestamp.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_id: BTreeMap::new(),
            canonical_by_numeric: BTreeMap::new(),
            by_numeric: BTreeMap::new(),
            by_code: BTreeMap::new(),
            by_domain: BTreeMap::new(),
            country_to_currency: BTreeMap::new(),
            currency_to_countries: BTreeMap::new(),
            localized: BTreeMap::new(),
            traits: BTreeMap::new(),
            weights: BTreeMap::new(),
            hierarchies: Arc::new(Hierarchies::default()),
            version: timestamp_version(),
            ext: BTreeMap::new(),
        }
    }

    // ========== Primary map ==========

    /// Looks up a currency by exact id.
    #[must_use]
    pub fn get(&self, id: &CurrencyId) -> Option<&Currency> {
        self.by_id.get(id)
    }

    /// Returns true if the id is registered.
    #[must_use]
    pub fn contains(&self, id: &CurrencyId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Number of registered currencies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns true if no currency is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// All currencies in id order.
    pub fn currencies(&self) -> impl Iterator<Item = &Currency> {
        self.by_id.values()
    }

    // ========== Secondary indexes ==========

    /// The winning currency for a numeric id.
    #[must_use]
    pub fn canonical_for_numeric(&self, numeric: u32) -> Option<&Currency> {
        self.canonical_by_numeric.get(&numeric)
    }

    /// All currencies sharing a numeric id, in bucket order.
    #[must_use]
    pub fn numeric_bucket(&self, numeric: u32) -> Option<&Bucket> {
        self.by_numeric.get(&numeric)
    }

    /// All currencies sharing a code, in bucket order.
    #[must_use]
    pub fn code_bucket(&self, code: &str) -> Option<&Bucket> {
        self.by_code.get(&code.to_ascii_uppercase())
    }

    /// All currencies of a domain, in bucket order.
    #[must_use]
    pub fn domain_bucket(&self, domain: &str) -> Option<&Bucket> {
        self.by_domain.get(&domain.to_ascii_uppercase())
    }

    /// Countries using a currency.
    pub fn countries_of<'a>(&'a self, id: &CurrencyId) -> impl Iterator<Item = &'a CountryId> + use<'a> {
        self.currency_to_countries.get(id).into_iter().flatten()
    }

    /// The currency used in a country.
    #[must_use]
    pub fn currency_of_country(&self, country: &CountryId) -> Option<&Currency> {
        self.country_to_currency
            .get(country)
            .and_then(|id| self.by_id.get(id))
    }

    /// Per-locale properties of a currency.
    #[must_use]
    pub fn localized_properties(&self, id: &CurrencyId) -> Option<&BTreeMap<String, LocalizedProperties>> {
        self.localized.get(id)
    }

    /// Trait tags attached directly to a currency.
    #[must_use]
    pub fn traits(&self, id: &CurrencyId) -> Option<&BTreeSet<String>> {
        self.traits.get(id)
    }

    /// Returns true if the currency has the trait directly or a trait that
    /// derives from it in the trait hierarchy.
    #[must_use]
    pub fn has_trait(&self, id: &CurrencyId, tag: &str) -> bool {
        self.traits.get(id).is_some_and(|traits| {
            traits.contains(tag) || traits.iter().any(|t| self.hierarchies.traits.isa(t, tag))
        })
    }

    /// The explicitly assigned weight, distinct from the implicit default of 0.
    #[must_use]
    pub fn explicit_weight(&self, id: &CurrencyId) -> Option<i32> {
        self.weights.get(id).copied()
    }

    /// Domain classification honoring the registry's domain hierarchy.
    #[must_use]
    pub fn is_of_domain(&self, currency: &Currency, domain: &str) -> bool {
        currency.is_of_domain(&domain.to_ascii_uppercase(), Some(&self.hierarchies.domain))
    }

    /// Kind classification honoring the registry's kind hierarchy.
    #[must_use]
    pub fn is_of_kind(&self, currency: &Currency, kind: &str) -> bool {
        currency.is_of_kind(kind, Some(&self.hierarchies.kind))
    }

    // ========== Metadata ==========

    /// The classification hierarchies.
    #[must_use]
    pub fn hierarchies(&self) -> &Hierarchies {
        &self.hierarchies
    }

    /// Returns a copy with different hierarchies.
    #[must_use]
    pub fn with_hierarchies(&self, hierarchies: Hierarchies) -> Self {
        Self {
            hierarchies: Arc::new(hierarchies),
            ..self.clone()
        }
    }

    /// The version tag.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns a copy with a different version tag.
    #[must_use]
    pub fn with_version(&self, version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..self.clone()
        }
    }

    /// Extension data attached to the registry.
    #[must_use]
    pub fn ext(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.ext
    }

    /// Returns a copy with an extension entry set.
    #[must_use]
    pub fn with_ext(&self, key: impl Into<String>, value: serde_json::Value) -> Self {
        let mut next = self.clone();
        next.ext.insert(key.into(), value);
        next
    }

    // ========== Integrity ==========

    /// Lists every violated index invariant; an empty list means consistent.
    #[must_use]
    pub fn check_integrity(&self) -> Vec<String> {
        let mut problems = Vec::new();

        check_buckets(self, "numeric", &self.by_numeric, |c| c.numeric().map(|n| n.to_string()), &mut problems);
        check_buckets(self, "code", &self.by_code, |c| Some(c.code().to_string()), &mut problems);
        check_buckets(self, "domain", &self.by_domain, |c| c.domain().map(str::to_string), &mut problems);

        for (numeric, bucket) in &self.by_numeric {
            let canonical = self.canonical_by_numeric.get(numeric).map(Currency::id);
            if canonical != bucket.first().map(Currency::id) {
                problems.push(format!("canonical currency for numeric {numeric} is not the bucket winner"));
            }
        }
        for numeric in self.canonical_by_numeric.keys() {
            if !self.by_numeric.contains_key(numeric) {
                problems.push(format!("canonical entry for numeric {numeric} without a bucket"));
            }
        }

        for currency in self.by_id.values() {
            let indexed = [
                currency.numeric().map(|n| ("numeric", self.by_numeric.get(&n))),
                Some(("code", self.by_code.get(currency.code()))),
                currency.domain().map(|d| ("domain", self.by_domain.get(d))),
            ];
            for (index, bucket) in indexed.into_iter().flatten() {
                if !bucket.is_some_and(|b| b.contains(currency.id())) {
                    problems.push(format!("{} missing from the {index} index", currency.id()));
                }
            }
            let expected_weight = self.weights.get(currency.id()).copied().unwrap_or(0);
            if currency.weight() != expected_weight {
                problems.push(format!("{} carries weight {} instead of {expected_weight}", currency.id(), currency.weight()));
            }
        }

        for (country, id) in &self.country_to_currency {
            if !self.by_id.contains_key(id) {
                problems.push(format!("country {country} maps to unknown currency {id}"));
            }
            if !self.currency_to_countries.get(id).is_some_and(|cs| cs.contains(country)) {
                problems.push(format!("country {country} missing from the countries of {id}"));
            }
        }
        for (id, countries) in &self.currency_to_countries {
            if countries.is_empty() {
                problems.push(format!("empty country set kept for {id}"));
            }
            for country in countries {
                if self.country_to_currency.get(country) != Some(id) {
                    problems.push(format!("country {country} of {id} maps elsewhere"));
                }
            }
        }

        let side_tables = [
            ("localized", self.localized.keys().collect::<Vec<_>>()),
            ("traits", self.traits.keys().collect()),
            ("weights", self.weights.keys().collect()),
            ("countries", self.currency_to_countries.keys().collect()),
        ];
        for (table, ids) in side_tables {
            for id in ids {
                if !self.by_id.contains_key(id) {
                    problems.push(format!("{table} entry for unknown currency {id}"));
                }
            }
        }

        problems
    }
}

fn check_buckets(
    registry: &Registry,
    index: &str,
    buckets: &BTreeMap<impl Ord + std::fmt::Display, Bucket>,
    key_of: impl Fn(&Currency) -> Option<String>,
    problems: &mut Vec<String>,
) {
    for (key, bucket) in buckets {
        if bucket.is_empty() {
            problems.push(format!("empty {index} bucket {key}"));
        }
        let ordered = bucket
            .iter()
            .zip(bucket.iter().skip(1))
            .all(|(a, b)| bucket::compare(a, b).is_lt());
        if !ordered {
            problems.push(format!("{index} bucket {key} is out of order"));
        }
        for entry in bucket {
            match registry.by_id.get(entry.id()) {
                None => problems.push(format!("{index} bucket {key} holds unknown currency {}", entry.id())),
                Some(primary) => {
                    if primary != entry || primary.weight() != entry.weight() {
                        problems.push(format!("{index} bucket {key} holds a stale copy of {}", entry.id()));
                    }
                    if key_of(primary).as_deref() != Some(key.to_string().as_str()) {
                        problems.push(format!("{} filed under the wrong {index} key {key}", entry.id()));
                    }
                }
            }
        }
    }
}

pub(super) fn timestamp_version() -> String {
    Utc::now().format(VERSION_FORMAT).to_string()
}
