//! Pure registry transforms.
//!
//! Each transform takes `&self` and returns a new registry. Mutators that
//! require an existing currency fail with `CurrencyNotFound`; removals of
//! absent data are no-ops. Index inconsistencies met while removing are
//! logged and healed rather than reported as errors.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use super::bucket::Bucket;
use super::store::Registry;
use crate::currency::{CountryId, Currency, CurrencyId};
use crate::display::{LocalizedProperties, normalize_locale};
use crate::error::{MoneyError, MoneyResult};
use crate::resolve::{self, CurrencyRef};

/// Extra data accompanying a registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
    /// Countries that use the currency (re-pointed away from their old currency).
    pub countries: Vec<CountryId>,
    /// Per-locale properties.
    pub localized: BTreeMap<String, LocalizedProperties>,
    /// Replace an existing currency instead of failing.
    pub update: bool,
}

impl Registration {
    /// A registration in update mode.
    #[must_use]
    pub fn update() -> Self {
        Self {
            update: true,
            ..Self::default()
        }
    }

    /// Adds countries.
    #[must_use]
    pub fn with_countries(mut self, countries: impl IntoIterator<Item = CountryId>) -> Self {
        self.countries.extend(countries);
        self
    }

    /// Adds properties for one locale.
    #[must_use]
    pub fn with_localized(mut self, locale: &str, properties: LocalizedProperties) -> Self {
        self.localized.insert(locale.to_string(), properties);
        self
    }
}

impl Registry {
    /// Registers a currency.
    ///
    /// The weight comes from the currency when non-zero; otherwise, in update
    /// mode, a previously assigned explicit weight is kept. Update mode also
    /// keeps the currency's traits and replaces its countries and localized
    /// properties.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::DuplicateCurrency` if the id exists and update
    /// mode is off.
    pub fn register(&self, currency: Currency, registration: Registration) -> MoneyResult<Self> {
        let id = currency.id().clone();
        if let Some(existing) = self.by_id.get(&id) {
            if !registration.update {
                return Err(MoneyError::DuplicateCurrency(Box::new(existing.clone())));
            }
        }

        let (prior_weight, prior_traits) = if registration.update {
            (self.weights.get(&id).copied(), self.traits.get(&id).cloned())
        } else {
            (None, None)
        };
        let weight = match currency.weight() {
            0 => prior_weight,
            explicit => Some(explicit),
        };
        let currency = currency.with_weight(weight.unwrap_or(0));

        let mut next = self.without_id(&id);
        next.index(&currency);
        if let Some(weight) = weight {
            next.weights.insert(id.clone(), weight);
        }
        next.link_countries(&id, &registration.countries);
        let localized = normalize_localized(registration.localized);
        if !localized.is_empty() {
            next.localized.insert(id.clone(), localized);
        }
        if let Some(traits) = prior_traits {
            next.traits.insert(id.clone(), traits);
        }

        debug!(currency = %id, weight = currency.weight(), update = registration.update, "Registered currency");
        Ok(next)
    }

    /// Registers a new currency without extras.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::DuplicateCurrency` if the id exists.
    pub fn add_currency(&self, currency: Currency) -> MoneyResult<Self> {
        self.register(currency, Registration::default())
    }

    /// Registers or replaces a currency, preserving weight and traits.
    ///
    /// # Errors
    ///
    /// Never fails in practice; kept fallible for symmetry with `register`.
    pub fn update_currency(&self, currency: Currency) -> MoneyResult<Self> {
        self.register(currency, Registration::update())
    }

    /// Removes a currency and every trace of it from all indexes.
    ///
    /// Unknown references return an unchanged copy, so the operation is
    /// idempotent.
    #[must_use]
    pub fn unregister(&self, currency: impl Into<CurrencyRef>) -> Self {
        match self.id_for(&currency.into()) {
            Some(id) => self.without_id(&id),
            None => self.clone(),
        }
    }

    /// Removes the currency with exactly this id; unknown ids are a no-op.
    #[must_use]
    pub fn unregister_id(&self, id: &CurrencyId) -> Self {
        self.without_id(id)
    }

    /// Points countries at a currency, detaching them from any other.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::CurrencyNotFound` if the currency is unknown.
    pub fn add_countries(&self, id: &CurrencyId, countries: &[CountryId]) -> MoneyResult<Self> {
        self.require(id)?;
        let mut next = self.clone();
        next.link_countries(id, countries);
        Ok(next)
    }

    /// Detaches countries from whatever currency they use.
    #[must_use]
    pub fn remove_countries(&self, countries: &[CountryId]) -> Self {
        let mut next = self.clone();
        for country in countries {
            if let Some(holder) = next.country_to_currency.remove(country) {
                next.unlink_country(&holder, country);
            }
        }
        next
    }

    /// Merges per-locale properties into a currency's localized table.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::CurrencyNotFound` if the currency is unknown.
    pub fn add_localized_properties(
        &self,
        id: &CurrencyId,
        properties: BTreeMap<String, LocalizedProperties>,
    ) -> MoneyResult<Self> {
        self.require(id)?;
        let mut next = self.clone();
        let table = next.localized.entry(id.clone()).or_default();
        for (locale, props) in normalize_localized(properties) {
            let merged = table.get(&locale).map_or_else(|| props.clone(), |old| old.merge(&props));
            table.insert(locale, merged);
        }
        if table.is_empty() {
            next.localized.remove(id);
        }
        Ok(next)
    }

    /// Drops all localized properties of a currency.
    #[must_use]
    pub fn remove_localized_properties(&self, id: &CurrencyId) -> Self {
        let mut next = self.clone();
        next.localized.remove(id);
        next
    }

    /// Assigns an explicit weight and re-sorts every bucket holding the currency.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::CurrencyNotFound` if the currency is unknown.
    pub fn set_weight(&self, id: &CurrencyId, weight: i32) -> MoneyResult<Self> {
        let currency = self.require(id)?.with_weight(weight);
        let mut next = self.clone();
        next.weights.insert(id.clone(), weight);
        next.reindex(&currency);
        Ok(next)
    }

    /// Removes the explicit weight, falling back to the implicit 0.
    #[must_use]
    pub fn clear_weight(&self, id: &CurrencyId) -> Self {
        let Some(currency) = self.by_id.get(id) else {
            return self.clone();
        };
        let currency = currency.with_weight(0);
        let mut next = self.clone();
        next.weights.remove(id);
        next.reindex(&currency);
        next
    }

    /// Replaces the trait set of a currency.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::CurrencyNotFound` if the currency is unknown.
    pub fn set_traits<I, S>(&self, id: &CurrencyId, traits: I) -> MoneyResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.require(id)?;
        let traits: BTreeSet<String> = traits.into_iter().map(Into::into).collect();
        let mut next = self.clone();
        if traits.is_empty() {
            next.traits.remove(id);
        } else {
            next.traits.insert(id.clone(), traits);
        }
        Ok(next)
    }

    /// Adds traits to a currency.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::CurrencyNotFound` if the currency is unknown.
    pub fn add_traits<I, S>(&self, id: &CurrencyId, traits: I) -> MoneyResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.require(id)?;
        let mut next = self.clone();
        let set = next.traits.entry(id.clone()).or_default();
        set.extend(traits.into_iter().map(Into::into));
        if set.is_empty() {
            next.traits.remove(id);
        }
        Ok(next)
    }

    /// Removes traits from a currency.
    #[must_use]
    pub fn remove_traits<I, S>(&self, id: &CurrencyId, traits: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut next = self.clone();
        if let Some(set) = next.traits.get_mut(id) {
            for tag in traits {
                set.remove(tag.as_ref());
            }
            if set.is_empty() {
                next.traits.remove(id);
            }
        }
        next
    }

    // ========== Internals ==========

    fn require(&self, id: &CurrencyId) -> MoneyResult<&Currency> {
        self.by_id.get(id).ok_or_else(|| MoneyError::not_found(id))
    }

    /// Picks the id a reference denotes, preferring a literal id over resolution.
    fn id_for(&self, reference: &CurrencyRef) -> Option<CurrencyId> {
        let (literal, iso_only) = match reference {
            CurrencyRef::Currency(currency) => (Some(currency.id().clone()), false),
            CurrencyRef::Identifier { qualifier, code } => match CurrencyId::normalize(qualifier.as_deref(), code) {
                Ok((id, iso_marker)) => (Some(id), iso_marker),
                Err(_) => (None, false),
            },
            _ => (None, false),
        };
        let usable = |id: &CurrencyId| match self.by_id.get(id) {
            Some(currency) => !iso_only || currency.is_iso(),
            None => self.mentions(id),
        };
        match literal {
            Some(id) if usable(&id) => Some(id),
            _ => resolve::resolve(self, reference).map(|c| c.id().clone()),
        }
    }

    /// Returns true if any side table still refers to the id.
    fn mentions(&self, id: &CurrencyId) -> bool {
        self.weights.contains_key(id)
            || self.traits.contains_key(id)
            || self.localized.contains_key(id)
            || self.currency_to_countries.contains_key(id)
            || self.country_to_currency.values().any(|c| c == id)
    }

    /// Copy of the registry with the id purged from every index.
    fn without_id(&self, id: &CurrencyId) -> Self {
        let mut next = self.clone();
        let removed = next.by_id.remove(id);

        match &removed {
            Some(currency) => {
                if let Some(numeric) = currency.numeric() {
                    purge(&mut next.by_numeric, "numeric", Some(&numeric), id);
                    next.refresh_canonical(numeric);
                }
                purge(&mut next.by_code, "code", Some(&currency.code().to_string()), id);
                if let Some(domain) = currency.domain() {
                    purge(&mut next.by_domain, "domain", Some(&domain.to_string()), id);
                }
            }
            None => {
                let numerics = purge(&mut next.by_numeric, "numeric", None, id);
                for numeric in numerics {
                    next.refresh_canonical(numeric);
                }
                purge(&mut next.by_code, "code", None, id);
                purge(&mut next.by_domain, "domain", None, id);
            }
        }

        if let Some(countries) = next.currency_to_countries.remove(id) {
            for country in countries {
                if next.country_to_currency.get(&country) == Some(id) {
                    next.country_to_currency.remove(&country);
                } else {
                    warn!(currency = %id, country = %country, "Country index did not point back at the currency");
                }
            }
        }
        let before = next.country_to_currency.len();
        next.country_to_currency.retain(|_, holder| holder != id);
        if next.country_to_currency.len() != before {
            warn!(currency = %id, "Dropped stray country mappings");
        }

        next.localized.remove(id);
        next.traits.remove(id);
        next.weights.remove(id);

        if removed.is_some() {
            debug!(currency = %id, "Unregistered currency");
        }
        next
    }

    /// Files a currency in the primary map and every secondary index.
    fn index(&mut self, currency: &Currency) {
        self.by_id.insert(currency.id().clone(), currency.clone());
        if let Some(numeric) = currency.numeric() {
            self.by_numeric.entry(numeric).or_default().insert(currency.clone());
            self.refresh_canonical(numeric);
        }
        self.by_code
            .entry(currency.code().to_string())
            .or_default()
            .insert(currency.clone());
        if let Some(domain) = currency.domain() {
            self.by_domain
                .entry(domain.to_string())
                .or_default()
                .insert(currency.clone());
        }
    }

    /// Refiles a currency whose weight changed.
    fn reindex(&mut self, currency: &Currency) {
        self.index(currency);
    }

    fn refresh_canonical(&mut self, numeric: u32) {
        match self.by_numeric.get(&numeric).and_then(Bucket::first) {
            Some(winner) => {
                self.canonical_by_numeric.insert(numeric, winner.clone());
            }
            None => {
                self.canonical_by_numeric.remove(&numeric);
            }
        }
    }

    fn link_countries(&mut self, id: &CurrencyId, countries: &[CountryId]) {
        for country in countries {
            if let Some(previous) = self.country_to_currency.insert(country.clone(), id.clone()) {
                if &previous != id {
                    self.unlink_country(&previous, country);
                }
            }
            self.currency_to_countries
                .entry(id.clone())
                .or_default()
                .insert(country.clone());
        }
    }

    fn unlink_country(&mut self, holder: &CurrencyId, country: &CountryId) {
        if let Some(set) = self.currency_to_countries.get_mut(holder) {
            set.remove(country);
            if set.is_empty() {
                self.currency_to_countries.remove(holder);
            }
        }
    }
}

/// Removes an id from the bucket under `key`, or from every bucket when the
/// key is unknown. Empty buckets are dropped. Returns the keys touched.
fn purge<K: Ord + Clone + std::fmt::Display>(
    buckets: &mut BTreeMap<K, Bucket>,
    index: &str,
    key: Option<&K>,
    id: &CurrencyId,
) -> Vec<K> {
    let mut touched = Vec::new();
    match key {
        Some(key) => {
            let removed = buckets.get_mut(key).is_some_and(|bucket| bucket.remove(id));
            if removed {
                touched.push(key.clone());
            } else {
                warn!(currency = %id, index, key = %key, "Currency missing from its bucket");
            }
        }
        None => {
            for (key, bucket) in buckets.iter_mut() {
                if bucket.remove(id) {
                    warn!(currency = %id, index, key = %key, "Removed stray bucket entry");
                    touched.push(key.clone());
                }
            }
        }
    }
    buckets.retain(|_, bucket| !bucket.is_empty());
    touched
}

fn normalize_localized(
    properties: BTreeMap<String, LocalizedProperties>,
) -> BTreeMap<String, LocalizedProperties> {
    properties
        .into_iter()
        .filter(|(_, props)| !props.is_empty())
        .map(|(locale, props)| (normalize_locale(&locale), props))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn currency(id: &str, numeric: u32) -> Currency {
        Currency::builder(id).numeric(numeric).scale(2).build().unwrap()
    }

    fn id(s: &str) -> CurrencyId {
        CurrencyId::parse(s).unwrap()
    }

    fn country(s: &str) -> CountryId {
        CountryId::new(s).unwrap()
    }

    #[test]
    fn test_register_indexes_everywhere() {
        let registry = Registry::new()
            .register(
                currency("PLN", 985),
                Registration::default().with_countries([country("PL")]),
            )
            .unwrap();

        assert!(registry.contains(&id("PLN")));
        assert_eq!(registry.canonical_for_numeric(985).unwrap().code(), "PLN");
        assert_eq!(registry.code_bucket("pln").unwrap().len(), 1);
        assert_eq!(registry.domain_bucket("iso-4217").unwrap().len(), 1);
        assert_eq!(registry.currency_of_country(&country("pl")).unwrap().code(), "PLN");
        assert!(registry.check_integrity().is_empty());
    }

    #[test]
    fn test_duplicate_rejected_without_update() {
        let registry = Registry::new().add_currency(currency("PLN", 985)).unwrap();
        let err = registry.add_currency(currency("PLN", 985)).unwrap_err();
        assert!(matches!(err, MoneyError::DuplicateCurrency(c) if c.code() == "PLN"));
    }

    #[test]
    fn test_update_preserves_weight_and_traits() {
        let registry = Registry::new()
            .add_currency(currency("EUR", 978))
            .unwrap()
            .set_weight(&id("EUR"), 3)
            .unwrap()
            .set_traits(&id("EUR"), ["fiat"])
            .unwrap()
            .update_currency(Currency::builder("EUR").numeric(978).scale(4).build().unwrap())
            .unwrap();

        let eur = registry.get(&id("EUR")).unwrap();
        assert_eq!(eur.scale(), Some(4));
        assert_eq!(eur.weight(), 3);
        assert_eq!(registry.explicit_weight(&id("EUR")), Some(3));
        assert!(registry.has_trait(&id("EUR"), "fiat"));
        assert!(registry.check_integrity().is_empty());
    }

    #[test]
    fn test_update_with_explicit_weight_wins() {
        let registry = Registry::new()
            .add_currency(currency("EUR", 978).with_weight(3))
            .unwrap()
            .update_currency(currency("EUR", 978).with_weight(-2))
            .unwrap();
        assert_eq!(registry.get(&id("EUR")).unwrap().weight(), -2);
    }

    #[test]
    fn test_update_replaces_countries() {
        let registry = Registry::new()
            .register(currency("EUR", 978), Registration::default().with_countries([country("DE")]))
            .unwrap()
            .register(
                currency("EUR", 978),
                Registration::update().with_countries([country("FR")]),
            )
            .unwrap();
        let countries: Vec<&str> = registry.countries_of(&id("EUR")).map(CountryId::as_str).collect();
        assert_eq!(countries, vec!["FR"]);
        assert!(registry.currency_of_country(&country("DE")).is_none());
    }

    #[test]
    fn test_unregister_purges_everything() {
        let registry = Registry::new()
            .register(
                currency("PLN", 985),
                Registration::default()
                    .with_countries([country("PL")])
                    .with_localized("pl", LocalizedProperties::new("złoty", "zł")),
            )
            .unwrap()
            .set_traits(&id("PLN"), ["fiat"])
            .unwrap()
            .set_weight(&id("PLN"), 1)
            .unwrap();

        let emptied = registry.unregister("PLN");
        assert!(emptied.is_empty());
        assert!(emptied.canonical_for_numeric(985).is_none());
        assert!(emptied.code_bucket("PLN").is_none());
        assert!(emptied.currency_of_country(&country("PL")).is_none());
        assert!(emptied.localized_properties(&id("PLN")).is_none());
        assert!(emptied.traits(&id("PLN")).is_none());
        assert!(emptied.explicit_weight(&id("PLN")).is_none());
        assert!(emptied.check_integrity().is_empty());

        assert_eq!(emptied.unregister("PLN"), emptied);
    }

    #[test]
    fn test_unregister_iso_qualified_needs_iso_currency() {
        let registry = Registry::new()
            .add_currency(Currency::builder("XYZ").scale(2).build().unwrap())
            .unwrap()
            .add_currency(currency("PLN", 985))
            .unwrap();
        assert!(registry.resolve("ISO-4217/XYZ").is_none());

        let unchanged = registry.unregister("ISO-4217/XYZ");
        assert_eq!(unchanged.len(), 2);
        assert!(unchanged.contains(&id("XYZ")));

        let removed = registry.unregister("ISO-4217/PLN");
        assert!(!removed.contains(&id("PLN")));
        assert!(removed.contains(&id("XYZ")));
        assert!(removed.check_integrity().is_empty());
    }

    #[test]
    fn test_unregister_reelects_canonical() {
        let registry = Registry::new()
            .add_currency(currency("AAA", 999))
            .unwrap()
            .add_currency(currency("BBB", 999).with_weight(1))
            .unwrap();
        assert_eq!(registry.canonical_for_numeric(999).unwrap().code(), "AAA");
        let registry = registry.unregister("AAA");
        assert_eq!(registry.canonical_for_numeric(999).unwrap().code(), "BBB");
    }

    #[test]
    fn test_country_moves_between_currencies() {
        let registry = Registry::new()
            .register(currency("DEM", 276), Registration::default().with_countries([country("DE")]))
            .unwrap()
            .register(currency("EUR", 978), Registration::default().with_countries([country("DE")]))
            .unwrap();
        assert_eq!(registry.currency_of_country(&country("DE")).unwrap().code(), "EUR");
        assert_eq!(registry.countries_of(&id("DEM")).count(), 0);
        assert!(registry.check_integrity().is_empty());

        let registry = registry.remove_countries(&[country("DE")]);
        assert!(registry.currency_of_country(&country("DE")).is_none());
        assert!(registry.check_integrity().is_empty());
    }

    #[test]
    fn test_mutators_require_existing_currency() {
        let registry = Registry::new();
        let missing = id("XYZ");
        assert!(matches!(registry.set_weight(&missing, 1), Err(MoneyError::CurrencyNotFound(_))));
        assert!(matches!(registry.set_traits(&missing, ["a"]), Err(MoneyError::CurrencyNotFound(_))));
        assert!(matches!(registry.add_countries(&missing, &[]), Err(MoneyError::CurrencyNotFound(_))));
        assert!(matches!(
            registry.add_localized_properties(&missing, BTreeMap::new()),
            Err(MoneyError::CurrencyNotFound(_))
        ));
        assert_eq!(registry.clear_weight(&missing), registry);
        assert_eq!(registry.remove_traits(&missing, ["a"]), registry);
    }

    #[test]
    fn test_set_weight_resorts_buckets() {
        let registry = Registry::new()
            .add_currency(currency("AAA", 500))
            .unwrap()
            .add_currency(currency("BBB", 500))
            .unwrap()
            .set_weight(&id("AAA"), 10)
            .unwrap();
        assert_eq!(registry.canonical_for_numeric(500).unwrap().code(), "BBB");

        let registry = registry.clear_weight(&id("AAA"));
        assert_eq!(registry.canonical_for_numeric(500).unwrap().code(), "AAA");
        assert!(registry.check_integrity().is_empty());
    }

    #[test]
    fn test_localized_merge_and_normalization() {
        let mut first = BTreeMap::new();
        first.insert("en-us".to_string(), LocalizedProperties::new("Euro", "€"));
        let mut second = BTreeMap::new();
        second.insert(
            "en_US".to_string(),
            LocalizedProperties {
                name: Some("euro".to_string()),
                symbol: None,
            },
        );
        let registry = Registry::new()
            .add_currency(currency("EUR", 978))
            .unwrap()
            .add_localized_properties(&id("EUR"), first)
            .unwrap()
            .add_localized_properties(&id("EUR"), second)
            .unwrap();
        let table = registry.localized_properties(&id("EUR")).unwrap();
        assert_eq!(table.get("en_US"), Some(&LocalizedProperties::new("euro", "€")));

        let registry = registry.remove_localized_properties(&id("EUR"));
        assert!(registry.localized_properties(&id("EUR")).is_none());
    }

    #[test]
    fn test_traits_add_remove_and_hierarchy() {
        use crate::hierarchy::{Hierarchies, Hierarchy};

        let mut parents = BTreeMap::new();
        parents.insert("stablecoin".to_string(), vec!["crypto".to_string()]);
        let traits = Hierarchy::from_parent_map(&parents).unwrap();

        let registry = Registry::new()
            .with_hierarchies(Hierarchies::new(Hierarchy::new(), Hierarchy::new(), traits))
            .add_currency(Currency::builder("crypto/USDT").build().unwrap())
            .unwrap()
            .add_traits(&id("crypto/USDT"), ["stablecoin"])
            .unwrap();
        assert!(registry.has_trait(&id("crypto/USDT"), "stablecoin"));
        assert!(registry.has_trait(&id("crypto/USDT"), "crypto"));
        assert!(!registry.has_trait(&id("crypto/USDT"), "fiat"));

        let registry = registry.remove_traits(&id("crypto/USDT"), ["stablecoin"]);
        assert!(registry.traits(&id("crypto/USDT")).is_none());
    }

    #[test]
    fn test_unregister_heals_orphaned_side_tables() {
        let mut registry = Registry::new().add_currency(currency("PLN", 985)).unwrap();
        registry.by_id.remove(&id("PLN"));
        registry.weights.insert(id("PLN"), 4);

        let healed = registry.unregister("PLN");
        assert!(healed.code_bucket("PLN").is_none());
        assert!(healed.numeric_bucket(985).is_none());
        assert!(healed.explicit_weight(&id("PLN")).is_none());
        assert!(healed.check_integrity().is_empty());
    }
}
