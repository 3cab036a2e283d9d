//! Weighted currency buckets.
//!
//! A bucket holds the currencies sharing one secondary key (numeric id,
//! code or domain), ordered by `(weight, id)`. Lower weight wins; the id
//! breaks ties. Each id appears at most once: inserting an id that is
//! already present replaces the old entry even if its weight changed.

use std::cmp::Ordering;

use crate::currency::{Currency, CurrencyId};

/// An ordered set of currencies keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bucket {
    entries: Vec<Currency>,
}

/// Bucket order: weight ascending, then id. Identical ids compare equal.
#[must_use]
pub fn compare(a: &Currency, b: &Currency) -> Ordering {
    if a.id() == b.id() {
        return Ordering::Equal;
    }
    a.weight()
        .cmp(&b.weight())
        .then_with(|| a.id().cmp(b.id()))
}

impl Bucket {
    /// Creates an empty bucket.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a currency, keeping the bucket ordered.
    pub fn insert(&mut self, currency: Currency) {
        self.remove(currency.id());
        let position = self
            .entries
            .partition_point(|entry| compare(entry, &currency) == Ordering::Less);
        self.entries.insert(position, currency);
    }

    /// Removes the currency with the given id; returns whether it was present.
    pub fn remove(&mut self, id: &CurrencyId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id() != id);
        self.entries.len() != before
    }

    /// Returns true if the id is in the bucket.
    #[must_use]
    pub fn contains(&self, id: &CurrencyId) -> bool {
        self.entries.iter().any(|entry| entry.id() == id)
    }

    /// Returns the entry with the given id.
    #[must_use]
    pub fn get(&self, id: &CurrencyId) -> Option<&Currency> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    /// The winner: lowest weight, then lowest id.
    #[must_use]
    pub fn first(&self) -> Option<&Currency> {
        self.entries.first()
    }

    /// Entries in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = &Currency> {
        self.entries.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the bucket is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Bucket {
    type Item = &'a Currency;
    type IntoIter = std::slice::Iter<'a, Currency>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
