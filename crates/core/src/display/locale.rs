//! Locale normalization and memoized fallback chains using Moka.
//!
//! A chain lists the locales to try, most specific first, always ending with
//! the wildcard: `en_US_POSIX -> en_US -> en -> *`.

use std::sync::Arc;

use moka::sync::Cache;
use once_cell::sync::Lazy;

/// Locale key matching any locale.
pub const WILDCARD: &str = "*";

/// Default cache capacity (number of distinct locales).
const DEFAULT_CACHE_CAPACITY: u64 = 512;

static CHAINS: Lazy<LocaleCache> = Lazy::new(LocaleCache::new);

/// Normalizes a locale tag: language lower-case, region upper-case,
/// `-` and `_` both accepted as separators.
///
/// An empty tag normalizes to the wildcard.
#[must_use]
pub fn normalize_locale(locale: &str) -> String {
    let locale = locale.trim();
    if locale.is_empty() || locale == WILDCARD {
        return WILDCARD.to_string();
    }

    locale
        .split(['-', '_'])
        .filter(|part| !part.is_empty())
        .enumerate()
        .map(|(i, part)| match i {
            0 => part.to_ascii_lowercase(),
            1 if part.len() == 2 => part.to_ascii_uppercase(),
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join("_")
}

/// Returns the fallback chain for a locale, computed once per distinct tag.
#[must_use]
pub fn locale_chain(locale: &str) -> Arc<Vec<String>> {
    CHAINS.chain(locale)
}

/// Cache of locale fallback chains.
///
/// Chains depend only on the tag, so entries never expire.
#[derive(Clone)]
pub struct LocaleCache {
    cache: Cache<String, Arc<Vec<String>>>,
}

impl LocaleCache {
    /// Creates a cache with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Creates a cache holding at most `max_capacity` chains.
    #[must_use]
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(max_capacity).build(),
        }
    }

    /// Returns the chain for `locale`, computing it on first use.
    #[must_use]
    pub fn chain(&self, locale: &str) -> Arc<Vec<String>> {
        self.cache
            .get_with(locale.to_string(), || Arc::new(compute_chain(locale)))
    }

    /// Returns the number of cached chains.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Runs pending cache maintenance tasks.
    pub fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks();
    }
}

impl Default for LocaleCache {
    fn default() -> Self {
        Self::new()
    }
}

fn compute_chain(locale: &str) -> Vec<String> {
    let normalized = normalize_locale(locale);
    if normalized == WILDCARD {
        return vec![WILDCARD.to_string()];
    }

    let parts: Vec<&str> = normalized.split('_').collect();
    let mut chain: Vec<String> = (1..=parts.len())
        .rev()
        .map(|n| parts[..n].join("_"))
        .collect();
    chain.push(WILDCARD.to_string());
    chain
}
