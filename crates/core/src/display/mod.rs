//! Localized display names and symbols.

pub mod locale;

use serde::{Deserialize, Serialize};

use crate::currency::Currency;
use crate::money::Money;
use crate::registry::Registry;

pub use locale::{LocaleCache, WILDCARD, locale_chain, normalize_locale};

/// Per-locale presentation properties of a currency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedProperties {
    /// Human readable name, e.g. "Polish złoty".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Currency symbol, e.g. "zł".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl LocalizedProperties {
    /// Creates properties with both a name and a symbol.
    #[must_use]
    pub fn new(name: &str, symbol: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            symbol: Some(symbol.to_string()),
        }
    }

    /// Overlays `other` on top of `self`; fields set in `other` win.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            name: other.name.clone().or_else(|| self.name.clone()),
            symbol: other.symbol.clone().or_else(|| self.symbol.clone()),
        }
    }

    /// Returns true if no property is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.symbol.is_none()
    }
}

fn localized<'a>(
    registry: &'a Registry,
    currency: &Currency,
    locale: &str,
    property: impl Fn(&'a LocalizedProperties) -> Option<&'a String>,
) -> Option<&'a str> {
    let properties = registry.localized_properties(currency.id())?;
    locale_chain(locale)
        .iter()
        .find_map(|candidate| properties.get(candidate).and_then(&property))
        .map(String::as_str)
}

/// The localized name, walking the locale fallback chain; the code otherwise.
#[must_use]
pub fn display_name(registry: &Registry, currency: &Currency, locale: &str) -> String {
    localized(registry, currency, locale, |p| p.name.as_ref())
        .unwrap_or_else(|| currency.code())
        .to_string()
}

/// The localized symbol, walking the locale fallback chain; the code otherwise.
#[must_use]
pub fn symbol(registry: &Registry, currency: &Currency, locale: &str) -> String {
    localized(registry, currency, locale, |p| p.symbol.as_ref())
        .unwrap_or_else(|| currency.code())
        .to_string()
}

/// Renders an amount with its localized symbol, e.g. `"12.30 zł"`.
#[must_use]
pub fn display_money(registry: &Registry, money: &Money, locale: &str) -> String {
    format!("{} {}", money.amount(), symbol(registry, money.currency(), locale))
}
