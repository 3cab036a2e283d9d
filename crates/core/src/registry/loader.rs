//! Declarative registry documents.
//!
//! A registry spec lists currencies with their attributes plus optional
//! country, localization, trait, weight and hierarchy tables. Documents are
//! read through the `config` crate, so any format it supports works; the
//! built-in seed is TOML.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use super::mutate::Registration;
use super::store::{Registry, timestamp_version};
use crate::currency::{CountryId, Currency, CurrencyId};
use crate::display::LocalizedProperties;
use crate::error::{MoneyError, MoneyResult};
use crate::hierarchy::{Hierarchies, HierarchySpec};

/// The built-in currency table.
const BUILTIN_SEED: &str = include_str!("../../resources/seed.toml");

/// Attributes of one currency in a registry document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CurrencySpec {
    /// Numeric id.
    #[serde(default)]
    pub numeric: Option<u32>,
    /// Nominal scale; omitted means auto-scaled.
    #[serde(default)]
    pub scale: Option<u32>,
    /// Domain tag.
    #[serde(default)]
    pub domain: Option<String>,
    /// Kind tag.
    #[serde(default)]
    pub kind: Option<String>,
    /// Explicit weight.
    #[serde(default)]
    pub weight: Option<i32>,
}

impl CurrencySpec {
    /// Builds the currency this entry describes.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Validation` on malformed attributes.
    pub fn build(&self, id: &str) -> MoneyResult<Currency> {
        Currency::builder(id)
            .numeric_opt(self.numeric)
            .scale_opt(self.scale)
            .domain_opt(self.domain.as_deref())
            .kind_opt(self.kind.as_deref())
            .weight(self.weight.unwrap_or(0))
            .build()
    }
}

/// A whole registry document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RegistrySpec {
    /// Version tag; a timestamp is used when omitted.
    #[serde(default)]
    pub version: Option<String>,
    /// Currencies keyed by textual id.
    #[serde(default)]
    pub currencies: BTreeMap<String, CurrencySpec>,
    /// Country code to currency id.
    #[serde(default)]
    pub countries: BTreeMap<String, String>,
    /// Currency id to locale to properties.
    #[serde(default)]
    pub localized: BTreeMap<String, BTreeMap<String, LocalizedProperties>>,
    /// Currency id to trait tags.
    #[serde(default)]
    pub traits: BTreeMap<String, Vec<String>>,
    /// Currency id to explicit weight.
    #[serde(default)]
    pub weights: BTreeMap<String, i32>,
    /// Classification hierarchies.
    #[serde(default)]
    pub hierarchies: HierarchySpec,
    /// Free-form extension data.
    #[serde(default)]
    pub ext: BTreeMap<String, serde_json::Value>,
}

impl RegistrySpec {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::InvalidRepresentation` if the document is malformed.
    pub fn from_toml(text: &str) -> MoneyResult<Self> {
        read(config::Config::builder().add_source(config::File::from_str(text, config::FileFormat::Toml)))
    }

    /// Reads a document from a file; the format follows the extension.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::InvalidRepresentation` if the file is missing or malformed.
    pub fn from_path(path: &Path) -> MoneyResult<Self> {
        read(config::Config::builder().add_source(config::File::from(path)))
    }
}

fn read(builder: config::ConfigBuilder<config::builder::DefaultState>) -> MoneyResult<RegistrySpec> {
    builder
        .build()
        .and_then(config::Config::try_deserialize)
        .map_err(|err| MoneyError::invalid(format!("Registry document: {err}")))
}

fn parse_id(id: &str) -> MoneyResult<CurrencyId> {
    CurrencyId::parse(id)
}

impl Registry {
    /// Builds a registry from a document, validating every entry through the
    /// regular registration path.
    ///
    /// # Errors
    ///
    /// Returns the first validation, duplicate or missing-currency error.
    pub fn from_spec(spec: &RegistrySpec) -> MoneyResult<Self> {
        let hierarchies = Hierarchies::from_spec(&spec.hierarchies)?;
        let version = spec.version.clone().unwrap_or_else(timestamp_version);

        let mut registry = Self::new().with_hierarchies(hierarchies).with_version(version);
        for (id, entry) in &spec.currencies {
            registry = registry.register(entry.build(id)?, Registration::default())?;
        }

        for (id, weight) in &spec.weights {
            registry = registry.set_weight(&parse_id(id)?, *weight)?;
        }

        let mut by_currency: BTreeMap<CurrencyId, Vec<CountryId>> = BTreeMap::new();
        for (country, id) in &spec.countries {
            by_currency
                .entry(parse_id(id)?)
                .or_default()
                .push(CountryId::new(country)?);
        }
        for (id, countries) in &by_currency {
            registry = registry.add_countries(id, countries)?;
        }

        for (id, properties) in &spec.localized {
            registry = registry.add_localized_properties(&parse_id(id)?, properties.clone())?;
        }

        for (id, traits) in &spec.traits {
            registry = registry.set_traits(&parse_id(id)?, traits.iter().cloned())?;
        }

        for (key, value) in &spec.ext {
            registry = registry.with_ext(key.clone(), value.clone());
        }

        Ok(registry)
    }

    /// Parses and builds a registry from a TOML document.
    ///
    /// # Errors
    ///
    /// See [`RegistrySpec::from_toml`] and [`Registry::from_spec`].
    pub fn from_toml(text: &str) -> MoneyResult<Self> {
        Self::from_spec(&RegistrySpec::from_toml(text)?)
    }

    /// Loads a registry document from a file.
    ///
    /// # Errors
    ///
    /// See [`RegistrySpec::from_path`] and [`Registry::from_spec`].
    pub fn from_path(path: &Path) -> MoneyResult<Self> {
        let registry = Self::from_spec(&RegistrySpec::from_path(path)?)?;
        info!(path = %path.display(), currencies = registry.len(), version = registry.version(), "Loaded currency registry");
        Ok(registry)
    }

    /// The built-in currency table.
    ///
    /// # Errors
    ///
    /// Fails only if the embedded seed is malformed.
    pub fn builtin() -> MoneyResult<Self> {
        Self::from_toml(BUILTIN_SEED)
    }
}
