//! Currency value type.
//!
//! A currency is an immutable value: identity plus attributes. Its weight is
//! auxiliary metadata used only for tie-breaking inside a registry and never
//! takes part in equality or hashing.

use std::hash::{Hash, Hasher};

use super::id::{CurrencyId, ISO_4217};
use crate::error::{MoneyError, MoneyResult};
use crate::hierarchy::Hierarchy;

/// Largest scale a currency may declare (the `Decimal` precision limit).
pub const MAX_SCALE: u32 = 28;

/// A currency: id, optional numeric id, optional nominal scale, domain and kind.
///
/// `scale == None` means the currency is auto-scaled (amounts keep whatever
/// scale they naturally have).
#[derive(Debug, Clone)]
pub struct Currency {
    id: CurrencyId,
    numeric: Option<u32>,
    scale: Option<u32>,
    domain: Option<String>,
    kind: Option<String>,
    weight: i32,
}

impl Currency {
    /// Starts building a currency from its textual id (`"CODE"` or `"qualifier/CODE"`).
    #[must_use]
    pub fn builder(id: &str) -> CurrencyBuilder {
        let (qualifier, code) = super::id::split_identifier(id);
        CurrencyBuilder {
            qualifier: qualifier.map(str::to_string),
            code: code.to_string(),
            ..CurrencyBuilder::default()
        }
    }

    /// Starts building a currency from separate qualifier and code parts.
    #[must_use]
    pub fn builder_from_parts(qualifier: Option<&str>, code: &str) -> CurrencyBuilder {
        CurrencyBuilder {
            qualifier: qualifier.map(str::to_string),
            code: code.to_string(),
            ..CurrencyBuilder::default()
        }
    }

    /// The currency id.
    #[must_use]
    pub fn id(&self) -> &CurrencyId {
        &self.id
    }

    /// The bare currency code.
    #[must_use]
    pub fn code(&self) -> &str {
        self.id.code()
    }

    /// The id qualifier, if any.
    #[must_use]
    pub fn qualifier(&self) -> Option<&str> {
        self.id.qualifier()
    }

    /// The numeric id, if any.
    #[must_use]
    pub fn numeric(&self) -> Option<u32> {
        self.numeric
    }

    /// The nominal scale; `None` means auto-scaled.
    #[must_use]
    pub fn scale(&self) -> Option<u32> {
        self.scale
    }

    /// The domain tag, if any.
    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// The kind tag, if any.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// The tie-breaking weight (lower wins). Not part of equality.
    #[must_use]
    pub fn weight(&self) -> i32 {
        self.weight
    }

    /// Returns true if the currency has no nominal scale.
    #[must_use]
    pub fn is_auto_scaled(&self) -> bool {
        self.scale.is_none()
    }

    /// Returns true if the currency has a numeric id.
    #[must_use]
    pub fn has_numeric(&self) -> bool {
        self.numeric.is_some()
    }

    /// Returns true if the currency belongs to the ISO 4217 domain.
    #[must_use]
    pub fn is_iso(&self) -> bool {
        self.domain.as_deref() == Some(ISO_4217)
    }

    /// Returns true if both currencies share the same id.
    #[must_use]
    pub fn same_id(&self, other: &Self) -> bool {
        self.id == other.id
    }

    /// Returns a copy with a different weight.
    #[must_use]
    pub fn with_weight(&self, weight: i32) -> Self {
        Self {
            weight,
            ..self.clone()
        }
    }

    /// Returns a copy with a different scale (an overriding currency).
    #[must_use]
    pub fn with_scale(&self, scale: Option<u32>) -> Self {
        Self {
            scale: scale.map(|s| s.min(MAX_SCALE)),
            ..self.clone()
        }
    }

    /// Returns a copy with a different kind.
    #[must_use]
    pub fn with_kind(&self, kind: Option<&str>) -> Self {
        Self {
            kind: kind.map(str::to_string),
            ..self.clone()
        }
    }

    /// Classification by domain: DAG ancestry when a hierarchy is given,
    /// plain equality otherwise. Domains compare upper-cased.
    #[must_use]
    pub fn is_of_domain(&self, domain: &str, hierarchy: Option<&Hierarchy>) -> bool {
        classify(self.domain(), &domain.trim().to_ascii_uppercase(), hierarchy)
    }

    /// Classification by kind: DAG ancestry when a hierarchy is given,
    /// plain equality otherwise.
    #[must_use]
    pub fn is_of_kind(&self, kind: &str, hierarchy: Option<&Hierarchy>) -> bool {
        classify(self.kind(), kind, hierarchy)
    }
}

fn classify(tag: Option<&str>, wanted: &str, hierarchy: Option<&Hierarchy>) -> bool {
    match (tag, hierarchy) {
        (None, _) => false,
        (Some(tag), Some(h)) => h.isa(tag, wanted),
        (Some(tag), None) => tag == wanted,
    }
}

impl PartialEq for Currency {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.numeric == other.numeric
            && self.scale == other.scale
            && self.domain == other.domain
            && self.kind == other.kind
    }
}

impl Eq for Currency {}

impl Hash for Currency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.numeric.hash(state);
        self.scale.hash(state);
        self.domain.hash(state);
        self.kind.hash(state);
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Builder for [`Currency`] values; `build` applies all normalization rules.
#[derive(Debug, Clone, Default)]
pub struct CurrencyBuilder {
    qualifier: Option<String>,
    code: String,
    numeric: Option<u32>,
    scale: Option<u32>,
    domain: Option<String>,
    kind: Option<String>,
    weight: i32,
}

impl CurrencyBuilder {
    /// Sets the numeric id.
    #[must_use]
    pub fn numeric(mut self, numeric: u32) -> Self {
        self.numeric = Some(numeric);
        self
    }

    /// Sets or clears the numeric id.
    #[must_use]
    pub fn numeric_opt(mut self, numeric: Option<u32>) -> Self {
        self.numeric = numeric;
        self
    }

    /// Sets the nominal scale.
    #[must_use]
    pub fn scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Sets or clears the nominal scale.
    #[must_use]
    pub fn scale_opt(mut self, scale: Option<u32>) -> Self {
        self.scale = scale;
        self
    }

    /// Sets an explicit domain (upper-cased).
    #[must_use]
    pub fn domain(mut self, domain: &str) -> Self {
        self.domain = Some(domain.to_string());
        self
    }

    /// Sets or clears an explicit domain.
    #[must_use]
    pub fn domain_opt(mut self, domain: Option<&str>) -> Self {
        self.domain = domain.map(str::to_string);
        self
    }

    /// Sets the kind.
    #[must_use]
    pub fn kind(mut self, kind: &str) -> Self {
        self.kind = Some(kind.to_string());
        self
    }

    /// Sets or clears the kind.
    #[must_use]
    pub fn kind_opt(mut self, kind: Option<&str>) -> Self {
        self.kind = kind.map(str::to_string);
        self
    }

    /// Sets the weight hint.
    #[must_use]
    pub const fn weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }

    /// Validates and normalizes the currency.
    ///
    /// Rules:
    /// - the `ISO-4217` qualifier is stripped and recorded as the domain;
    /// - an explicit domain contradicting that qualifier is rejected;
    /// - without an explicit domain, an unqualified three-letter code with a
    ///   numeric id is inferred to be ISO 4217.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Validation` on malformed input or a domain conflict.
    pub fn build(self) -> MoneyResult<Currency> {
        let (id, iso_marker) = CurrencyId::normalize(self.qualifier.as_deref(), &self.code)?;

        if self.numeric == Some(0) {
            return Err(MoneyError::validation(format!(
                "Numeric id of {id} must be positive"
            )));
        }
        if let Some(scale) = self.scale {
            if scale > MAX_SCALE {
                return Err(MoneyError::validation(format!(
                    "Scale {scale} of {id} exceeds the maximum of {MAX_SCALE}"
                )));
            }
        }

        let explicit_domain = normalize_tag(self.domain.as_deref()).map(|d| d.to_ascii_uppercase());
        let domain = match explicit_domain {
            Some(domain) => {
                if iso_marker && domain != ISO_4217 {
                    return Err(MoneyError::validation(format!(
                        "Domain {domain} of {id} contradicts its {ISO_4217} qualifier"
                    )));
                }
                Some(domain)
            }
            None if iso_marker => Some(ISO_4217.to_string()),
            None if self.numeric.is_some() && !id.is_qualified() && id.has_iso_shaped_code() => {
                Some(ISO_4217.to_string())
            }
            None => None,
        };

        Ok(Currency {
            id,
            numeric: self.numeric,
            scale: self.scale,
            domain,
            kind: normalize_tag(self.kind.as_deref()).map(str::to_string),
            weight: self.weight,
        })
    }
}

fn normalize_tag(tag: Option<&str>) -> Option<&str> {
    tag.map(str::trim).filter(|t| !t.is_empty())
}
