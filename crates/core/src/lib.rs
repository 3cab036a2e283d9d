//! Core currency logic for Mintage.
//!
//! This crate contains pure currency and money logic with ZERO I/O beyond
//! reading registry seed documents. All amounts are exact decimals.
//!
//! # Modules
//!
//! - `currency` - Currency values and identifiers
//! - `hierarchy` - Domain, kind and trait classification DAGs
//! - `registry` - Immutable multi-index currency registry and its shared cell
//! - `resolve` - Mapping references and constraint maps to registered currencies
//! - `scale` - Scale changes, rounding and exact division
//! - `money` - Monetary amounts, arithmetic and allocation
//! - `context` - Scoped rounding, registry and default currency
//! - `codec` - JSON and text wire forms
//! - `display` - Localized names and symbols

pub mod codec;
pub mod context;
pub mod currency;
pub mod display;
pub mod error;
pub mod hierarchy;
pub mod money;
pub mod registry;
pub mod resolve;
pub mod scale;

pub use context::ArithOptions;
pub use currency::{CountryId, Currency, CurrencyBuilder, CurrencyId};
pub use error::{MoneyError, MoneyResult};
pub use hierarchy::{Hierarchies, Hierarchy, HierarchySpec};
pub use mintage_shared::RoundingMode;
pub use money::{Money, Operand};
pub use registry::{Registration, Registry, RegistrySpec, SharedRegistry};
pub use resolve::{ConstraintMap, CurrencyRef};
pub use scale::{Rational, Scalable};
