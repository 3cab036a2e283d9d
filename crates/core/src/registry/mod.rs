//! Currency registry.
//!
//! A [`Registry`] is an immutable snapshot: a primary id map plus weighted
//! secondary indexes by numeric id, code and domain, country mappings,
//! localized properties, traits and explicit weights. All changes are pure
//! transforms producing a new snapshot. [`SharedRegistry`] publishes
//! snapshots atomically for concurrent use.

pub mod bucket;
pub mod loader;
pub mod mutate;
pub mod shared;
pub mod store;

#[cfg(test)]
mod props;

pub use bucket::{Bucket, compare};
pub use loader::{CurrencySpec, RegistrySpec};
pub use mutate::Registration;
pub use shared::SharedRegistry;
pub use store::Registry;
