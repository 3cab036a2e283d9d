//! Currency value model.

pub mod id;
pub mod types;

pub use id::{CountryId, CurrencyId, ISO_4217};
pub use types::{Currency, CurrencyBuilder, MAX_SCALE};
