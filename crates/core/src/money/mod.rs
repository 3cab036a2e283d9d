//! Monetary amounts and their arithmetic.

pub mod allocation;
pub mod ops;
pub mod types;

#[cfg(test)]
mod props;

pub use ops::{Operand, divide, multiply};
pub use types::Money;
