//! Shared types, errors, and configuration for Mintage.
//!
//! This crate provides common types used across all other crates:
//! - Rounding modes for decimal scale changes
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use types::RoundingMode;
