//! Application configuration management.

use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::types::RoundingMode;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Registry seeding configuration.
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Money arithmetic defaults.
    #[serde(default)]
    pub money: MoneyConfig,
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// Registry seeding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Path to a TOML registry seed document.
    pub seed_path: Option<String>,
    /// Whether to fall back to the built-in seed when no path is given.
    #[serde(default = "default_builtin")]
    pub builtin: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            seed_path: None,
            builtin: default_builtin(),
        }
    }
}

fn default_builtin() -> bool {
    true
}

/// Money arithmetic defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoneyConfig {
    /// Currency used when a money value is built without one.
    pub default_currency: Option<String>,
    /// Rounding mode applied when no explicit mode is given.
    pub rounding_mode: Option<String>,
    /// Rescale after every multiplication/division step.
    #[serde(default)]
    pub rescale_each: bool,
}

impl MoneyConfig {
    /// Parses the configured rounding mode.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the mode name is unknown.
    pub fn rounding_mode(&self) -> AppResult<Option<RoundingMode>> {
        self.rounding_mode
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(AppError::Config)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "mintage=info".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> AppResult<Self> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("MINTAGE").separator("__"))
            .build()?;

        let app: Self = config.try_deserialize()?;
        app.money.rounding_mode()?;
        Ok(app)
    }
}
