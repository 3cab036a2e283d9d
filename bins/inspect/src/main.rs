//! Mintage inspector
//!
//! Resolves currency references and parses money values against the
//! configured registry, printing their full JSON forms.
//!
//! Usage: `mintage [--locale <locale>] [<currency-or-money>...]`

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde_json::{Value, json};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use mintage_core::{MoneyError, Registry, SharedRegistry, codec, context, display};
use mintage_shared::{AppConfig, AppError};
use mintage_shared::config::RegistryConfig;

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load configuration: {err}");
            std::process::exit(err.exit_code());
        }
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log.filter.as_str().into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let registry = build_registry(&config.registry)?;
    for problem in registry.check_integrity() {
        warn!(%problem, "Registry integrity problem");
    }
    info!(version = registry.version(), currencies = registry.len(), "Registry loaded");
    SharedRegistry::global().store(registry);
    let registry = SharedRegistry::global().load();

    let (locale, inputs) = parse_args(std::env::args().skip(1))?;
    let rounding = config.money.rounding_mode()?;

    let failures = context::with_rounding(rounding, || {
        context::with_rescale_each(config.money.rescale_each, || {
            context::with_default_currency(config.money.default_currency.clone(), || {
                run(&registry, &inputs, &locale)
            })
        })
    })?;

    if let Some(first) = failures.into_iter().next() {
        warn!(error = %first, "Some inputs could not be inspected");
        std::process::exit(AppError::from(first).exit_code());
    }
    Ok(())
}

fn build_registry(config: &RegistryConfig) -> anyhow::Result<Registry> {
    match &config.seed_path {
        Some(path) => Registry::from_path(Path::new(path))
            .with_context(|| format!("Failed to load registry seed {path}")),
        None if config.builtin => Registry::builtin().context("Failed to load the built-in registry seed"),
        None => Ok(Registry::new()),
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<(String, Vec<String>)> {
    let mut locale = "en".to_string();
    let mut inputs = Vec::new();
    while let Some(arg) = args.next() {
        if arg == "--locale" {
            locale = args.next().context("--locale needs a value")?;
        } else {
            inputs.push(arg);
        }
    }
    Ok((locale, inputs))
}

/// Prints a report per input and returns the errors of failed inputs.
fn run(registry: &Arc<Registry>, inputs: &[String], locale: &str) -> anyhow::Result<Vec<MoneyError>> {
    if inputs.is_empty() {
        let ids: Vec<String> = registry.currencies().map(|c| c.id().to_string()).collect();
        let summary = json!({
            "version": registry.version(),
            "currencies": ids,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(Vec::new());
    }

    let mut failures = Vec::new();
    for input in inputs {
        let report = match inspect(registry, input, locale) {
            Ok(report) => report,
            Err(err) => {
                let report = json!({ "input": input, "error": err.to_string(), "code": err.error_code() });
                failures.push(err);
                report
            }
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(failures)
}

fn inspect(registry: &Registry, input: &str, locale: &str) -> Result<Value, MoneyError> {
    match codec::parse_money(registry, input, context::rounding_mode()) {
        Ok(money) => Ok(json!({
            "input": input,
            "money": codec::money_to_full(&money)?,
            "display": display::display_money(registry, &money, locale),
        })),
        Err(MoneyError::InvalidRepresentation(_)) => inspect_currency(registry, input, locale),
        Err(err) => Err(err),
    }
}

fn inspect_currency(registry: &Registry, input: &str, locale: &str) -> Result<Value, MoneyError> {
    let candidates = registry.resolve_all(input);
    if candidates.is_empty() {
        return registry.resolve_strict(input).map(|_| Value::Null);
    }
    let candidates = candidates
        .iter()
        .map(|c| {
            Ok(json!({
                "currency": codec::currency_to_full(c)?,
                "name": display::display_name(registry, c, locale),
                "symbol": display::symbol(registry, c, locale),
                "countries": registry.countries_of(c.id()).map(ToString::to_string).collect::<Vec<_>>(),
                "traits": registry.traits(c.id()).map(|t| t.iter().cloned().collect::<Vec<_>>()),
            }))
        })
        .collect::<Result<Vec<Value>, MoneyError>>()?;
    Ok(json!({ "input": input, "candidates": candidates }))
}
