//! Shared mutable registry cell.
//!
//! Readers load the current snapshot wait-free. Writers compute a new
//! snapshot from the one they observed and publish it with compare-and-swap,
//! retrying from the latest snapshot when another writer won the race. Old
//! snapshots stay valid for as long as someone holds them.

use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};
use once_cell::sync::Lazy;
use tracing::{error, trace};

use super::mutate::Registration;
use super::store::Registry;
use crate::currency::Currency;
use crate::error::MoneyResult;
use crate::resolve::CurrencyRef;

static GLOBAL: Lazy<SharedRegistry> = Lazy::new(|| {
    let registry = Registry::builtin().unwrap_or_else(|err| {
        error!(error = %err, "Built-in currency seed rejected; starting with an empty registry");
        Registry::new()
    });
    SharedRegistry::new(registry)
});

/// A registry cell with atomic snapshot publication.
#[derive(Debug)]
pub struct SharedRegistry {
    cell: ArcSwap<Registry>,
}

impl Default for SharedRegistry {
    fn default() -> Self {
        Self::new(Registry::new())
    }
}

impl SharedRegistry {
    /// Creates a cell holding `registry`.
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self {
            cell: ArcSwap::from_pointee(registry),
        }
    }

    /// The process-wide cell, seeded from the built-in currency table.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// The current snapshot.
    #[must_use]
    pub fn load(&self) -> Arc<Registry> {
        self.cell.load_full()
    }

    /// Replaces the snapshot unconditionally.
    pub fn store(&self, registry: Registry) {
        self.cell.store(Arc::new(registry));
    }

    /// Applies a transform atomically and returns the published snapshot.
    ///
    /// The transform may run several times under contention, each time on
    /// the latest snapshot; it must not have side effects.
    ///
    /// # Errors
    ///
    /// Returns the transform's error; nothing is published in that case.
    pub fn update<F>(&self, mut transform: F) -> MoneyResult<Arc<Registry>>
    where
        F: FnMut(&Registry) -> MoneyResult<Registry>,
    {
        let mut current = self.cell.load_full();
        let mut attempts: u32 = 0;
        loop {
            let next = Arc::new(transform(&current)?);
            let previous = self.cell.compare_and_swap(&current, Arc::clone(&next));
            if Arc::ptr_eq(&*previous, &current) {
                if attempts > 0 {
                    trace!(attempts, "Registry update published after retries");
                }
                return Ok(next);
            }
            attempts += 1;
            current = Guard::into_inner(previous);
        }
    }

    /// Registers a currency in the shared snapshot.
    ///
    /// # Errors
    ///
    /// See [`Registry::register`].
    pub fn register(&self, currency: &Currency, registration: &Registration) -> MoneyResult<Arc<Registry>> {
        self.update(|registry| registry.register(currency.clone(), registration.clone()))
    }

    /// Unregisters a currency from the shared snapshot.
    #[must_use = "the returned snapshot reflects the removal"]
    pub fn unregister(&self, currency: impl Into<CurrencyRef>) -> Arc<Registry> {
        let reference = currency.into();
        let mut published = self.load();
        loop {
            let next = Arc::new(published.unregister(reference.clone()));
            let previous = self.cell.compare_and_swap(&published, Arc::clone(&next));
            if Arc::ptr_eq(&*previous, &published) {
                return next;
            }
            published = Guard::into_inner(previous);
        }
    }
}
