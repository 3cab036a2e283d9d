//! Scoped dynamic context.
//!
//! Rounding mode, per-step rescaling, the registry in use and the default
//! currency can be overridden for the duration of a closure. Overrides are
//! thread-local and restored on every exit path, including unwinding.

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use mintage_shared::RoundingMode;

use crate::registry::{Registry, SharedRegistry};
use crate::resolve::CurrencyRef;

thread_local! {
    static ROUNDING: Cell<Option<RoundingMode>> = const { Cell::new(None) };
    static RESCALE_EACH: Cell<bool> = const { Cell::new(false) };
    static REGISTRY: RefCell<Option<Arc<Registry>>> = const { RefCell::new(None) };
    static DEFAULT_CURRENCY: RefCell<Option<CurrencyRef>> = const { RefCell::new(None) };
}

/// Runs the restore closure when dropped.
struct ScopeGuard<F: FnOnce()> {
    restore: Option<F>,
}

impl<F: FnOnce()> ScopeGuard<F> {
    fn new(restore: F) -> Self {
        Self {
            restore: Some(restore),
        }
    }
}

impl<F: FnOnce()> Drop for ScopeGuard<F> {
    fn drop(&mut self) {
        if let Some(restore) = self.restore.take() {
            restore();
        }
    }
}

/// The rounding mode in effect on this thread, if any.
#[must_use]
pub fn rounding_mode() -> Option<RoundingMode> {
    ROUNDING.with(Cell::get)
}

/// Whether multi-operand arithmetic rescales after every step.
#[must_use]
pub fn rescale_each() -> bool {
    RESCALE_EACH.with(Cell::get)
}

/// The registry in effect: the scoped override, or the global snapshot.
#[must_use]
pub fn registry() -> Arc<Registry> {
    REGISTRY
        .with(|cell| cell.borrow().clone())
        .unwrap_or_else(|| SharedRegistry::global().load())
}

/// The default currency reference in effect, if any.
#[must_use]
pub fn default_currency() -> Option<CurrencyRef> {
    DEFAULT_CURRENCY.with(|cell| cell.borrow().clone())
}

/// Runs `f` with the given rounding mode (`None` clears any outer mode).
pub fn with_rounding<T>(mode: Option<RoundingMode>, f: impl FnOnce() -> T) -> T {
    let previous = ROUNDING.with(|cell| cell.replace(mode));
    let _guard = ScopeGuard::new(move || ROUNDING.with(|cell| cell.set(previous)));
    f()
}

/// Runs `f` with per-step rescaling switched on or off.
pub fn with_rescale_each<T>(enabled: bool, f: impl FnOnce() -> T) -> T {
    let previous = RESCALE_EACH.with(|cell| cell.replace(enabled));
    let _guard = ScopeGuard::new(move || RESCALE_EACH.with(|cell| cell.set(previous)));
    f()
}

/// Runs `f` against a specific registry snapshot instead of the global one.
pub fn with_registry<T>(registry: Arc<Registry>, f: impl FnOnce() -> T) -> T {
    let previous = REGISTRY.with(|cell| cell.replace(Some(registry)));
    let _guard = ScopeGuard::new(move || REGISTRY.with(|cell| *cell.borrow_mut() = previous));
    f()
}

/// Runs `f` with a default currency for amounts given without one.
pub fn with_default_currency<T>(currency: impl Into<CurrencyRef>, f: impl FnOnce() -> T) -> T {
    let currency = match currency.into() {
        CurrencyRef::Absent => None,
        other => Some(other),
    };
    let previous = DEFAULT_CURRENCY.with(|cell| cell.replace(currency));
    let _guard =
        ScopeGuard::new(move || DEFAULT_CURRENCY.with(|cell| *cell.borrow_mut() = previous));
    f()
}

/// Arithmetic settings for multi-operand operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArithOptions {
    /// Rounding mode applied when digits must be dropped.
    pub rounding: Option<RoundingMode>,
    /// Rescale to the nominal scale after every step instead of once at the end.
    pub rescale_each: bool,
}

impl ArithOptions {
    /// Options taken from the scoped context.
    #[must_use]
    pub fn ambient() -> Self {
        Self {
            rounding: rounding_mode(),
            rescale_each: rescale_each(),
        }
    }

    /// Overrides the rounding mode.
    #[must_use]
    pub const fn with_rounding(mut self, rounding: Option<RoundingMode>) -> Self {
        self.rounding = rounding;
        self
    }

    /// Overrides the rescaling policy.
    #[must_use]
    pub const fn with_rescale_each(mut self, rescale_each: bool) -> Self {
        self.rescale_each = rescale_each;
        self
    }
}
