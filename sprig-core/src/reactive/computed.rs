//! Computed Implementation
//!
//! A Computed is a cached derived value that re-evaluates only when its
//! dependencies change.
//!
//! # How Computed Values Work
//!
//! 1. Nothing runs at creation. The getter runs on first access, inside a
//!    private effect, and the result is cached.
//!
//! 2. When a dependency changes, the private effect's scheduler marks the
//!    value dirty. It never reruns the getter eagerly.
//!
//! 3. The next access recomputes exactly once and caches again.
//!
//! Computed values are themselves tracked: an effect that reads one is
//! notified when it turns dirty, and re-reading it triggers the recompute.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::dep::Dep;
use super::effect::{Effect, EffectOptions};

struct ComputedInner<T> {
    value: RefCell<Option<T>>,
    dirty: Cell<bool>,
    effect: Effect<T>,
    dep: Dep,
}

/// A lazily recomputed, dependency-tracked derived value.
pub struct Computed<T> {
    inner: Rc<ComputedInner<T>>,
}

impl<T: Clone + 'static> Computed<T> {
    /// Create a computed value. The getter is not run until first access.
    pub fn new<F>(getter: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        let inner = Rc::new_cyclic(|this: &Weak<ComputedInner<T>>| {
            let this = this.clone();
            let effect = Effect::with_options(
                getter,
                EffectOptions::new().lazy().scheduler(move || {
                    if let Some(inner) = this.upgrade() {
                        if !inner.dirty.replace(true) {
                            inner.dep.trigger();
                        }
                    }
                }),
            );
            ComputedInner {
                value: RefCell::new(None),
                dirty: Cell::new(true),
                effect,
                dep: Dep::new(),
            }
        });
        Self { inner }
    }

    /// Get the current value, recomputing if a dependency changed.
    pub fn get(&self) -> T {
        self.inner.dep.track();

        if !self.inner.dirty.get() {
            if let Some(value) = self.inner.value.borrow().as_ref() {
                return value.clone();
            }
        }
        self.recompute()
    }

    fn recompute(&self) -> T {
        self.inner.dirty.set(false);
        let value = self.inner.effect.run();
        *self.inner.value.borrow_mut() = Some(value.clone());
        value
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.get()
    }

    /// Check if the computed has a cached value.
    pub fn has_value(&self) -> bool {
        self.inner.value.borrow().is_some()
    }

    /// Stop tracking dependencies. The cached value is kept.
    pub fn stop(&self) {
        self.inner.effect.stop();
    }
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("value", &self.inner.value.borrow())
            .field("dirty", &self.inner.dirty.get())
            .finish()
    }
}

/// Create a computed value.
pub fn computed<T, F>(getter: F) -> Computed<T>
where
    T: Clone + 'static,
    F: Fn() -> T + 'static,
{
    Computed::new(getter)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
