//! Ref Implementation
//!
//! A Ref is a single reactive cell. It holds a value and tracks which
//! effects read it through a private dependency set.
//!
//! # How Refs Work
//!
//! 1. Reading a ref inside a running effect subscribes the effect.
//!
//! 2. Writing compares the new raw value with the stored one using "same
//!    value" semantics. An equal write is a no-op: no notification, no rerun.
//!
//! 3. Object payloads are stored raw and exposed as mutable wrappers, so
//!    nested reads through the ref are tracked too.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::dep::Dep;
use super::wrapper::{to_raw, wrap, WrapMode};
use crate::value::{same_value, Value};

struct RefInner {
    raw: RefCell<Value>,
    value: RefCell<Value>,
    dep: Dep,
}

/// A single-value reactive cell.
///
/// # Example
///
/// ```rust,ignore
/// let count = Ref::new(0);
///
/// // Read the value (tracked inside effects)
/// let value = count.get();
///
/// // Update the value (notifies subscribers)
/// count.set(5);
/// ```
#[derive(Clone)]
pub struct Ref(Rc<RefInner>);

fn convert(raw: &Value) -> Value {
    match raw {
        Value::Object(_) => wrap(raw.clone(), WrapMode::Mutable),
        other => other.clone(),
    }
}

impl Ref {
    /// Create a ref with the given initial value.
    pub fn new(value: impl Into<Value>) -> Self {
        let raw = to_raw(&value.into());
        let value = convert(&raw);
        Self(Rc::new(RefInner {
            raw: RefCell::new(raw),
            value: RefCell::new(value),
            dep: Dep::new(),
        }))
    }

    /// Get the current value, subscribing the running effect.
    pub fn get(&self) -> Value {
        self.0.dep.track();
        self.0.value.borrow().clone()
    }

    /// Get the current value without tracking.
    pub fn get_untracked(&self) -> Value {
        self.0.value.borrow().clone()
    }

    /// Set a new value and notify subscribers if it changed.
    pub fn set(&self, value: impl Into<Value>) {
        let raw = to_raw(&value.into());
        if same_value(&self.0.raw.borrow(), &raw) {
            return;
        }

        *self.0.value.borrow_mut() = convert(&raw);
        *self.0.raw.borrow_mut() = raw;

        self.0.dep.trigger();
    }

    /// Update the value using a function of the current one.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&Value) -> Value,
    {
        let next = {
            let current = self.0.value.borrow();
            f(&current)
        };
        self.set(next);
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.0.dep.len()
    }

    pub fn ptr_eq(&self, other: &Ref) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ref")
            .field("value", &self.0.value.borrow())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

pub fn is_ref(value: &Value) -> bool {
    matches!(value, Value::Ref(_))
}

/// Read through a ref, or return a non-ref value unchanged.
pub fn unref(value: &Value) -> Value {
    match value {
        Value::Ref(r) => r.get(),
        other => other.clone(),
    }
}
