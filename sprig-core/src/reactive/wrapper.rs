//! Reactive Wrappers
//!
//! A [`Reactive`] is an explicit read/write view over an [`Object`]. All
//! access goes through `get`/`set`, which is where tracking and
//! notification happen.
//!
//! # Modes
//!
//! - `Mutable`: reads are tracked, writes notify. Nested composites are
//!   wrapped on access, never eagerly.
//! - `Readonly`: reads are not tracked, writes are dropped with a warning.
//!   Nested composites come back read-only too.
//! - `ShallowReadonly`: like `Readonly`, but nested composites come back raw.
//!
//! A wrapper is just (target, mode), so wrapping the same object twice in
//! the same mode yields equal wrappers.

use std::fmt;

use tracing::warn;

use super::runtime::Runtime;
use crate::error::ReactiveError;
use crate::value::{Key, Object, Value};

/// How a wrapper treats reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapMode {
    Mutable,
    Readonly,
    ShallowReadonly,
}

impl WrapMode {
    pub fn is_readonly(self) -> bool {
        !matches!(self, WrapMode::Mutable)
    }
}

/// A tracking or read-only view over a composite value.
#[derive(Clone)]
pub struct Reactive {
    target: Object,
    mode: WrapMode,
}

impl Reactive {
    pub fn new(target: Object, mode: WrapMode) -> Self {
        Self { target, mode }
    }

    /// Read `key`.
    ///
    /// Mutable wrappers record the read against the active effect. Nested
    /// composites are wrapped in the same mode, except under
    /// `ShallowReadonly`.
    pub fn get(&self, key: impl Into<Key>) -> Value {
        let key = key.into();
        let raw = self.target.get(&key).unwrap_or_default();

        if self.mode == WrapMode::Mutable {
            Runtime::track(self.target.id(), &key);
        }

        match (self.mode, raw) {
            (WrapMode::ShallowReadonly, raw) => raw,
            (mode, Value::Object(nested)) => Value::Reactive(Reactive::new(nested, mode)),
            (mode, Value::Reactive(nested)) => Value::Reactive(Reactive::new(nested.target, mode)),
            (_, raw) => raw,
        }
    }

    /// Check for `key`, tracking the probe like a read.
    pub fn has(&self, key: impl Into<Key>) -> bool {
        let key = key.into();
        if self.mode == WrapMode::Mutable {
            Runtime::track(self.target.id(), &key);
        }
        self.target.contains_key(&key)
    }

    /// Write `key` and notify its subscribers.
    ///
    /// On a read-only wrapper the write is dropped and a warning is logged.
    /// Wrapped values are stored raw.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) {
        if let Err(err) = self.try_set(key, value) {
            warn!(target: "sprig::reactive", "{err}");
        }
    }

    /// Like [`set`](Self::set), but reports read-only violations.
    pub fn try_set(&self, key: impl Into<Key>, value: impl Into<Value>) -> Result<(), ReactiveError> {
        let key = key.into();
        if self.mode.is_readonly() {
            return Err(ReactiveError::ReadonlyWrite { key });
        }

        let grows = match &key {
            Key::Index(index) => self.target.is_array() && *index >= self.target.len(),
            Key::Name(_) => false,
        };
        self.target.insert(key.clone(), to_raw(&value.into()));
        if let Key::Index(index) = &key {
            if self.target.is_array() && *index >= self.target.len() {
                // Dropped by the target.
                return Ok(());
            }
        }

        Runtime::trigger(self.target.id(), &key);
        if grows {
            Runtime::trigger(self.target.id(), &Key::length());
        }
        Ok(())
    }

    /// Length of the target, tracked through its `length` key.
    pub fn len(&self) -> usize {
        if self.mode == WrapMode::Mutable {
            Runtime::track(self.target.id(), &Key::length());
        }
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append to an array target.
    pub fn push(&self, value: impl Into<Value>) {
        let index = self.target.len();
        self.set(Key::Index(index), value);
    }

    pub fn is_reactive(&self) -> bool {
        self.mode == WrapMode::Mutable
    }

    pub fn is_readonly(&self) -> bool {
        self.mode.is_readonly()
    }

    pub fn mode(&self) -> WrapMode {
        self.mode
    }

    /// The wrapped object, for raw access.
    pub fn raw(&self) -> &Object {
        &self.target
    }
}

impl PartialEq for Reactive {
    fn eq(&self, other: &Self) -> bool {
        self.mode == other.mode && self.target.ptr_eq(&other.target)
    }
}

impl fmt::Debug for Reactive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactive")
            .field("target", &self.target.id())
            .field("mode", &self.mode)
            .finish()
    }
}

/// Wrap an object in a tracking view.
pub fn reactive(target: Object) -> Reactive {
    Reactive::new(target, WrapMode::Mutable)
}

/// Wrap an object in a deep read-only view.
pub fn readonly(target: Object) -> Reactive {
    Reactive::new(target, WrapMode::Readonly)
}

/// Wrap an object in a read-only view that leaves nested values raw.
pub fn shallow_readonly(target: Object) -> Reactive {
    Reactive::new(target, WrapMode::ShallowReadonly)
}

/// Wrap a dynamic value.
///
/// Non-composite values pass through unchanged with a warning. Wrapping a
/// wrapper that already has the requested mode returns it as is, and a
/// read-only wrapper is never upgraded to a mutable one.
pub fn wrap(value: Value, mode: WrapMode) -> Value {
    match try_wrap(value, mode) {
        Ok(wrapped) => wrapped,
        Err((value, err)) => {
            warn!(target: "sprig::reactive", "{err}");
            value
        }
    }
}

/// Like [`wrap`], but hands back the value along with the error.
pub fn try_wrap(value: Value, mode: WrapMode) -> Result<Value, (Value, ReactiveError)> {
    match value {
        Value::Object(target) => Ok(Value::Reactive(Reactive::new(target, mode))),
        Value::Reactive(existing) if existing.mode == mode => Ok(Value::Reactive(existing)),
        Value::Reactive(existing) if mode == WrapMode::Mutable => Ok(Value::Reactive(existing)),
        Value::Reactive(existing) => Ok(Value::Reactive(Reactive::new(existing.target, mode))),
        other => {
            let found = other.kind_name();
            Err((other, ReactiveError::InvalidTarget { found }))
        }
    }
}

pub fn is_reactive(value: &Value) -> bool {
    matches!(value, Value::Reactive(r) if r.is_reactive())
}

pub fn is_readonly(value: &Value) -> bool {
    matches!(value, Value::Reactive(r) if r.is_readonly())
}

pub fn is_proxy(value: &Value) -> bool {
    matches!(value, Value::Reactive(_))
}

/// Strip a wrapper, returning the underlying object.
pub fn to_raw(value: &Value) -> Value {
    match value {
        Value::Reactive(r) => Value::Object(r.target.clone()),
        other => other.clone(),
    }
}
