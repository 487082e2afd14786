//! Reactive Primitives
//!
//! This module implements the core reactive system: tracked wrappers,
//! refs, computed values, and effects. These primitives form the
//! foundation of Sprig's fine-grained reactivity.
//!
//! # Concepts
//!
//! ## Wrappers
//!
//! A [`Reactive`] is a view over a plain object. Reads through a mutable
//! wrapper inside a running effect register that effect against
//! (object, key); writes notify every effect registered there. Read-only
//! wrappers neither track nor write.
//!
//! ## Refs
//!
//! A [`Ref`] is a single reactive cell with its own subscriber set. Writing
//! an equal value is a no-op.
//!
//! ## Computed
//!
//! A [`Computed`] caches a derived value and recomputes lazily, once per
//! change, on the next access.
//!
//! ## Effects
//!
//! An [`Effect`] is a computation that reruns whenever something it read
//! changes, or hands that decision to a scheduler hook.
//!
//! # Implementation Notes
//!
//! Dependency tracking uses a thread-local context stack: running an effect
//! pushes it, and any tracked read consults the top of the stack. The
//! dependency graph maps (object, key) to subscriber sets and is also
//! thread-local.

mod computed;
mod context;
mod dep;
mod effect;
mod refs;
mod runtime;
mod subscriber;
mod wrapper;

pub use computed::{computed, Computed};
pub use context::{untracked, ReactiveContext};
pub use dep::Dep;
pub use effect::{effect, effect_with, stop, Effect, EffectOptions, Scheduler, WeakEffect};
pub use refs::{is_ref, unref, Ref};
pub use runtime::Runtime;
pub use subscriber::{Subscriber, SubscriberId};
pub use wrapper::{
    is_proxy, is_reactive, is_readonly, reactive, readonly, shallow_readonly, to_raw, try_wrap,
    wrap, Reactive, WrapMode,
};
