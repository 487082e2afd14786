//! Reactive Runtime
//!
//! The runtime owns the dependency graph: a mapping from target object to
//! property key to the [`Dep`] of effects that read it.
//!
//! # How It Works
//!
//! 1. When a mutable wrapper is read inside a running effect, the runtime
//!    records the effect against (target, key), creating entries lazily.
//!
//! 2. When a mutable wrapper is written, the runtime looks up the entry and
//!    notifies its subscribers.
//!
//! 3. Entries are never pruned proactively. Stopping an effect removes it
//!    from every set it joined, but empty sets stay in the map.
//!
//! # Thread Safety
//!
//! The graph is thread-local. Reactivity is single-threaded by design;
//! there is nothing to lock, only reentrancy to keep in mind.

use std::cell::RefCell;
use std::collections::HashMap;

use super::context::ReactiveContext;
use super::dep::Dep;
use crate::value::{Key, ObjectId};

thread_local! {
    static TARGET_MAP: RefCell<HashMap<ObjectId, HashMap<Key, Dep>>> = RefCell::new(HashMap::new());
}

/// The dependency graph.
pub struct Runtime;

impl Runtime {
    /// Record that the active effect read `key` on `target`.
    pub fn track(target: ObjectId, key: &Key) {
        if !ReactiveContext::is_tracking() {
            return;
        }

        let dep = TARGET_MAP.with(|map| {
            map.borrow_mut()
                .entry(target)
                .or_default()
                .entry(key.clone())
                .or_default()
                .clone()
        });

        // The map borrow is released before the subscriber records the dep.
        dep.track();
    }

    /// Notify every effect that read `key` on `target`.
    pub fn trigger(target: ObjectId, key: &Key) {
        let dep = TARGET_MAP.with(|map| {
            map.borrow()
                .get(&target)
                .and_then(|keys| keys.get(key))
                .cloned()
        });

        if let Some(dep) = dep {
            dep.trigger();
        }
    }

    /// Get the dependency set for (target, key), if one was ever created.
    pub fn dep(target: ObjectId, key: &Key) -> Option<Dep> {
        TARGET_MAP.with(|map| {
            map.borrow()
                .get(&target)
                .and_then(|keys| keys.get(key))
                .cloned()
        })
    }

    /// Number of effects subscribed to (target, key).
    pub fn subscriber_count(target: ObjectId, key: &Key) -> usize {
        Self::dep(target, key).map_or(0, |dep| dep.len())
    }

    /// Check if we're inside a tracking context.
    pub fn is_tracking() -> bool {
        ReactiveContext::is_tracking()
    }
}
