//! Subscriber types for the reactive system.
//!
//! A Subscriber represents any computation that depends on reactive values.
//! This includes plain effects, computed values, and render functions.

use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::dep::Dep;

/// Unique identifier for a subscriber.
///
/// Each subscriber gets a unique ID when created. This ID is used to key
/// subscriber sets and to avoid duplicate subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// A computation that can be notified when a dependency changes.
///
/// Dependency sets hold subscribers through this trait so that effects of
/// any result type can share them.
pub trait Subscriber {
    /// Get the subscriber ID.
    fn subscriber_id(&self) -> SubscriberId;

    /// Whether the subscriber still accepts notifications.
    fn is_active(&self) -> bool;

    /// Remember a dependency set this subscriber joined, for later cleanup.
    fn record_dep(&self, dep: &Dep);

    /// React to a change in one of the dependencies.
    fn notify(self: Rc<Self>);
}
