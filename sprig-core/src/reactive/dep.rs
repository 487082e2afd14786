//! Dependency sets.
//!
//! A [`Dep`] is the set of subscribers of one tracked source: a
//! (target, key) pair in the dependency graph, a ref, or a computed value.
//! Subscribers are kept in insertion order and held weakly; a subscriber
//! whose last handle was dropped silently falls out of every set.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::context::ReactiveContext;
use super::subscriber::{Subscriber, SubscriberId};

#[derive(Clone, Default)]
pub struct Dep(Rc<RefCell<IndexMap<SubscriberId, Weak<dyn Subscriber>>>>);

impl Dep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe the active subscriber, if reads are being tracked.
    ///
    /// Subscribing twice in one run is a no-op.
    pub fn track(&self) {
        let Some(subscriber) = ReactiveContext::active_subscriber() else {
            return;
        };
        let id = subscriber.subscriber_id();
        if !subscriber.is_active() || self.0.borrow().contains_key(&id) {
            return;
        }
        self.0.borrow_mut().insert(id, Rc::downgrade(&subscriber));
        subscriber.record_dep(self);
    }

    /// Notify every live subscriber, in subscription order.
    ///
    /// Iterates over a snapshot, so subscribers may re-subscribe or stop
    /// while the notification is in progress. The subscriber that is
    /// currently running is skipped, which keeps an effect that writes
    /// what it reads from recursing into itself.
    pub fn trigger(&self) {
        let subscribers: Vec<Rc<dyn Subscriber>> = self
            .0
            .borrow()
            .values()
            .filter_map(Weak::upgrade)
            .collect();
        let running = ReactiveContext::current_subscriber();

        for subscriber in subscribers {
            if Some(subscriber.subscriber_id()) == running || !subscriber.is_active() {
                continue;
            }
            subscriber.notify();
        }
    }

    pub(crate) fn remove(&self, id: SubscriberId) {
        self.0.borrow_mut().shift_remove(&id);
    }

    pub fn contains(&self, id: SubscriberId) -> bool {
        self.0.borrow().contains_key(&id)
    }

    /// Number of subscribers, including ones that were dropped but not yet
    /// pruned.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ptr_eq(&self, other: &Dep) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dep").field("len", &self.len()).finish()
    }
}
