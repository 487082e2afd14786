//! Reactive Context
//!
//! The reactive context tracks which computation is currently running.
//! This enables automatic dependency tracking: when a tracked value is
//! read, we can register the current computation as a dependent.
//!
//! # Implementation
//!
//! We use a thread-local stack. Running an effect pushes it; the guard pops
//! it when the run finishes (or unwinds). An entry may also be *untracked*,
//! which shields reads from whatever computation is running further down
//! the stack. Stopped effects run under an untracked entry.

use std::cell::RefCell;
use std::rc::Rc;

use super::subscriber::{Subscriber, SubscriberId};

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<ContextEntry>> = const { RefCell::new(Vec::new()) };
}

/// An entry in the reactive context stack.
///
/// `None` marks an untracked region.
struct ContextEntry {
    subscriber: Option<Rc<dyn Subscriber>>,
}

/// Guard that pops the context when dropped.
///
/// This keeps the stack balanced even if the computation panics.
pub struct ReactiveContext {
    subscriber_id: Option<SubscriberId>,
}

impl ReactiveContext {
    /// Enter a tracking context for the given subscriber.
    ///
    /// While this context is active, tracked reads subscribe `subscriber`.
    pub fn enter(subscriber: Rc<dyn Subscriber>) -> Self {
        let subscriber_id = Some(subscriber.subscriber_id());
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().push(ContextEntry {
                subscriber: Some(subscriber),
            });
        });
        Self { subscriber_id }
    }

    /// Enter a region in which reads are not tracked.
    pub fn untracked() -> Self {
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().push(ContextEntry { subscriber: None });
        });
        Self { subscriber_id: None }
    }

    /// Check if reads would currently be tracked.
    pub fn is_tracking() -> bool {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .is_some_and(|entry| entry.subscriber.is_some())
        })
    }

    /// Get the subscriber that reads would currently be tracked against.
    pub fn active_subscriber() -> Option<Rc<dyn Subscriber>> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .and_then(|entry| entry.subscriber.clone())
        })
    }

    /// Get the current subscriber ID, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .and_then(|entry| entry.subscriber.as_ref())
                .map(|s| s.subscriber_id())
        })
    }

    /// Depth of the stack, for diagnostics.
    pub fn depth() -> usize {
        CONTEXT_STACK.with(|stack| stack.borrow().len())
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            // Catch mismatched enter/exit pairs early.
            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry.subscriber.map(|s| s.subscriber_id()),
                    self.subscriber_id,
                    "ReactiveContext mismatch"
                );
            }
        });
    }
}

/// Run `f` without tracking any reads it performs.
pub fn untracked<T>(f: impl FnOnce() -> T) -> T {
    let _ctx = ReactiveContext::untracked();
    f()
}
