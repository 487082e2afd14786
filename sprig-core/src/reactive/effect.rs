//! Effect Implementation
//!
//! An Effect is a re-runnable computation whose reads are tracked and whose
//! reruns are triggered by writes to what it read.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its function immediately to establish
//!    initial dependencies (unless created lazily).
//!
//! 2. When any dependency changes, the effect either reruns synchronously
//!    or, if it carries a scheduler, hands the decision to the scheduler.
//!    Render effects use this to defer into the job queue; computed values
//!    use it to flip a dirty flag.
//!
//! 3. Before a tracked rerun, the effect leaves every dependency set it
//!    joined, so its subscriptions always reflect its last run.
//!
//! # Stopping
//!
//! `stop()` is idempotent. It removes the effect from every dependency set,
//! calls the on-stop callback once, and marks the effect inactive. A stopped
//! effect can still be run by hand, but the run is untracked.
//!
//! # Ownership
//!
//! Dependency sets hold effects weakly. An effect keeps reacting only while
//! at least one `Effect` handle to it is alive.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use super::context::ReactiveContext;
use super::dep::Dep;
use super::subscriber::{Subscriber, SubscriberId};

/// Hook invoked instead of a direct rerun when a dependency changes.
pub type Scheduler = Rc<dyn Fn()>;

/// Options for [`effect_with`] and [`Effect::with_options`].
#[derive(Clone, Default)]
pub struct EffectOptions {
    pub scheduler: Option<Scheduler>,
    pub on_stop: Option<Rc<dyn Fn()>>,
    /// Skip the initial run.
    pub lazy: bool,
}

impl EffectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduler<F>(mut self, scheduler: F) -> Self
    where
        F: Fn() + 'static,
    {
        self.scheduler = Some(Rc::new(scheduler));
        self
    }

    pub fn on_stop<F>(mut self, on_stop: F) -> Self
    where
        F: Fn() + 'static,
    {
        self.on_stop = Some(Rc::new(on_stop));
        self
    }

    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }
}

pub(crate) struct EffectInner<T> {
    id: SubscriberId,
    func: Box<dyn Fn() -> T>,
    scheduler: Option<Scheduler>,
    on_stop: RefCell<Option<Rc<dyn Fn()>>>,
    deps: RefCell<SmallVec<[Dep; 4]>>,
    active: Cell<bool>,
    run_count: Cell<usize>,
    this: Weak<EffectInner<T>>,
}

impl<T: 'static> EffectInner<T> {
    fn run(&self) -> T {
        self.run_count.set(self.run_count.get() + 1);

        if !self.active.get() {
            let _ctx = ReactiveContext::untracked();
            return (self.func)();
        }

        self.cleanup();

        let _ctx = match self.this.upgrade() {
            Some(this) => ReactiveContext::enter(this),
            None => ReactiveContext::untracked(),
        };
        (self.func)()
    }

    fn cleanup(&self) {
        let deps = std::mem::take(&mut *self.deps.borrow_mut());
        for dep in deps {
            dep.remove(self.id);
        }
    }

    fn stop(&self) {
        if !self.active.get() {
            return;
        }
        self.cleanup();
        if let Some(on_stop) = self.on_stop.borrow_mut().take() {
            on_stop();
        }
        self.active.set(false);
    }
}

impl<T: 'static> Subscriber for EffectInner<T> {
    fn subscriber_id(&self) -> SubscriberId {
        self.id
    }

    fn is_active(&self) -> bool {
        self.active.get()
    }

    fn record_dep(&self, dep: &Dep) {
        self.deps.borrow_mut().push(dep.clone());
    }

    fn notify(self: Rc<Self>) {
        match &self.scheduler {
            Some(scheduler) => scheduler(),
            None => {
                self.run();
            }
        }
    }
}

/// A re-runnable, dependency-tracked computation.
///
/// # Example
///
/// ```rust,ignore
/// let state = reactive(Object::from_entries([("count", 0)]));
///
/// let effect = Effect::new(move || {
///     println!("count is {}", state.get("count"));
/// });
///
/// state.set("count", 5);  // Prints: "count is 5"
/// ```
pub struct Effect<T = ()> {
    inner: Rc<EffectInner<T>>,
}

impl<T: 'static> Effect<T> {
    /// Create an effect and run it immediately.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        Self::with_options(func, EffectOptions::default())
    }

    /// Create an effect without running it.
    pub fn new_lazy<F>(func: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        Self::with_options(func, EffectOptions::new().lazy())
    }

    pub fn with_options<F>(func: F, options: EffectOptions) -> Self
    where
        F: Fn() -> T + 'static,
    {
        let inner = Rc::new_cyclic(|this| EffectInner {
            id: SubscriberId::new(),
            func: Box::new(func),
            scheduler: options.scheduler,
            on_stop: RefCell::new(options.on_stop),
            deps: RefCell::new(SmallVec::new()),
            active: Cell::new(true),
            run_count: Cell::new(0),
            this: this.clone(),
        });
        let effect = Self { inner };

        if !options.lazy {
            effect.run();
        }

        effect
    }

    /// Run the computation and return its result.
    ///
    /// Active effects track their reads during the run.
    pub fn run(&self) -> T {
        self.inner.run()
    }

    /// Stop reacting to changes.
    pub fn stop(&self) {
        self.inner.stop();
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    pub fn id(&self) -> SubscriberId {
        self.inner.id
    }

    /// Number of times the computation has run.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.get()
    }

    /// Number of dependency sets the effect currently belongs to.
    pub fn dependency_count(&self) -> usize {
        self.inner.deps.borrow().len()
    }

    pub fn downgrade(&self) -> WeakEffect<T> {
        WeakEffect {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl<T> Clone for Effect<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Effect<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.inner.id)
            .field("run_count", &self.inner.run_count.get())
            .field("dependency_count", &self.inner.deps.borrow().len())
            .field("active", &self.inner.active.get())
            .finish()
    }
}

/// A non-owning handle to an effect.
pub struct WeakEffect<T = ()> {
    inner: Weak<EffectInner<T>>,
}

impl<T> WeakEffect<T> {
    pub fn upgrade(&self) -> Option<Effect<T>> {
        self.inner.upgrade().map(|inner| Effect { inner })
    }
}

impl<T> Clone for WeakEffect<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

/// Create an effect and run it immediately.
#[must_use = "dropping the last handle stops the effect from reacting"]
pub fn effect<T, F>(func: F) -> Effect<T>
where
    T: 'static,
    F: Fn() -> T + 'static,
{
    Effect::new(func)
}

/// Create an effect with a scheduler, on-stop callback or lazy start.
#[must_use = "dropping the last handle stops the effect from reacting"]
pub fn effect_with<T, F>(func: F, options: EffectOptions) -> Effect<T>
where
    T: 'static,
    F: Fn() -> T + 'static,
{
    Effect::with_options(func, options)
}

/// Stop an effect.
pub fn stop<T: 'static>(effect: &Effect<T>) {
    effect.stop();
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
