//! Job Scheduler
//!
//! The scheduler batches render-effect reruns so that several state changes
//! in a row produce one re-render.
//!
//! # Algorithm
//!
//! 1. `queue_job` appends a job unless the same job is already pending.
//! 2. The first enqueue of a cycle schedules one flush as a microtask.
//! 3. The flush drains the queue front to back until it is empty, including
//!    jobs enqueued by jobs that are running.
//!
//! There is no host event loop to lean on, so the microtask queue is
//! explicit: [`run_microtasks`] plays the role of the microtask checkpoint
//! and must be called by whoever drives the application.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

/// Unique identifier for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(u64);

impl JobId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// A unit of deferred work, identified by reference.
///
/// Clones share the identity of the original.
#[derive(Clone)]
pub struct Job {
    id: JobId,
    run: Rc<dyn Fn()>,
}

impl Job {
    pub fn new<F>(run: F) -> Self
    where
        F: Fn() + 'static,
    {
        Self {
            id: JobId::new(),
            run: Rc::new(run),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn run(&self) {
        (self.run)()
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job").field("id", &self.id).finish()
    }
}

type Microtask = Box<dyn FnOnce()>;

thread_local! {
    static QUEUE: RefCell<VecDeque<Job>> = const { RefCell::new(VecDeque::new()) };
    static FLUSH_PENDING: Cell<bool> = const { Cell::new(false) };
    static MICROTASKS: RefCell<VecDeque<Microtask>> = const { RefCell::new(VecDeque::new()) };
}

/// Enqueue a job for the next flush. A no-op if it is already pending.
pub fn queue_job(job: &Job) {
    let added = QUEUE.with(|queue| {
        let mut queue = queue.borrow_mut();
        if queue.iter().any(|pending| pending.id == job.id) {
            false
        } else {
            queue.push_back(job.clone());
            true
        }
    });

    if added {
        queue_flush();
    }
}

/// Drop a pending job from the queue, if present.
///
/// Used when a job is about to be run synchronously and the queued run
/// would be redundant.
pub fn invalidate_job(job: &Job) {
    QUEUE.with(|queue| queue.borrow_mut().retain(|pending| pending.id != job.id));
}

fn queue_flush() {
    if FLUSH_PENDING.with(|pending| pending.replace(true)) {
        return;
    }
    queue_microtask(flush_jobs);
}

/// Resets the pending flag even if a job panics mid-flush.
struct FlushGuard;

impl Drop for FlushGuard {
    fn drop(&mut self) {
        FLUSH_PENDING.with(|pending| pending.set(false));
    }
}

fn flush_jobs() {
    let _guard = FlushGuard;
    let mut ran = 0usize;

    while let Some(job) = QUEUE.with(|queue| queue.borrow_mut().pop_front()) {
        job.run();
        ran += 1;
    }

    debug!(target: "sprig::scheduler", jobs = ran, "flushed job queue");
}

/// Queue a callback on the microtask queue.
pub fn queue_microtask<F>(task: F)
where
    F: FnOnce() + 'static,
{
    MICROTASKS.with(|tasks| tasks.borrow_mut().push_back(Box::new(task)));
}

/// Run `callback` after the pending flush, if any, has completed.
pub fn next_tick<F>(callback: F)
where
    F: FnOnce() + 'static,
{
    queue_microtask(callback);
}

/// Drain the microtask queue, including tasks queued while draining.
///
/// Returns the number of tasks run.
pub fn run_microtasks() -> usize {
    let mut ran = 0;
    while let Some(task) = MICROTASKS.with(|tasks| tasks.borrow_mut().pop_front()) {
        task();
        ran += 1;
    }
    ran
}

/// Whether any job is waiting for a flush.
pub fn has_pending_jobs() -> bool {
    QUEUE.with(|queue| !queue.borrow().is_empty())
}
