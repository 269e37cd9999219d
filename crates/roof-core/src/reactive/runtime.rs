//! Dependency tracking and reaction scheduling.
//!
//! # Design
//!
//! An [`Atom`] is the smallest observable unit: reading it inside a running
//! [`Reaction`] records a dependency, changing it schedules every dependent
//! reaction. Scheduling always happens inside a batch; when the outermost
//! batch exits the pending queue is flushed and each reaction runs once.
//!
//! Tracking state lives in a thread-local, so the engine is strictly
//! single-threaded. Reactions re-collect their dependencies on every run.
//!
//! # Invariants
//!
//! 1. A reaction is queued at most once per flush round.
//! 2. A reaction never runs while its own body is executing.
//! 3. Writes made by a running reaction are deferred to the next round.
//! 4. A flush stops after [`MAX_REACTION_ROUNDS`] rounds.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll};

/// Upper bound on flush rounds before a self-triggering cycle is cut off
pub const MAX_REACTION_ROUNDS: usize = 100;

thread_local! {
    static TRACKER: Tracker = Tracker::default();
}

#[derive(Default)]
struct Tracker {
    /// Stack of running observers; `None` marks an untracked section
    observers: RefCell<Vec<Option<Rc<ReactionInner>>>>,
    batch_depth: Cell<usize>,
    pending: RefCell<Vec<Rc<ReactionInner>>>,
    flushing: Cell<bool>,
}

impl Tracker {
    fn current(&self) -> Option<Rc<ReactionInner>> {
        self.observers.borrow().last().cloned().flatten()
    }

    fn schedule(&self, reaction: Rc<ReactionInner>) {
        if reaction.scheduled.replace(true) {
            return;
        }
        self.pending.borrow_mut().push(reaction);
    }
}

/// An observable source in the dependency graph
#[derive(Clone, Default)]
pub struct Atom {
    inner: Rc<AtomInner>,
}

#[derive(Default)]
struct AtomInner {
    observers: RefCell<Vec<Weak<ReactionInner>>>,
}

impl Atom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a read by the currently running reaction, if any
    pub fn report_observed(&self) {
        if let Some(reaction) = TRACKER.with(Tracker::current) {
            reaction.track(&self.inner);
        }
    }

    /// Schedule every reaction that read this atom
    pub fn report_changed(&self) {
        let observers: Vec<Rc<ReactionInner>> = {
            let mut observers = self.inner.observers.borrow_mut();
            observers.retain(|w| w.strong_count() > 0);
            observers.iter().filter_map(Weak::upgrade).collect()
        };
        if observers.is_empty() {
            return;
        }

        batch(|| {
            TRACKER.with(|tracker| {
                for reaction in observers {
                    if !reaction.disposed.get() {
                        tracker.schedule(reaction);
                    }
                }
            })
        });
    }

    /// Number of live reactions depending on this atom
    pub fn observer_count(&self) -> usize {
        self.inner
            .observers
            .borrow()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }
}

struct ReactionInner {
    effect: RefCell<Box<dyn FnMut()>>,
    sources: RefCell<Vec<Weak<AtomInner>>>,
    disposed: Cell<bool>,
    scheduled: Cell<bool>,
    runs: Cell<u64>,
}

impl ReactionInner {
    fn track(self: &Rc<Self>, atom: &Rc<AtomInner>) {
        let mut sources = self.sources.borrow_mut();
        if sources.iter().any(|s| std::ptr::eq(s.as_ptr(), Rc::as_ptr(atom))) {
            return;
        }
        sources.push(Rc::downgrade(atom));
        atom.observers.borrow_mut().push(Rc::downgrade(self));
    }

    fn clear_sources(self: &Rc<Self>) {
        let sources: Vec<_> = self.sources.borrow_mut().drain(..).collect();
        for source in sources.iter().filter_map(Weak::upgrade) {
            source
                .observers
                .borrow_mut()
                .retain(|w| !std::ptr::eq(w.as_ptr(), Rc::as_ptr(self)));
        }
    }

    fn run(self: &Rc<Self>) {
        if self.disposed.get() {
            return;
        }
        // The batch guard is declared first so it drops last: the flush it may
        // trigger must not see the effect still borrowed.
        let _batch = BatchGuard::enter();
        // Re-entrant trigger: the running body already sees the newest state.
        let Ok(mut effect) = self.effect.try_borrow_mut() else {
            return;
        };

        self.clear_sources();
        let _observer = ObserverGuard::push(Some(Rc::clone(self)));
        self.runs.set(self.runs.get() + 1);
        effect();
    }
}

/// A computation that re-runs whenever an observable it read changes
///
/// Dropping the handle disposes the reaction.
#[must_use = "dropping a Reaction disposes it"]
pub struct Reaction {
    inner: Rc<ReactionInner>,
}

impl Reaction {
    /// Stop reacting and release all dependencies
    pub fn dispose(&self) {
        if !self.inner.disposed.replace(true) {
            self.inner.clear_sources();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// How many times the body has run (including the initial run)
    pub fn run_count(&self) -> u64 {
        self.inner.runs.get()
    }

    /// Number of atoms read during the last run
    pub fn dependency_count(&self) -> usize {
        self.inner
            .sources
            .borrow()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }
}

impl Drop for Reaction {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Reaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reaction")
            .field("runs", &self.inner.runs.get())
            .field("disposed", &self.inner.disposed.get())
            .finish()
    }
}

/// Run `effect` now and again whenever anything it read changes
pub fn autorun(effect: impl FnMut() + 'static) -> Reaction {
    let inner = Rc::new(ReactionInner {
        effect: RefCell::new(Box::new(effect)),
        sources: RefCell::new(Vec::new()),
        disposed: Cell::new(false),
        scheduled: Cell::new(false),
        runs: Cell::new(0),
    });
    inner.run();
    Reaction { inner }
}

/// Defer reaction scheduling until `f` returns
///
/// Nested batches are flattened; only the outermost one flushes.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    let _guard = BatchGuard::enter();
    f()
}

/// Read observables without recording dependencies
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let _guard = ObserverGuard::push(None);
    f()
}

/// Whether a batch is currently open on this thread
pub fn is_batching() -> bool {
    TRACKER.with(|t| t.batch_depth.get() > 0)
}

/// RAII batch scope; flushes pending reactions when the outermost scope exits
pub(crate) struct BatchGuard;

impl BatchGuard {
    pub(crate) fn enter() -> Self {
        TRACKER.with(|t| t.batch_depth.set(t.batch_depth.get() + 1));
        BatchGuard
    }
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        let flush = TRACKER.with(|t| {
            let depth = t.batch_depth.get().saturating_sub(1);
            t.batch_depth.set(depth);
            depth == 0 && !t.flushing.get()
        });
        if flush {
            flush_pending();
        }
    }
}

/// Future adapter that runs every poll of `inner` inside a batch
///
/// Synchronous segments of an async action between two await points each
/// commit as one batch.
pub struct Batched<F> {
    inner: F,
}

/// Wrap `future` so each of its polls is batched
pub fn batched<F: Future + Unpin>(future: F) -> Batched<F> {
    Batched { inner: future }
}

impl<F: Future + Unpin> Future for Batched<F> {
    type Output = F::Output;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let _guard = BatchGuard::enter();
        Pin::new(&mut self.inner).poll(cx)
    }
}

struct ObserverGuard;

impl ObserverGuard {
    fn push(observer: Option<Rc<ReactionInner>>) -> Self {
        TRACKER.with(|t| t.observers.borrow_mut().push(observer));
        ObserverGuard
    }
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        TRACKER.with(|t| {
            t.observers.borrow_mut().pop();
        });
    }
}

fn flush_pending() {
    TRACKER.with(|t| t.flushing.set(true));

    let mut rounds = 0;
    loop {
        let queue: Vec<_> = TRACKER.with(|t| std::mem::take(&mut *t.pending.borrow_mut()));
        if queue.is_empty() {
            break;
        }

        rounds += 1;
        if rounds > MAX_REACTION_ROUNDS {
            tracing::warn!(
                pending = queue.len(),
                "reaction cycle did not settle after {} rounds",
                MAX_REACTION_ROUNDS
            );
            for reaction in queue {
                reaction.scheduled.set(false);
            }
            break;
        }

        for reaction in queue {
            reaction.scheduled.set(false);
            reaction.run();
        }
    }

    TRACKER.with(|t| t.flushing.set(false));
}
