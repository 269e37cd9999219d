//! Reactive state for model data.
//!
//! - [`Observable`]: a shared value with tracked reads and notifying writes.
//! - [`autorun`] / [`Reaction`]: a computation that re-runs when anything it
//!   read changes.
//! - [`batch`]: defers notifications so each reaction runs once per batch.
//! - [`wrap`] / [`ReactiveContainer`]: the shallow wrap applied to model
//!   fields; lists and maps become containers, scalars stay plain.
//!
//! # Architecture
//!
//! The engine is single-threaded. `Observable<T>` uses `Rc<RefCell<..>>` for
//! shared ownership and an [`Atom`] for dependency bookkeeping. Atoms hold
//! weak references to reactions, so dropping a `Reaction` handle is enough to
//! release it.
//!
//! # Invariants
//!
//! 1. A reaction runs once immediately and then once per batch in which a
//!    dependency changed.
//! 2. Setting an observable to an equal value is a no-op.
//! 3. Changes to values nested below a container's direct children are never
//!    observed.

mod container;
mod observable;
mod runtime;

pub use container::{wrap, ReactiveContainer, ReactiveValue, WriteOutcome};
pub use observable::{Observable, Subscription};
pub use runtime::{
    autorun, batch, batched, is_batching, untracked, Atom, Batched, Reaction, MAX_REACTION_ROUNDS,
};
