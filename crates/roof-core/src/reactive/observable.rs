//! Shared, version-tracked values with change notification.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::runtime::{autorun, Atom, Reaction};

struct ObservableInner<T> {
    value: RefCell<T>,
    atom: Atom,
    version: Cell<u64>,
}

/// A shared observable value
///
/// Cloning an `Observable` creates a new handle to the **same** value.
/// Reads through [`get`](Observable::get) or [`with`](Observable::with)
/// inside a reaction record a dependency; writes notify dependents.
pub struct Observable<T> {
    inner: Rc<ObservableInner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

impl<T: Clone + 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(ObservableInner {
                value: RefCell::new(value),
                atom: Atom::new(),
                version: Cell::new(0),
            }),
        }
    }

    /// Read the current value (tracked)
    pub fn get(&self) -> T {
        self.inner.atom.report_observed();
        self.inner.value.borrow().clone()
    }

    /// Read without recording a dependency
    pub fn get_untracked(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value (tracked)
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.atom.report_observed();
        f(&self.inner.value.borrow())
    }

    /// Store a new value and notify unconditionally, returning the old one
    pub fn replace(&self, value: T) -> T {
        let old = self.inner.value.replace(value);
        self.changed();
        old
    }

    /// Mutate in place and notify
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(&mut self.inner.value.borrow_mut());
        self.changed();
        result
    }

    /// Mutate in place; notify only when `f` reports a change
    pub fn update_if(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        let changed = f(&mut self.inner.value.borrow_mut());
        if changed {
            self.changed();
        }
        changed
    }

    /// Mutate in place without notifying anyone
    pub fn update_silent<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.inner.value.borrow_mut())
    }

    /// Monotonic counter bumped on every notifying write
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Whether two handles share the same value
    pub fn ptr_eq(&self, other: &Observable<T>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Call `callback` with the new value after every change
    ///
    /// The callback is not invoked for the current value.
    pub fn subscribe(&self, mut callback: impl FnMut(&T) + 'static) -> Subscription {
        let source = self.clone();
        let mut first = true;
        let reaction = autorun(move || {
            let value = source.get();
            if first {
                first = false;
            } else {
                callback(&value);
            }
        });
        Subscription { reaction }
    }

    fn changed(&self) {
        self.inner.version.set(self.inner.version.get() + 1);
        self.inner.atom.report_changed();
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Store a new value; equal values are a no-op
    ///
    /// Returns whether the value changed.
    pub fn set(&self, value: T) -> bool {
        if *self.inner.value.borrow() == value {
            return false;
        }
        self.replace(value);
        true
    }
}

/// Keeps a [`subscribe`](Observable::subscribe) callback alive; dropping it unsubscribes
#[must_use = "dropping a Subscription unsubscribes"]
pub struct Subscription {
    reaction: Reaction,
}

impl Subscription {
    pub fn unsubscribe(self) {
        self.reaction.dispose();
    }
}
