//! Shallow reactive wrapping of plain values.
//!
//! [`wrap`] turns a list or map into a [`ReactiveContainer`] whose direct
//! children are tracked as a unit; scalars stay plain. Values nested deeper
//! than one level are plain data inside the container: writing them does not
//! notify anyone. This is the observable-wrap boundary of a model field.

use super::observable::Observable;
use crate::value::{PathKey, Value};

/// Outcome of a write into a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The value changed (dependents were notified if the write was reactive)
    Changed,
    /// The new value equals the old one
    Unchanged,
    /// The path does not lead to a writable slot
    Unreachable,
}

impl WriteOutcome {
    fn from_write(written: Option<bool>) -> Self {
        match written {
            Some(true) => WriteOutcome::Changed,
            Some(false) => WriteOutcome::Unchanged,
            None => WriteOutcome::Unreachable,
        }
    }
}

/// A list or map whose direct children are observable
#[derive(Clone, Debug)]
pub struct ReactiveContainer {
    node: Observable<Value>,
}

impl ReactiveContainer {
    /// Wrap a list or map value
    pub fn new(value: Value) -> Self {
        debug_assert!(value.is_container());
        Self {
            node: Observable::new(value),
        }
    }

    /// Clone the whole container content (tracked)
    pub fn snapshot(&self) -> Value {
        self.node.get()
    }

    /// Clone the content without recording a dependency
    pub fn snapshot_untracked(&self) -> Value {
        self.node.get_untracked()
    }

    /// Read a direct child (tracked)
    pub fn get(&self, key: &PathKey) -> Option<Value> {
        self.node.with(|v| v.child(key).cloned())
    }

    /// Read a nested value (tracked on the container)
    pub fn get_path(&self, path: &[PathKey]) -> Option<Value> {
        self.node.with(|v| v.get_path(path).cloned())
    }

    /// Number of direct children (tracked)
    pub fn len(&self) -> usize {
        self.node.with(|v| match v {
            Value::List(list) => list.len(),
            Value::Map(map) => map.len(),
            _ => 0,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_list(&self) -> bool {
        self.node.with(|v| matches!(v, Value::List(_)))
    }

    /// Write a direct child and notify dependents
    ///
    /// A missing map key is added, and adding it counts as a change.
    pub fn set(&self, key: &PathKey, value: Value) -> WriteOutcome {
        let mut outcome = WriteOutcome::Unreachable;
        self.node.update_if(|node| {
            outcome = WriteOutcome::from_write(node.set_child(key, value));
            outcome == WriteOutcome::Changed
        });
        outcome
    }

    /// Append to a list container and notify dependents
    pub fn push(&self, value: Value) -> WriteOutcome {
        let mut outcome = WriteOutcome::Unreachable;
        self.node.update_if(|node| match node {
            Value::List(list) => {
                list.push(value);
                outcome = WriteOutcome::Changed;
                true
            }
            _ => false,
        });
        outcome
    }

    /// Write below the first level; the write is not observed
    ///
    /// Every step but the last must already exist.
    pub fn set_deep(&self, path: &[PathKey], value: Value) -> WriteOutcome {
        let Some((last, parents)) = path.split_last() else {
            return WriteOutcome::Unreachable;
        };
        self.node.update_silent(|node| {
            let written = node
                .get_path_mut(parents)
                .and_then(|parent| parent.set_child(last, value));
            WriteOutcome::from_write(written)
        })
    }

    /// Whether two handles wrap the same container
    pub fn ptr_eq(&self, other: &ReactiveContainer) -> bool {
        self.node.ptr_eq(&other.node)
    }
}

/// A field value after wrapping
#[derive(Clone, Debug)]
pub enum ReactiveValue {
    /// Scalar leaf, stored as-is
    Plain(Value),
    /// Independently reactive list or map
    Container(ReactiveContainer),
}

impl ReactiveValue {
    /// Plain value view (tracked on the container, if any)
    pub fn to_value(&self) -> Value {
        match self {
            ReactiveValue::Plain(v) => v.clone(),
            ReactiveValue::Container(c) => c.snapshot(),
        }
    }

    pub fn to_value_untracked(&self) -> Value {
        match self {
            ReactiveValue::Plain(v) => v.clone(),
            ReactiveValue::Container(c) => c.snapshot_untracked(),
        }
    }

    pub fn is_reactive(&self) -> bool {
        matches!(self, ReactiveValue::Container(_))
    }

    pub fn as_container(&self) -> Option<&ReactiveContainer> {
        match self {
            ReactiveValue::Container(c) => Some(c),
            ReactiveValue::Plain(_) => None,
        }
    }
}

/// Wrap a plain value: lists and maps become containers, scalars stay plain
pub fn wrap(value: Value) -> ReactiveValue {
    if value.is_container() {
        ReactiveValue::Container(ReactiveContainer::new(value))
    } else {
        ReactiveValue::Plain(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::autorun;

    fn info() -> Value {
        Value::map([
            ("address", Value::from("beijing")),
            ("habits", Value::empty_list()),
            ("other", Value::map([("age", 33i64)])),
        ])
    }

    #[test]
    fn test_wrap_boundary() {
        assert!(wrap(info()).is_reactive());
        assert!(wrap(Value::from(vec![1i64])).is_reactive());
        assert!(!wrap(Value::from("name")).is_reactive());
        assert!(!wrap(Value::Null).is_reactive());
    }

    #[test]
    fn test_child_write_notifies() {
        let container = ReactiveContainer::new(info());
        let reaction = autorun({
            let container = container.clone();
            move || {
                container.get(&"address".into());
            }
        });

        assert_eq!(
            container.set(&"address".into(), "NanJing".into()),
            WriteOutcome::Changed
        );
        assert_eq!(reaction.run_count(), 2);

        assert_eq!(
            container.set(&"address".into(), "NanJing".into()),
            WriteOutcome::Unchanged
        );
        assert_eq!(reaction.run_count(), 2);
    }

    #[test]
    fn test_deep_write_is_not_observed() {
        let container = ReactiveContainer::new(info());
        let reaction = autorun({
            let container = container.clone();
            move || {
                container.snapshot();
            }
        });

        let outcome = container.set_deep(&["other".into(), "age".into()], 34i64.into());
        assert_eq!(outcome, WriteOutcome::Changed);
        assert_eq!(reaction.run_count(), 1);
        assert_eq!(
            container.get_path(&["other".into(), "age".into()]),
            Some(Value::Int(34))
        );
    }

    #[test]
    fn test_new_key_notifies_even_when_null() {
        let container = ReactiveContainer::new(info());
        let reaction = autorun({
            let container = container.clone();
            move || {
                container.len();
            }
        });

        assert_eq!(container.set(&"extra".into(), Value::Null), WriteOutcome::Changed);
        assert_eq!(reaction.run_count(), 2);
        assert_eq!(container.get(&"extra".into()), Some(Value::Null));
    }

    #[test]
    fn test_failed_deep_write_leaves_content() {
        let container = ReactiveContainer::new(info());
        let outcome = container.set_deep(&["missing".into(), "x".into()], 1i64.into());
        assert_eq!(outcome, WriteOutcome::Unreachable);
        assert_eq!(container.snapshot_untracked(), info());

        let outcome = container.set_deep(&["other".into(), "sign".into()], "dragon".into());
        assert_eq!(outcome, WriteOutcome::Changed);
    }

    #[test]
    fn test_push_requires_list() {
        let list = ReactiveContainer::new(Value::from(vec!["Jack"]));
        assert_eq!(list.push("Lili".into()), WriteOutcome::Changed);
        assert_eq!(list.len(), 2);
        assert!(list.is_list());

        let map = ReactiveContainer::new(info());
        assert_eq!(map.push("x".into()), WriteOutcome::Unreachable);
        assert_eq!(
            map.set(&PathKey::Index(0), "x".into()),
            WriteOutcome::Unreachable
        );
    }
}
