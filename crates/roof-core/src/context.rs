//! Exposing instances to a consuming tree
//!
//! A [`Context`] is the mount-time view a component tree gets of its models:
//! a fixed set of keys, each bound to one instance. Models are instantiated
//! once per mount. A [`Relation`] attached to the context sees every
//! successful dispatch on the provided instances.

use crate::error::{Error, Result};
use crate::model::{ListenerId, ModelInstance, ResolvedModel};
use crate::reactive::{autorun, Reaction};
use crate::relation::{ActionEvent, Relation};
use crate::value::ValueMap;
use indexmap::IndexMap;
use std::rc::{Rc, Weak};
use tracing::debug;

enum Provider {
    Model(ResolvedModel, ValueMap),
    Instance(ModelInstance),
}

/// Collects providers before mounting
#[derive(Default)]
pub struct ContextBuilder {
    providers: Vec<(String, Provider)>,
    relation: Option<Relation>,
}

impl ContextBuilder {
    /// Instantiate `model` under `key` when mounting
    pub fn provide(self, key: impl Into<String>, model: &ResolvedModel) -> Self {
        self.provide_with(key, model, ValueMap::new())
    }

    /// Instantiate `model` with overrides under `key` when mounting
    pub fn provide_with(mut self, key: impl Into<String>, model: &ResolvedModel, overrides: ValueMap) -> Self {
        self.providers
            .push((key.into(), Provider::Model(model.clone(), overrides)));
        self
    }

    /// Expose an existing instance under `key`
    pub fn provide_instance(mut self, key: impl Into<String>, instance: &ModelInstance) -> Self {
        self.providers
            .push((key.into(), Provider::Instance(instance.clone())));
        self
    }

    pub fn relation(mut self, relation: Relation) -> Self {
        self.relation = Some(relation);
        self
    }

    /// Create the instances and attach the relation
    ///
    /// A key provided twice keeps its first position and its last provider.
    pub fn mount(self) -> Result<Context> {
        let mut instances = IndexMap::new();
        for (key, provider) in self.providers {
            let instance = match provider {
                Provider::Model(model, overrides) => model.instantiate_with(overrides)?,
                Provider::Instance(instance) => instance,
            };
            instances.insert(key, instance);
        }

        let relation = self.relation;
        let inner = Rc::new_cyclic(|weak: &Weak<ContextInner>| {
            let listeners = match &relation {
                Some(_) => instances
                    .iter()
                    .map(|(key, instance)| (key.clone(), relay(weak.clone(), key.clone(), instance)))
                    .collect(),
                None => Vec::new(),
            };
            ContextInner {
                instances,
                relation,
                listeners,
            }
        });
        let context = Context { inner };

        debug!(keys = ?context.keys().collect::<Vec<_>>(), "mounted context");
        if let Some(relation) = context.relation() {
            relation.run_init(&context)?;
        }
        Ok(context)
    }
}

fn relay(context: Weak<ContextInner>, key: String, instance: &ModelInstance) -> ListenerId {
    instance.on_action_async(move |this, record| {
        let event = context.upgrade().and_then(|inner| {
            let relation = inner.relation.clone()?;
            let event = ActionEvent {
                context: Context { inner },
                key: key.clone(),
                model: this.name().to_string(),
                action: record.action.clone(),
                payload: record.payload.clone(),
                result: record.result.clone(),
            };
            Some((relation, event))
        });
        async move {
            match event {
                Some((relation, event)) => relation.trigger(event).await,
                None => Ok(()),
            }
        }
    })
}

struct ContextInner {
    instances: IndexMap<String, ModelInstance>,
    relation: Option<Relation>,
    listeners: Vec<(String, ListenerId)>,
}

impl Drop for ContextInner {
    fn drop(&mut self) {
        for (key, id) in &self.listeners {
            if let Some(instance) = self.instances.get(key) {
                instance.off_action(*id);
            }
        }
    }
}

/// Instances exposed to a consuming tree
///
/// Cloning creates another handle to the same mount.
///
/// # Example
///
/// ```
/// use roof_core::{create_model, Context, ModelDescription};
///
/// let user = create_model(ModelDescription::new("user").with_data("name", "")).unwrap();
/// let context = Context::builder().provide("user", &user).mount().unwrap();
///
/// assert_eq!(context.keys().collect::<Vec<_>>(), ["user"]);
/// assert!(context.inject(&["todo"]).is_err());
/// ```
#[derive(Clone)]
pub struct Context {
    inner: Rc<ContextInner>,
}

impl Context {
    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    /// Exposed keys in registration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.instances.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.inner.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.instances.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<ModelInstance> {
        self.inner.instances.get(key).cloned()
    }

    /// Select the instances a consumer asked for
    pub fn inject(&self, keys: &[&str]) -> Result<IndexMap<String, ModelInstance>> {
        keys.iter()
            .map(|key| {
                self.get(key)
                    .map(|instance| (key.to_string(), instance))
                    .ok_or_else(|| Error::UnknownContextKey(key.to_string()))
            })
            .collect()
    }

    pub fn relation(&self) -> Option<&Relation> {
        self.inner.relation.as_ref()
    }

    /// Re-run `render` whenever data it reads from the injected instances changes
    pub fn observe(
        &self,
        keys: &[&str],
        mut render: impl FnMut(&IndexMap<String, ModelInstance>) + 'static,
    ) -> Result<Reaction> {
        let injected = self.inject(keys)?;
        Ok(autorun(move || render(&injected)))
    }

    pub fn ptr_eq(&self, other: &Context) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .field("relation", &self.inner.relation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{create_model, Action, ModelDescription};
    use crate::value::Value;
    use futures::executor::block_on;
    use std::cell::RefCell;

    fn counter() -> ResolvedModel {
        create_model(
            ModelDescription::new("counter")
                .with_data("count", 0i64)
                .with_action(
                    "add",
                    Action::new(|this, n: Value| {
                        let next = this.get("count")?.as_int().unwrap_or(0) + n.as_int().unwrap_or(0);
                        this.set("count", next)?;
                        Ok(next)
                    }),
                ),
        )
        .unwrap()
    }

    #[test]
    fn test_keys_follow_registration() {
        let model = counter();
        let shared = model.instantiate().unwrap();
        let context = Context::builder()
            .provide("b", &model)
            .provide_instance("a", &shared)
            .mount()
            .unwrap();

        assert_eq!(context.keys().collect::<Vec<_>>(), ["b", "a"]);
        assert!(context.get("a").unwrap().ptr_eq(&shared));
        assert!(!context.get("b").unwrap().ptr_eq(&shared));
    }

    #[test]
    fn test_each_mount_instantiates() {
        let model = counter();
        let first = Context::builder().provide("counter", &model).mount().unwrap();
        let second = Context::builder().provide("counter", &model).mount().unwrap();
        assert!(!first.get("counter").unwrap().ptr_eq(&second.get("counter").unwrap()));
    }

    #[test]
    fn test_inject_unknown_key() {
        let context = Context::builder().provide("counter", &counter()).mount().unwrap();
        let err = context.inject(&["counter", "todo"]).unwrap_err();
        assert!(matches!(err, Error::UnknownContextKey(ref k) if k == "todo"));
    }

    #[test]
    fn test_relation_sees_dispatch() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let relation = Relation::new();
        relation.listen("counter.add", {
            let seen = Rc::clone(&seen);
            move |event| {
                seen.borrow_mut().push((event.model.clone(), event.result.clone()));
                Ok(())
            }
        });

        let context = Context::builder()
            .provide("counter", &counter())
            .relation(relation)
            .mount()
            .unwrap();
        let instance = context.get("counter").unwrap();
        block_on(instance.dispatch("add", 2i64)).unwrap();

        assert_eq!(*seen.borrow(), vec![("Counter".to_string(), Value::Int(2))]);
    }

    #[test]
    fn test_relation_init_runs_on_mount() {
        let mounted = Rc::new(RefCell::new(0));
        let relation = Relation::new();
        relation.init({
            let mounted = Rc::clone(&mounted);
            move |context| {
                assert_eq!(context.len(), 1);
                *mounted.borrow_mut() += 1;
                Ok(())
            }
        });

        let model = counter();
        let _a = Context::builder().provide("counter", &model).relation(relation.clone()).mount().unwrap();
        let _b = Context::builder().provide("counter", &model).relation(relation).mount().unwrap();
        assert_eq!(*mounted.borrow(), 2);
    }

    #[test]
    fn test_unmount_detaches_relation() {
        let calls = Rc::new(RefCell::new(0));
        let relation = Relation::new();
        relation.listen("counter.add", {
            let calls = Rc::clone(&calls);
            move |_| {
                *calls.borrow_mut() += 1;
                Ok(())
            }
        });

        let instance = counter().instantiate().unwrap();
        let context = Context::builder()
            .provide_instance("counter", &instance)
            .relation(relation)
            .mount()
            .unwrap();
        block_on(instance.dispatch("add", 1i64)).unwrap();
        drop(context);
        block_on(instance.dispatch("add", 1i64)).unwrap();

        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn test_observe_rerenders() {
        let context = Context::builder().provide("counter", &counter()).mount().unwrap();
        let rendered = Rc::new(RefCell::new(Vec::new()));
        let _view = context
            .observe(&["counter"], {
                let rendered = Rc::clone(&rendered);
                move |models| {
                    let count = models["counter"].get("count").unwrap();
                    rendered.borrow_mut().push(count);
                }
            })
            .unwrap();

        block_on(context.get("counter").unwrap().dispatch("add", 3i64)).unwrap();
        assert_eq!(*rendered.borrow(), vec![Value::Int(0), Value::Int(3)]);
    }
}
