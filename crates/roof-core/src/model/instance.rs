//! Live model instances
//!
//! # Construction
//!
//! [`ResolvedModel::instantiate`] walks the chain from the root ancestor down:
//!
//! 1. Merge data defaults; a descendant replaces an ancestor's top-level value
//!    but keeps its position.
//! 2. Apply overrides shallowly. Overriding a constant fails with
//!    [`Error::ReadOnly`]; overriding an action or private member is a
//!    namespace conflict; any other key becomes a data field.
//! 3. Wrap every data field: lists and maps become reactive containers.
//! 4. Attach constants, actions and private members.
//! 5. Run each level's init hook, ancestors first, inside a batch.
//! 6. Register each level's autorun hook.
//!
//! # Invoking actions
//!
//! [`ModelInstance::dispatch`] runs the global pipeline, then the model's
//! local one, then the action body. If either pipeline cancels, the body
//! receives the payload it was dispatched with; a cancelled global run skips
//! the local pipeline. The action itself is never skipped.

use super::description::{Action, ActionFuture};
use super::resolver::ResolvedModel;
use crate::conflict::{ConflictPhase, Namespace, NamespaceIndex};
use crate::error::{Error, NamingError, Result};
use crate::global::global_middleware;
use crate::middleware::{Middleware, PipelineContext};
use crate::reactive::{autorun, batch, untracked, wrap, Observable, Reaction, ReactiveContainer, ReactiveValue, WriteOutcome};
use crate::utils::{into_local_future, is_private_key, map_values};
use crate::value::{PathKey, Value, ValueMap};
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use indexmap::IndexMap;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

/// A completed action call, as seen by action listeners
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRecord {
    pub action: String,
    /// Argument the body actually received
    pub payload: Value,
    pub result: Value,
}

/// Handle returned by [`ModelInstance::on_action`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Future returned by an action listener
pub type ListenerFuture = LocalBoxFuture<'static, Result<()>>;

type ActionListener = Rc<dyn Fn(&ModelInstance, &ActionRecord) -> ListenerFuture>;

struct InstanceInner {
    model: ResolvedModel,
    fields: IndexMap<String, Observable<ReactiveValue>>,
    constants: ValueMap,
    actions: IndexMap<String, Action>,
    privates: RefCell<IndexMap<String, Rc<dyn Any>>>,
    middleware: Option<Middleware>,
    reactions: RefCell<Vec<Reaction>>,
    listeners: RefCell<Vec<(ListenerId, ActionListener)>>,
    next_listener: Cell<u64>,
}

/// An instance of a resolved model
///
/// Cloning creates another handle to the same instance.
#[derive(Clone)]
pub struct ModelInstance {
    inner: Rc<InstanceInner>,
}

impl ModelInstance {
    pub(crate) fn construct(model: &ResolvedModel, overrides: ValueMap) -> Result<Self> {
        let conflicts = model.merge_conflicts();
        if !conflicts.is_empty() {
            return Err(Error::conflicts(conflicts.clone()));
        }

        let chain = model.chain();
        let mut data = ValueMap::new();
        let mut level_defaults = Vec::with_capacity(chain.len());
        for level in &chain {
            for (key, value) in level.description().data() {
                data.insert(key.clone(), value.clone());
            }
            level_defaults.push(data.clone());
        }

        let constants = model.constants();
        let actions = model.actions();
        let mut privates = IndexMap::new();
        for level in &chain {
            for (key, value) in level.description().privates() {
                privates.insert(key.clone(), Rc::clone(value));
            }
        }

        if let Some(key) = overrides.keys().find(|k| constants.contains_key(*k)) {
            return Err(Error::ReadOnly {
                model: model.name().to_string(),
                key: key.clone(),
            });
        }
        let mut index = NamespaceIndex::new();
        index.declare(Namespace::Data, overrides.keys());
        index.declare(Namespace::Actions, actions.keys());
        index.declare(Namespace::Privates, privates.keys());
        let report = index.into_report(model.name(), ConflictPhase::Merge);
        if !report.is_empty() {
            return Err(Error::conflicts(report));
        }
        data.extend(overrides);

        let fields = data
            .into_iter()
            .map(|(key, value)| (key, Observable::new(wrap(value))))
            .collect();

        let instance = ModelInstance {
            inner: Rc::new(InstanceInner {
                model: model.clone(),
                fields,
                constants,
                actions,
                privates: RefCell::new(privates),
                middleware: model.middleware(),
                reactions: RefCell::new(Vec::new()),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
            }),
        };

        for (level, defaults) in chain.iter().zip(&level_defaults) {
            if let Some(init) = &level.description().init {
                batch(|| init(&instance, defaults))?;
            }
        }

        for level in &chain {
            if let Some(hook) = &level.description().autorun {
                let hook = Rc::clone(hook);
                let weak: Weak<InstanceInner> = Rc::downgrade(&instance.inner);
                let reaction = autorun(move || {
                    if let Some(inner) = weak.upgrade() {
                        hook(&ModelInstance { inner });
                    }
                });
                instance.inner.reactions.borrow_mut().push(reaction);
            }
        }

        debug!(
            model = %model.name(),
            fields = instance.inner.fields.len(),
            reactions = instance.inner.reactions.borrow().len(),
            "instantiated model"
        );
        Ok(instance)
    }

    pub fn model(&self) -> &ResolvedModel {
        &self.inner.model
    }

    /// Capitalized model name
    pub fn name(&self) -> &str {
        self.inner.model.name()
    }

    /// Whether this instance was created from `model` or a descendant of it
    pub fn is_instance_of(&self, model: &ResolvedModel) -> bool {
        self.inner.model.extends(model)
    }

    pub fn ptr_eq(&self, other: &ModelInstance) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // -- data -----------------------------------------------------------------

    /// Data field names in declaration order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.inner.fields.keys().map(String::as_str)
    }

    pub fn has_field(&self, key: &str) -> bool {
        self.inner.fields.contains_key(key)
    }

    /// Read a data field or constant (tracked)
    pub fn get(&self, key: &str) -> Result<Value> {
        if let Some(slot) = self.inner.fields.get(key) {
            return Ok(slot.get().to_value());
        }
        self.inner
            .constants
            .get(key)
            .cloned()
            .ok_or_else(|| self.unknown_field(key))
    }

    /// Read below a field (tracked on the field and its container)
    pub fn get_in(&self, key: &str, path: &[PathKey]) -> Result<Option<Value>> {
        let value = self.get(key)?;
        Ok(value.get_path(path).cloned())
    }

    /// The wrapped field value (tracked)
    pub fn field(&self, key: &str) -> Result<ReactiveValue> {
        self.inner
            .fields
            .get(key)
            .map(Observable::get)
            .ok_or_else(|| self.unknown_field(key))
    }

    /// Observable slot of a field; lets callers subscribe to reassignment
    pub fn slot(&self, key: &str) -> Result<Observable<ReactiveValue>> {
        self.inner
            .fields
            .get(key)
            .cloned()
            .ok_or_else(|| self.unknown_field(key))
    }

    /// Replace a field value
    ///
    /// Writing a scalar equal to the current one does nothing.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let slot = self.writable_slot(key)?;
        let unchanged = untracked(|| {
            slot.with(|current| matches!(current, ReactiveValue::Plain(v) if *v == value))
        });
        if unchanged {
            return Ok(());
        }
        trace!(model = %self.name(), key, "set field");
        slot.replace(wrap(value));
        Ok(())
    }

    /// Write below a field
    ///
    /// A one-step path writes a direct child of the container and notifies;
    /// longer paths write plain nested data and notify no one.
    pub fn set_in(&self, key: &str, path: &[PathKey], value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let Some((first, rest)) = path.split_first() else {
            return self.set(key, value);
        };
        let container = self.writable_container(key)?;
        let outcome = if rest.is_empty() {
            container.set(first, value)
        } else {
            container.set_deep(path, value)
        };
        if outcome == WriteOutcome::Unreachable {
            return Err(self.not_a_container(&describe_path(key, path)));
        }
        Ok(())
    }

    /// Append to a list field
    pub fn push(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        let container = self.writable_container(key)?;
        match container.push(value.into()) {
            WriteOutcome::Unreachable => Err(self.not_a_container(key)),
            _ => Ok(()),
        }
    }

    /// Write several fields as one batch
    ///
    /// Every key is checked first; nothing is written if any is rejected.
    pub fn assign(&self, values: ValueMap) -> Result<()> {
        for key in values.keys() {
            self.writable_slot(key)?;
        }
        batch(|| {
            values
                .into_iter()
                .try_for_each(|(key, value)| self.set(&key, value))
        })
    }

    /// Plain snapshot: data fields then constants (tracked)
    ///
    /// Actions and private members are never included.
    pub fn to_json(&self) -> ValueMap {
        let mut snapshot = map_values(&self.inner.fields, |slot, _| slot.get().to_value());
        for (key, value) in &self.inner.constants {
            snapshot.insert(key.clone(), value.clone());
        }
        snapshot
    }

    /// The snapshot serialized as a JSON object
    #[cfg(feature = "serde_json")]
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(&serde_json::Value::from(&Value::Map(self.to_json())))
    }

    // -- constants and privates ----------------------------------------------

    pub fn constant(&self, key: &str) -> Option<&Value> {
        self.inner.constants.get(key)
    }

    pub fn constants(&self) -> &ValueMap {
        &self.inner.constants
    }

    pub fn private(&self, key: &str) -> Option<Rc<dyn Any>> {
        self.inner.privates.borrow().get(key).cloned()
    }

    /// Private member downcast to its concrete type
    pub fn private_as<T: Any>(&self, key: &str) -> Option<Rc<T>> {
        self.private(key)?.downcast::<T>().ok()
    }

    /// Store a private member; the key must start with `_`
    pub fn set_private<T: Any>(&self, key: &str, value: T) -> Result<()> {
        if !is_private_key(key) {
            return Err(NamingError::PrivateKey(key.to_string()).into());
        }
        self.inner
            .privates
            .borrow_mut()
            .insert(key.to_string(), Rc::new(value));
        Ok(())
    }

    // -- actions --------------------------------------------------------------

    pub fn has_action(&self, name: &str) -> bool {
        self.inner.actions.contains_key(name)
    }

    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.inner.actions.keys().map(String::as_str)
    }

    /// Invoke an action through the global and local pipelines
    pub fn dispatch(&self, name: &str, payload: impl Into<Value>) -> ActionFuture {
        let payload = payload.into();
        let Some(action) = self.inner.actions.get(name).cloned() else {
            return into_local_future(Err(self.undefined_method(name)));
        };
        let this = self.clone();
        let name = name.to_string();

        async move {
            debug!(model = %this.name(), action = %name, "dispatch action");
            let context = PipelineContext::new(name.clone(), payload.clone());
            let global = global_middleware().run(context, None).await?;
            let composed = match &this.inner.middleware {
                Some(local) if !global.is_cancelled() => {
                    let context = PipelineContext::new(name.clone(), global.payload);
                    local.run(context, None).await?
                }
                _ => global,
            };

            let argument = if composed.is_cancelled() {
                trace!(model = %this.name(), action = %name, "pipeline cancelled");
                payload
            } else {
                composed.payload
            };

            let result = action.invoke(this.clone(), argument.clone()).await?;
            let record = ActionRecord {
                action: name,
                payload: argument,
                result: result.clone(),
            };
            for listener in this.notify(&record) {
                listener.await?;
            }
            Ok(result)
        }
        .boxed_local()
    }

    /// Invoke an action body directly, skipping every pipeline
    pub fn call_direct(&self, name: &str, payload: impl Into<Value>) -> ActionFuture {
        match self.inner.actions.get(name) {
            Some(action) => action.invoke(self.clone(), payload.into()),
            None => into_local_future(Err(self.undefined_method(name))),
        }
    }

    /// A callable bound to this instance
    pub fn action(&self, name: &str) -> Result<BoundAction> {
        if !self.has_action(name) {
            return Err(self.undefined_method(name));
        }
        Ok(BoundAction {
            instance: self.clone(),
            name: name.to_string(),
        })
    }

    /// Bind several actions at once, failing on the first unknown name
    pub fn bind_actions(&self, names: &[&str]) -> Result<IndexMap<String, BoundAction>> {
        names
            .iter()
            .map(|name| Ok((name.to_string(), self.action(name)?)))
            .collect()
    }

    /// Call `listener` after every successful dispatch
    pub fn on_action(&self, listener: impl Fn(&ModelInstance, &ActionRecord) + 'static) -> ListenerId {
        self.register(Rc::new(
            move |this: &ModelInstance, record: &ActionRecord| -> ListenerFuture {
                listener(this, record);
                into_local_future(Ok(()))
            },
        ))
    }

    /// Like [`on_action`](Self::on_action), but the dispatch awaits the
    /// listener's future and returns its error, if any
    pub fn on_action_async<F, Fut>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ModelInstance, &ActionRecord) -> Fut + 'static,
        Fut: Future<Output = Result<()>> + 'static,
    {
        self.register(Rc::new(
            move |this: &ModelInstance, record: &ActionRecord| -> ListenerFuture {
                listener(this, record).boxed_local()
            },
        ))
    }

    fn register(&self, listener: ActionListener) -> ListenerId {
        let id = ListenerId(self.inner.next_listener.get());
        self.inner.next_listener.set(id.0 + 1);
        self.inner.listeners.borrow_mut().push((id, listener));
        id
    }

    /// Remove a listener; returns whether it was registered
    pub fn off_action(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(listener, _)| *listener != id);
        listeners.len() != before
    }

    /// Stop every autorun hook of this instance
    pub fn dispose(&self) {
        for reaction in self.inner.reactions.borrow_mut().drain(..) {
            reaction.dispose();
        }
    }

    fn notify(&self, record: &ActionRecord) -> Vec<ListenerFuture> {
        let listeners: Vec<ActionListener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        listeners
            .into_iter()
            .map(|listener| listener(self, record))
            .collect()
    }

    // -- helpers --------------------------------------------------------------

    fn writable_slot(&self, key: &str) -> Result<&Observable<ReactiveValue>> {
        if self.inner.constants.contains_key(key) {
            return Err(Error::ReadOnly {
                model: self.name().to_string(),
                key: key.to_string(),
            });
        }
        self.inner
            .fields
            .get(key)
            .ok_or_else(|| self.unknown_field(key))
    }

    fn writable_container(&self, key: &str) -> Result<ReactiveContainer> {
        let slot = self.writable_slot(key)?;
        slot.get_untracked()
            .as_container()
            .cloned()
            .ok_or_else(|| self.not_a_container(key))
    }

    fn unknown_field(&self, key: &str) -> Error {
        Error::UnknownField {
            model: self.name().to_string(),
            key: key.to_string(),
        }
    }

    fn not_a_container(&self, key: &str) -> Error {
        Error::NotAContainer {
            model: self.name().to_string(),
            key: key.to_string(),
        }
    }

    fn undefined_method(&self, method: &str) -> Error {
        Error::UndefinedMethod {
            model: self.name().to_string(),
            method: method.to_string(),
        }
    }
}

impl std::fmt::Debug for ModelInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = map_values(&self.inner.fields, |slot, _| {
            slot.get_untracked().to_value_untracked()
        });
        f.debug_struct("ModelInstance")
            .field("model", &self.name())
            .field("data", &data)
            .field("constants", &self.inner.constants)
            .field("actions", &self.inner.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// An action bound to its instance
#[derive(Clone, Debug)]
pub struct BoundAction {
    instance: ModelInstance,
    name: String,
}

impl BoundAction {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instance(&self) -> &ModelInstance {
        &self.instance
    }

    /// Dispatch the action with `payload`
    pub fn call(&self, payload: impl Into<Value>) -> ActionFuture {
        self.instance.dispatch(&self.name, payload)
    }
}

fn describe_path(key: &str, path: &[PathKey]) -> String {
    let mut out = key.to_string();
    for step in path {
        match step {
            PathKey::Key(k) => {
                out.push('.');
                out.push_str(k);
            }
            PathKey::Index(_) => out.push_str(&step.to_string()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{create_model, extend_model, ModelDescription};
    use futures::executor::block_on;

    fn user_model() -> ResolvedModel {
        create_model(
            ModelDescription::new("user")
                .with_data("username", "")
                .with_data("info", Value::map([("address", Value::from("beijing"))]))
                .with_data("friends", Value::from(vec!["Jack"]))
                .with_constant("role", "member")
                .with_action(
                    "rename",
                    Action::new(|this, name: Value| {
                        this.set("username", name.clone())?;
                        Ok(name)
                    }),
                ),
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_and_overrides() {
        let user = user_model()
            .instantiate_with(ValueMap::from([("username".to_string(), Value::from("Lili"))]))
            .unwrap();

        assert_eq!(user.get("username").unwrap(), Value::from("Lili"));
        assert_eq!(user.get("role").unwrap(), Value::from("member"));
        assert_eq!(user.field_names().collect::<Vec<_>>(), ["username", "info", "friends"]);
    }

    #[test]
    fn test_override_constant_is_read_only() {
        let err = user_model()
            .instantiate_with(ValueMap::from([("role".to_string(), Value::from("admin"))]))
            .unwrap_err();
        assert!(matches!(err, Error::ReadOnly { ref key, .. } if key == "role"));
    }

    #[test]
    fn test_override_action_conflicts() {
        let err = user_model()
            .instantiate_with(ValueMap::from([("rename".to_string(), Value::Null)]))
            .unwrap_err();
        assert!(err.conflict_report().unwrap().get("rename").is_some());
    }

    #[test]
    fn test_unknown_override_becomes_field() {
        let user = user_model()
            .instantiate_with(ValueMap::from([("age".to_string(), Value::Int(30))]))
            .unwrap();
        assert_eq!(user.get("age").unwrap(), Value::Int(30));
    }

    #[test]
    fn test_write_errors() {
        let user = user_model().instantiate().unwrap();

        let err = user.set("role", "admin").unwrap_err();
        assert_eq!(err.to_string(), "\"role\" of model User is read only");
        assert!(matches!(user.set("missing", 1i64), Err(Error::UnknownField { .. })));
        assert!(matches!(user.push("username", 1i64), Err(Error::NotAContainer { .. })));
        assert!(matches!(
            user.set_in("friends", &["name".into()], "x"),
            Err(Error::NotAContainer { ref key, .. }) if key == "friends.name"
        ));
    }

    #[test]
    fn test_failed_nested_write_changes_nothing() {
        let user = user_model().instantiate().unwrap();
        let err = user
            .set_in("info", &["missing".into(), "x".into()], 1i64)
            .unwrap_err();
        assert!(matches!(err, Error::NotAContainer { ref key, .. } if key == "info.missing.x"));
        assert_eq!(
            user.get("info").unwrap(),
            Value::map([("address", Value::from("beijing"))])
        );
    }

    #[test]
    fn test_new_null_key_notifies() {
        let user = user_model().instantiate().unwrap();
        let runs = Rc::new(Cell::new(0));
        let _reaction = autorun({
            let user = user.clone();
            let runs = Rc::clone(&runs);
            move || {
                runs.set(runs.get() + 1);
                user.get("info").unwrap();
            }
        });

        user.set_in("info", &["extra".into()], Value::Null).unwrap();
        assert_eq!(runs.get(), 2);
        assert_eq!(
            user.get_in("info", &["extra".into()]).unwrap(),
            Some(Value::Null)
        );
    }

    #[test]
    fn test_field_write_notifies() {
        let user = user_model().instantiate().unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _reaction = autorun({
            let user = user.clone();
            let seen = Rc::clone(&seen);
            move || seen.borrow_mut().push(user.get("username").unwrap())
        });

        user.set("username", "Lili").unwrap();
        user.set("username", "Lili").unwrap();
        assert_eq!(*seen.borrow(), vec![Value::from(""), Value::from("Lili")]);
    }

    #[test]
    fn test_private_members() {
        let model = create_model(ModelDescription::new("cache").with_private("_hits", Cell::new(0u32))).unwrap();
        let cache = model.instantiate().unwrap();

        let hits = cache.private_as::<Cell<u32>>("_hits").unwrap();
        hits.set(3);
        assert_eq!(cache.private_as::<Cell<u32>>("_hits").unwrap().get(), 3);
        assert!(cache.private_as::<String>("_hits").is_none());
        assert!(!cache.to_json().contains_key("_hits"));

        assert!(cache.set_private("_token", "abc".to_string()).is_ok());
        assert!(matches!(
            cache.set_private("token", 1u8),
            Err(Error::Naming(NamingError::PrivateKey(_)))
        ));
    }

    #[test]
    fn test_dispatch_and_listeners() {
        let user = user_model().instantiate().unwrap();
        let records = Rc::new(RefCell::new(Vec::new()));
        let id = user.on_action({
            let records = Rc::clone(&records);
            move |_, record| records.borrow_mut().push(record.clone())
        });

        let result = block_on(user.dispatch("rename", "Jack")).unwrap();
        assert_eq!(result, Value::from("Jack"));
        assert_eq!(user.get("username").unwrap(), Value::from("Jack"));
        assert_eq!(records.borrow().len(), 1);
        assert_eq!(records.borrow()[0].action, "rename");

        assert!(user.off_action(id));
        block_on(user.dispatch("rename", "Lili")).unwrap();
        assert_eq!(records.borrow().len(), 1);
    }

    #[test]
    fn test_listener_error_reaches_caller() {
        let user = user_model().instantiate().unwrap();
        let error = Error::msg("listener failed");
        user.on_action_async({
            let error = error.clone();
            move |_, _| {
                let error = error.clone();
                async move { Err(error) }
            }
        });

        let err = block_on(user.dispatch("rename", "Jack")).unwrap_err();
        assert!(err.same_as(&error));
        assert_eq!(user.get("username").unwrap(), Value::from("Jack"));
    }

    #[test]
    fn test_undefined_method() {
        let user = user_model().instantiate().unwrap();
        let err = block_on(user.dispatch("fly", Value::Null)).unwrap_err();
        assert_eq!(err.to_string(), "Undefined method \"fly\" on model User");
        assert!(user.action("fly").is_err());
        assert!(user.bind_actions(&["rename", "fly"]).is_err());
    }

    #[test]
    fn test_bound_action() {
        let user = user_model().instantiate().unwrap();
        let actions = user.bind_actions(&["rename"]).unwrap();
        block_on(actions["rename"].call("Lili")).unwrap();
        assert_eq!(user.get("username").unwrap(), Value::from("Lili"));
    }

    #[test]
    fn test_autorun_hook_follows_data() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let model = create_model(ModelDescription::new("counter").with_data("count", 0i64).with_autorun({
            let seen = Rc::clone(&seen);
            move |this| seen.borrow_mut().push(this.get("count").unwrap())
        }))
        .unwrap();

        let counter = model.instantiate().unwrap();
        counter.set("count", 1i64).unwrap();
        counter.dispose();
        counter.set("count", 2i64).unwrap();
        assert_eq!(*seen.borrow(), vec![Value::Int(0), Value::Int(1)]);
    }

    #[test]
    fn test_instance_of_chain() {
        let user = user_model();
        let admin = extend_model(&user, ModelDescription::new("admin")).unwrap();
        let instance = admin.instantiate().unwrap();
        assert!(instance.is_instance_of(&user));
        assert!(instance.is_instance_of(&admin));
        assert!(!user.instantiate().unwrap().is_instance_of(&admin));
    }
}
