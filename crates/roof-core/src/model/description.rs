//! Declarative model descriptions
//!
//! A [`ModelDescription`] lists what one level of a model declares: data
//! defaults, actions, constants, private members, hooks and an optional local
//! pipeline. Descriptions are plain builders; nothing is validated until the
//! description is handed to [`create_model`](super::create_model) or
//! [`extend_model`](super::extend_model), after which it is immutable.

use super::instance::ModelInstance;
use crate::error::Result;
use crate::middleware::Middleware;
use crate::reactive::{batch, batched};
use crate::utils::into_local_future;
use crate::value::{Value, ValueMap};
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use indexmap::IndexMap;
use std::any::Any;
use std::future::Future;
use std::rc::Rc;

/// Future returned by an action
pub type ActionFuture = LocalBoxFuture<'static, Result<Value>>;

type ActionFn = dyn Fn(ModelInstance, Value) -> ActionFuture;

/// Hook run once per level when an instance is created
///
/// Receives the instance and the merged data defaults of the chain up to and
/// including the hook's own level.
pub type InitHook = Rc<dyn Fn(&ModelInstance, &ValueMap) -> Result<()>>;

/// Reactive hook re-run whenever data it reads changes
pub type AutorunHook = Rc<dyn Fn(&ModelInstance)>;

/// A model method
///
/// The body always runs batched: all writes it makes before returning (or
/// before each await point, for async bodies) notify observers once.
#[derive(Clone)]
pub struct Action {
    body: Rc<ActionFn>,
}

impl Action {
    /// Synchronous action
    pub fn new<F, R>(f: F) -> Self
    where
        F: Fn(&ModelInstance, Value) -> Result<R> + 'static,
        R: Into<Value>,
    {
        Self {
            body: Rc::new(move |this: ModelInstance, payload: Value| {
                let result: Result<Value> = f(&this, payload).map(Into::into);
                into_local_future(result)
            }),
        }
    }

    /// Asynchronous action
    pub fn from_async<F, Fut, R>(f: F) -> Self
    where
        F: Fn(ModelInstance, Value) -> Fut + 'static,
        Fut: Future<Output = Result<R>> + 'static,
        R: Into<Value>,
    {
        Self {
            body: Rc::new(move |this: ModelInstance, payload: Value| -> ActionFuture {
                f(this, payload)
                    .map(|result| result.map(Into::<Value>::into))
                    .boxed_local()
            }),
        }
    }

    /// Whether both handles share the same body
    pub fn ptr_eq(&self, other: &Action) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.body), Rc::as_ptr(&other.body))
    }

    /// Run the body against `this`, bypassing every pipeline
    pub(crate) fn invoke(&self, this: ModelInstance, payload: Value) -> ActionFuture {
        let future = batch(|| (self.body)(this, payload));
        batched(future).boxed_local()
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action")
            .field("body", &Rc::as_ptr(&self.body).cast::<()>())
            .finish()
    }
}

/// What one level of a model declares
///
/// # Example
///
/// ```
/// use roof_core::{Action, ModelDescription, Value};
///
/// let user = ModelDescription::new("user")
///     .with_data("username", "")
///     .with_constant("role", "member")
///     .with_action("rename", Action::new(|this, name: Value| {
///         this.set("username", name)?;
///         Ok(Value::Null)
///     }));
///
/// assert_eq!(user.name(), Some("user"));
/// assert_eq!(user.actions().len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct ModelDescription {
    pub(crate) name: Option<String>,
    pub(crate) data: ValueMap,
    pub(crate) actions: IndexMap<String, Action>,
    pub(crate) constants: ValueMap,
    pub(crate) privates: IndexMap<String, Rc<dyn Any>>,
    pub(crate) init: Option<InitHook>,
    pub(crate) autorun: Option<AutorunHook>,
    pub(crate) middleware: Option<Middleware>,
}

impl ModelDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// A description without a name; resolving it fails
    pub fn unnamed() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Declare a data field and its default
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Declare several data fields at once
    pub fn with_data_map(mut self, data: ValueMap) -> Self {
        self.data.extend(data);
        self
    }

    pub fn with_action(mut self, name: impl Into<String>, action: Action) -> Self {
        self.actions.insert(name.into(), action);
        self
    }

    pub fn with_constant(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constants.insert(key.into(), value.into());
        self
    }

    pub fn with_constants(mut self, constants: ValueMap) -> Self {
        self.constants.extend(constants);
        self
    }

    /// Declare a private member; the key must start with `_`
    pub fn with_private<T: Any>(self, key: impl Into<String>, value: T) -> Self {
        self.with_private_rc(key, Rc::new(value))
    }

    pub fn with_private_rc(mut self, key: impl Into<String>, value: Rc<dyn Any>) -> Self {
        self.privates.insert(key.into(), value);
        self
    }

    pub fn with_init(
        mut self,
        hook: impl Fn(&ModelInstance, &ValueMap) -> Result<()> + 'static,
    ) -> Self {
        self.init = Some(Rc::new(hook));
        self
    }

    pub fn with_autorun(mut self, hook: impl Fn(&ModelInstance) + 'static) -> Self {
        self.autorun = Some(Rc::new(hook));
        self
    }

    /// Attach a pipeline that runs after the global one for this model's actions
    pub fn with_middleware(mut self, middleware: Middleware) -> Self {
        self.middleware = Some(middleware);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn data(&self) -> &ValueMap {
        &self.data
    }

    pub fn actions(&self) -> &IndexMap<String, Action> {
        &self.actions
    }

    pub fn constants(&self) -> &ValueMap {
        &self.constants
    }

    pub fn privates(&self) -> &IndexMap<String, Rc<dyn Any>> {
        &self.privates
    }

    pub fn middleware(&self) -> Option<&Middleware> {
        self.middleware.as_ref()
    }
}

impl std::fmt::Debug for ModelDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelDescription")
            .field("name", &self.name)
            .field("data", &self.data)
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("constants", &self.constants)
            .field("privates", &self.privates.keys().collect::<Vec<_>>())
            .field("init", &self.init.is_some())
            .field("autorun", &self.autorun.is_some())
            .finish()
    }
}
