//! Rust behaviour bound to declarative models

use roof_core::{Action, Middleware, ModelDescription, ModelInstance, Result as CoreResult, ValueMap};
use indexmap::IndexMap;
use std::rc::Rc;

type InitFn = Rc<dyn Fn(&ModelInstance, &ValueMap) -> CoreResult<()>>;
type AutorunFn = Rc<dyn Fn(&ModelInstance)>;

/// Everything bound to one model name
#[derive(Clone, Default)]
pub struct ModelBindings {
    actions: IndexMap<String, Action>,
    init: Option<InitFn>,
    autorun: Option<AutorunFn>,
    middleware: Option<Middleware>,
}

impl ModelBindings {
    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    /// Add the bound behaviour to a description
    pub(crate) fn apply(&self, mut description: ModelDescription) -> ModelDescription {
        for (name, action) in &self.actions {
            description = description.with_action(name.clone(), action.clone());
        }
        if let Some(init) = &self.init {
            let init = Rc::clone(init);
            description = description.with_init(move |this, defaults| init(this, defaults));
        }
        if let Some(autorun) = &self.autorun {
            let autorun = Rc::clone(autorun);
            description = description.with_autorun(move |this| autorun(this));
        }
        if let Some(middleware) = &self.middleware {
            description = description.with_middleware(middleware.clone());
        }
        description
    }
}

/// Maps model names to actions and hooks
///
/// # Example
///
/// ```
/// use roof_core::{Action, Value};
/// use roof_script::ActionRegistry;
///
/// let mut registry = ActionRegistry::new();
/// registry
///     .action("user", "logout", Action::new(|this, _| {
///         this.set("isLogin", false)?;
///         Ok(Value::Null)
///     }))
///     .init("user", |_, _| Ok(()));
///
/// assert!(registry.get("user").unwrap().action("logout").is_some());
/// ```
#[derive(Clone, Default)]
pub struct ActionRegistry {
    bindings: IndexMap<String, ModelBindings>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an action body to `model`
    pub fn action(&mut self, model: &str, name: impl Into<String>, action: Action) -> &mut Self {
        self.entry(model).actions.insert(name.into(), action);
        self
    }

    pub fn init(
        &mut self,
        model: &str,
        hook: impl Fn(&ModelInstance, &ValueMap) -> CoreResult<()> + 'static,
    ) -> &mut Self {
        self.entry(model).init = Some(Rc::new(hook));
        self
    }

    pub fn autorun(&mut self, model: &str, hook: impl Fn(&ModelInstance) + 'static) -> &mut Self {
        self.entry(model).autorun = Some(Rc::new(hook));
        self
    }

    pub fn middleware(&mut self, model: &str, middleware: Middleware) -> &mut Self {
        self.entry(model).middleware = Some(middleware);
        self
    }

    pub fn get(&self, model: &str) -> Option<&ModelBindings> {
        self.bindings.get(model)
    }

    /// Names of every model with bindings
    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    fn entry(&mut self, model: &str) -> &mut ModelBindings {
        self.bindings.entry(model.to_string()).or_default()
    }
}
