//! Cross-model reactions to completed actions
//!
//! A [`Relation`] is attached to a [`Context`] at mount time. Once mounted, every
//! successful dispatch on a provided instance is matched against the
//! registered patterns using the name `"<context key>.<action>"`, and each
//! matching handler runs in registration order.

use crate::context::Context;
use crate::error::Result;
use crate::model::ModelInstance;
use crate::utils::into_local_future;
use crate::value::Value;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use regex::Regex;
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use tracing::trace;

/// Which actions a handler listens to
#[derive(Debug, Clone)]
pub enum ActionPattern {
    /// Exactly `"<context key>.<action>"`
    Exact(String),
    /// Any qualified name the expression matches
    Matches(Regex),
}

impl ActionPattern {
    pub fn matches(&self, qualified: &str) -> bool {
        match self {
            ActionPattern::Exact(name) => name == qualified,
            ActionPattern::Matches(regex) => regex.is_match(qualified),
        }
    }
}

impl From<&str> for ActionPattern {
    fn from(name: &str) -> Self {
        ActionPattern::Exact(name.to_string())
    }
}

impl From<String> for ActionPattern {
    fn from(name: String) -> Self {
        ActionPattern::Exact(name)
    }
}

impl From<Regex> for ActionPattern {
    fn from(regex: Regex) -> Self {
        ActionPattern::Matches(regex)
    }
}

/// A completed action, delivered to relation handlers
#[derive(Clone, Debug)]
pub struct ActionEvent {
    /// Context the instance was provided to
    pub context: Context,
    /// Context key of the instance
    pub key: String,
    /// Capitalized model name
    pub model: String,
    pub action: String,
    pub payload: Value,
    pub result: Value,
}

impl ActionEvent {
    /// `"<context key>.<action>"`
    pub fn qualified_name(&self) -> String {
        qualify(&self.key, &self.action)
    }

    /// The instance that ran the action
    pub fn instance(&self) -> Option<ModelInstance> {
        self.context.get(&self.key)
    }
}

pub(crate) fn qualify(key: &str, action: &str) -> String {
    format!("{key}.{action}")
}

type Handler = Rc<dyn Fn(ActionEvent) -> LocalBoxFuture<'static, Result<()>>>;
type InitFn = Rc<dyn Fn(&Context) -> Result<()>>;

#[derive(Default)]
struct RelationInner {
    handlers: RefCell<Vec<(ActionPattern, Handler)>>,
    inits: RefCell<Vec<InitFn>>,
}

/// Action listeners shared by the models of a context
///
/// Cloning creates another handle to the same relation.
///
/// # Example
///
/// ```
/// use roof_core::Relation;
/// use regex::Regex;
///
/// let relation = Relation::new();
/// relation
///     .listen("user.login", |event| {
///         println!("{} logged in", event.payload);
///         Ok(())
///     })
///     .listen(Regex::new(r"^todo\.").unwrap(), |_| Ok(()));
///
/// assert_eq!(relation.handler_count(), 2);
/// ```
#[derive(Clone, Default)]
pub struct Relation {
    inner: Rc<RelationInner>,
}

impl Relation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `handler` after each matching action
    pub fn listen(
        &self,
        pattern: impl Into<ActionPattern>,
        handler: impl Fn(&ActionEvent) -> Result<()> + 'static,
    ) -> &Self {
        self.push(
            pattern.into(),
            Rc::new(move |event: ActionEvent| into_local_future(handler(&event))),
        )
    }

    /// Like [`listen`](Self::listen) with an asynchronous handler; the
    /// dispatch that triggered it waits for it to finish
    pub fn listen_async<F, Fut>(&self, pattern: impl Into<ActionPattern>, handler: F) -> &Self
    where
        F: Fn(ActionEvent) -> Fut + 'static,
        Fut: Future<Output = Result<()>> + 'static,
    {
        self.push(
            pattern.into(),
            Rc::new(move |event: ActionEvent| handler(event).boxed_local()),
        )
    }

    /// Run `f` once whenever a context mounts with this relation
    pub fn init(&self, f: impl Fn(&Context) -> Result<()> + 'static) -> &Self {
        self.inner.inits.borrow_mut().push(Rc::new(f));
        self
    }

    pub fn handler_count(&self) -> usize {
        self.inner.handlers.borrow().len()
    }

    /// Whether any handler listens to `"<key>.<action>"`
    pub fn is_listening(&self, key: &str, action: &str) -> bool {
        let qualified = qualify(key, action);
        self.inner
            .handlers
            .borrow()
            .iter()
            .any(|(pattern, _)| pattern.matches(&qualified))
    }

    pub(crate) fn run_init(&self, context: &Context) -> Result<()> {
        let inits: Vec<InitFn> = self.inner.inits.borrow().clone();
        inits.iter().try_for_each(|init| init(context))
    }

    /// Run every matching handler in registration order
    pub(crate) fn trigger(&self, event: ActionEvent) -> LocalBoxFuture<'static, Result<()>> {
        let qualified = event.qualified_name();
        let handlers: Vec<Handler> = self
            .inner
            .handlers
            .borrow()
            .iter()
            .filter(|(pattern, _)| pattern.matches(&qualified))
            .map(|(_, handler)| Rc::clone(handler))
            .collect();

        async move {
            trace!(action = %qualified, handlers = handlers.len(), "relation triggered");
            for handler in handlers {
                handler(event.clone()).await?;
            }
            Ok(())
        }
        .boxed_local()
    }

    fn push(&self, pattern: ActionPattern, handler: Handler) -> &Self {
        self.inner.handlers.borrow_mut().push((pattern, handler));
        self
    }
}

impl std::fmt::Debug for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relation")
            .field("handlers", &self.handler_count())
            .field("inits", &self.inner.inits.borrow().len())
            .finish()
    }
}
