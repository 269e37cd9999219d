//! Middleware pipeline for action interception
//!
//! A [`Middleware`] holds an ordered list of [`Stage`]s. [`compose`] threads a
//! payload through them strictly in registration order, one at a time: each
//! stage receives the action name and the payload produced by the previous
//! stage, and returns the next payload or a [`Control`] signal.
//!
//! # Control signals
//!
//! - [`Control::End`]: stop and resolve with the payload accumulated so far.
//! - [`Control::Cancel`]: stop and restore an earlier payload, chosen by
//!   [`CancelRestore`].
//!
//! Signals come either from a stage itself or from the optional control hook
//! passed to [`compose_with`], which sees the payload after every stage.
//!
//! # Errors
//!
//! The first error returned by a stage aborts the run and is returned as-is.
//!
//! [`compose`]: Middleware::compose
//! [`compose_with`]: Middleware::compose_with

use crate::config::{CancelRestore, MiddlewareConfig, StageListPolicy};
use crate::error::Result;
use crate::utils::into_local_future;
use crate::value::Value;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use tracing::{debug, trace};

/// Input of one pipeline stage
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineContext {
    /// Name of the intercepted action
    pub action: String,
    /// Current payload
    pub payload: Value,
}

impl PipelineContext {
    pub fn new(action: impl Into<String>, payload: impl Into<Value>) -> Self {
        Self {
            action: action.into(),
            payload: payload.into(),
        }
    }
}

/// Short-circuit signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Stop and restore an earlier payload
    Cancel,
    /// Stop and keep the current payload
    End,
}

/// Signal a control hook returns to cancel the run
pub const CANCEL_KEY: Control = Control::Cancel;
/// Signal a control hook returns to end the run early
pub const END_KEY: Control = Control::End;

/// What a stage produced
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Replacement payload for the next stage
    Next(Value),
    /// Short-circuit the run
    Control(Control),
}

impl From<Value> for Step {
    fn from(value: Value) -> Self {
        Step::Next(value)
    }
}

impl From<Control> for Step {
    fn from(control: Control) -> Self {
        Step::Control(control)
    }
}

/// Future returned by a stage
pub type StageFuture = LocalBoxFuture<'static, Result<Step>>;

type StageFn = dyn Fn(PipelineContext) -> StageFuture;

/// One interceptor in a pipeline
///
/// Cloning shares the same function; [`Middleware::remove`] matches stages by
/// this identity, not by behaviour.
#[derive(Clone)]
pub struct Stage {
    run: Rc<StageFn>,
}

impl Stage {
    /// Create a stage from a synchronous function
    pub fn new<F, S>(f: F) -> Self
    where
        F: Fn(&PipelineContext) -> Result<S> + 'static,
        S: Into<Step>,
    {
        Self {
            run: Rc::new(move |ctx: PipelineContext| {
                let step: Result<Step> = f(&ctx).map(Into::into);
                into_local_future(step)
            }),
        }
    }

    /// Create a stage from an asynchronous function
    pub fn from_async<F, Fut, S>(f: F) -> Self
    where
        F: Fn(PipelineContext) -> Fut + 'static,
        Fut: Future<Output = Result<S>> + 'static,
        S: Into<Step>,
    {
        Self {
            run: Rc::new(move |ctx: PipelineContext| -> StageFuture {
                f(ctx)
                    .map(|result| result.map(Into::<Step>::into))
                    .boxed_local()
            }),
        }
    }

    /// Whether both handles refer to the same stage function
    pub fn ptr_eq(&self, other: &Stage) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.run), Rc::as_ptr(&other.run))
    }

    fn call(&self, ctx: PipelineContext) -> StageFuture {
        (self.run)(ctx)
    }
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("fn", &Rc::as_ptr(&self.run).cast::<()>())
            .finish()
    }
}

/// One stage or a batch of stages
pub trait IntoStages {
    fn into_stages(self) -> Vec<Stage>;
}

impl IntoStages for Stage {
    fn into_stages(self) -> Vec<Stage> {
        vec![self]
    }
}

impl IntoStages for &Stage {
    fn into_stages(self) -> Vec<Stage> {
        vec![self.clone()]
    }
}

impl IntoStages for Vec<Stage> {
    fn into_stages(self) -> Vec<Stage> {
        self
    }
}

impl IntoStages for &[Stage] {
    fn into_stages(self) -> Vec<Stage> {
        self.to_vec()
    }
}

impl<const N: usize> IntoStages for [Stage; N] {
    fn into_stages(self) -> Vec<Stage> {
        self.into()
    }
}

/// Control hook consulted after every stage
pub type ControlHook = Rc<dyn Fn(&PipelineContext) -> Option<Control>>;

/// Result of a pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct Composed {
    /// Resolved payload
    pub payload: Value,
    /// Signal that stopped the run, if any
    pub control: Option<Control>,
}

impl Composed {
    fn completed(payload: Value) -> Self {
        Self {
            payload,
            control: None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.control == Some(Control::Cancel)
    }

    pub fn is_ended(&self) -> bool {
        self.control == Some(Control::End)
    }
}

struct MiddlewareInner {
    stages: RefCell<Vec<Stage>>,
    config: MiddlewareConfig,
}

/// An ordered pipeline of stages
///
/// Cloning creates another handle to the same pipeline.
#[derive(Clone)]
pub struct Middleware {
    inner: Rc<MiddlewareInner>,
}

impl Middleware {
    pub fn new() -> Self {
        Self::with_config(MiddlewareConfig::default())
    }

    pub fn with_config(config: MiddlewareConfig) -> Self {
        Self {
            inner: Rc::new(MiddlewareInner {
                stages: RefCell::new(Vec::new()),
                config,
            }),
        }
    }

    pub fn config(&self) -> MiddlewareConfig {
        self.inner.config
    }

    /// Append one or more stages (`use`)
    pub fn add(&self, stages: impl IntoStages) -> &Self {
        let stages = stages.into_stages();
        let mut list = self.inner.stages.borrow_mut();
        list.extend(stages);
        debug!(stages = list.len(), "middleware stage added");
        self
    }

    /// Remove stages by identity; unknown stages are ignored
    ///
    /// Each listed stage removes its first registration.
    pub fn remove(&self, stages: impl IntoStages) -> &Self {
        let mut list = self.inner.stages.borrow_mut();
        for stage in stages.into_stages() {
            if let Some(pos) = list.iter().position(|s| s.ptr_eq(&stage)) {
                list.remove(pos);
            }
        }
        debug!(stages = list.len(), "middleware stage removed");
        self
    }

    pub fn is_empty(&self) -> bool {
        self.inner.stages.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.stages.borrow().len()
    }

    /// Whether both handles refer to the same pipeline
    pub fn ptr_eq(&self, other: &Middleware) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Run the pipeline and resolve to the final payload
    pub fn compose(&self, context: PipelineContext) -> LocalBoxFuture<'static, Result<Value>> {
        self.run(context, None)
            .map(|composed| composed.map(|c| c.payload))
            .boxed_local()
    }

    /// Run the pipeline, consulting `hook` with the updated payload after each stage
    pub fn compose_with(
        &self,
        context: PipelineContext,
        hook: impl Fn(&PipelineContext) -> Option<Control> + 'static,
    ) -> LocalBoxFuture<'static, Result<Value>> {
        self.run(context, Some(Rc::new(hook)))
            .map(|composed| composed.map(|c| c.payload))
            .boxed_local()
    }

    /// Run the pipeline and report how it stopped
    pub fn run(
        &self,
        context: PipelineContext,
        hook: Option<ControlHook>,
    ) -> LocalBoxFuture<'static, Result<Composed>> {
        let this = self.clone();
        async move {
            let PipelineContext {
                action,
                payload: initial,
            } = context;
            let snapshot = match this.inner.config.stage_list {
                StageListPolicy::Snapshot => Some(this.inner.stages.borrow().clone()),
                StageListPolicy::Live => None,
            };

            let mut payload = initial.clone();
            let mut index = 0;
            loop {
                let stage = match &snapshot {
                    Some(stages) => stages.get(index).cloned(),
                    None => this.inner.stages.borrow().get(index).cloned(),
                };
                let Some(stage) = stage else {
                    break;
                };
                index += 1;

                let step = stage
                    .call(PipelineContext::new(action.clone(), payload.clone()))
                    .await?;
                trace!(action = %action, stage = index, "pipeline step");

                let previous = match step {
                    Step::Next(next) => std::mem::replace(&mut payload, next),
                    Step::Control(control) => {
                        let previous = payload.clone();
                        return Ok(this.halt(control, initial, previous, payload));
                    }
                };

                if let Some(hook) = &hook {
                    let updated = PipelineContext::new(action.clone(), payload.clone());
                    if let Some(control) = hook(&updated) {
                        return Ok(this.halt(control, initial, previous, payload));
                    }
                }
            }

            Ok(Composed::completed(payload))
        }
        .boxed_local()
    }

    fn halt(&self, control: Control, initial: Value, previous: Value, current: Value) -> Composed {
        let payload = match control {
            Control::End => current,
            Control::Cancel => match self.inner.config.cancel {
                CancelRestore::Initial => initial,
                CancelRestore::Previous => previous,
            },
        };
        Composed {
            payload,
            control: Some(control),
        }
    }
}

impl Default for Middleware {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Middleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Middleware")
            .field("stages", &self.len())
            .field("config", &self.inner.config)
            .finish()
    }
}
