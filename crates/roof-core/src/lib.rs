//! Roof Core - reactive models with middleware-intercepted actions
//!
//! This crate provides the model layer of the roof workspace:
//! - Dynamic value types (`Value`, `ValueMap`)
//! - A single-threaded reactive engine (`Observable`, `autorun`, `batch`)
//! - An async middleware pipeline with cancel/end control signals
//! - Model descriptions, inheritance and namespace conflict detection
//! - Live instances whose actions run through the global and local pipelines
//! - `Relation` listeners and the `Context` a consuming tree mounts
//!
//! ## Quick start
//!
//! ```
//! use futures::executor::block_on;
//! use roof_core::{create_model, Action, ModelDescription, Value};
//!
//! let user = create_model(
//!     ModelDescription::new("user")
//!         .with_data("username", "")
//!         .with_action("login", Action::new(|this, name: Value| {
//!             this.set("username", name)?;
//!             Ok(true)
//!         })),
//! )
//! .unwrap();
//!
//! let instance = user.instantiate().unwrap();
//! block_on(instance.dispatch("login", "Lili")).unwrap();
//! assert_eq!(instance.get("username").unwrap(), Value::from("Lili"));
//! ```
//!
//! ## JSON Feature
//!
//! Enable the `serde_json` feature to serialize instance snapshots:
//! ```toml
//! roof-core = { version = "0.1", features = ["serde_json"] }
//! ```

mod config;
mod conflict;
mod context;
mod error;
mod global;
mod identity;
mod middleware;
pub mod model;
pub mod reactive;
mod relation;
pub mod utils;
mod value;

pub use config::{CancelRestore, MiddlewareConfig, StageListPolicy};
pub use conflict::{ConflictPhase, ConflictReport, Namespace, NamespaceConflict, NamespaceIndex};
pub use context::{Context, ContextBuilder};
pub use error::{Error, NamingError, RaisedError, Result};
pub use global::{configure_global_middleware, global_middleware};
pub use identity::ModelId;
pub use middleware::{
    Composed, Control, ControlHook, IntoStages, Middleware, PipelineContext, Stage, StageFuture, Step,
    CANCEL_KEY, END_KEY,
};
pub use model::{
    create_model, extend_model, Action, ActionFuture, ActionRecord, BoundAction, ModelDescription,
    ModelInstance, ResolvedModel,
};
pub use reactive::{autorun, batch, untracked, Observable, Reaction};
pub use relation::{ActionEvent, ActionPattern, Relation};
pub use value::{PathKey, Value, ValueMap};
