//! Roof Script - RON model definitions
//!
//! Loads the declarative half of models from RON files:
//! - Model definitions (`name`, `extends`, `data`, `constants`, `actions`)
//! - Pipeline configuration (`MiddlewareConfig`)
//!
//! Behaviour stays in Rust: an [`ActionRegistry`] binds action bodies and
//! hooks to model names, and [`Loader::resolve`] combines both into
//! [`ResolvedModel`](roof_core::ResolvedModel)s.

mod error;
mod loader;
mod registry;
mod schema;

pub use error::{Error, Result};
pub use loader::{Loader, Models};
pub use registry::{ActionRegistry, ModelBindings};
pub use schema::config::{load_config_file, load_config_str};
pub use schema::{ModelDef, ModelDefs};
