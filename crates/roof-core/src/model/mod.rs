//! Models: descriptions, resolution and instances
//!
//! A model is declared with a [`ModelDescription`], resolved with
//! [`create_model`] or [`extend_model`] into a [`ResolvedModel`], and
//! instantiated into any number of [`ModelInstance`]s.
//!
//! Four namespaces are kept disjoint across the whole chain:
//!
//! | namespace | reactive | writable | in `to_json` |
//! |-----------|----------|----------|--------------|
//! | data      | yes      | yes      | yes          |
//! | constants | no       | no       | yes          |
//! | actions   | no       | no       | no           |
//! | privates  | no       | yes      | no           |

mod description;
mod instance;
mod resolver;

pub use description::{Action, ActionFuture, AutorunHook, InitHook, ModelDescription};
pub use instance::{ActionRecord, BoundAction, ListenerFuture, ListenerId, ModelInstance};
pub use resolver::{create_model, extend_model, ResolvedModel};
