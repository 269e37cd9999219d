//! Schema definitions for RON files

pub mod config;
pub mod model;

pub use model::{ModelDef, ModelDefs};
