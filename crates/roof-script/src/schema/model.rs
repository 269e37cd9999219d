//! Model definition schema

use roof_core::{ModelDescription, ValueMap};
use serde::{Deserialize, Serialize};

/// Declarative part of a model: everything except Rust behaviour
///
/// Actions are listed by name only; their bodies come from an
/// [`ActionRegistry`](crate::ActionRegistry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDef {
    /// Model name, as referenced by `extends`
    pub name: String,
    /// Name of the parent model
    #[serde(default)]
    pub extends: Option<String>,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Data fields and their defaults
    #[serde(default)]
    pub data: ValueMap,
    /// Read-only values
    #[serde(default)]
    pub constants: ValueMap,
    /// Names of actions that must be bound before resolution
    #[serde(default)]
    pub actions: Vec<String>,
}

impl ModelDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extends: None,
            description: String::new(),
            data: ValueMap::new(),
            constants: ValueMap::new(),
            actions: Vec::new(),
        }
    }

    /// The declarative half of a model description
    pub fn to_description(&self) -> ModelDescription {
        ModelDescription::new(&self.name)
            .with_data_map(self.data.clone())
            .with_constants(self.constants.clone())
    }
}

/// A file holding several model definitions
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelDefs {
    pub models: Vec<ModelDef>,
}
