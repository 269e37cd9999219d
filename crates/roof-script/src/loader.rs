//! RON model loader

use crate::error::{Error, Result};
use crate::registry::ActionRegistry;
use crate::schema::{ModelDef, ModelDefs};
use indexmap::IndexMap;
use roof_core::{create_model, extend_model, ResolvedModel};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Resolved models by definition name, parents first
#[derive(Debug, Default)]
pub struct Models {
    models: IndexMap<String, ResolvedModel>,
    descriptions: IndexMap<String, String>,
}

impl Models {
    pub fn get(&self, name: &str) -> Option<&ResolvedModel> {
        self.models.get(name)
    }

    /// Human-readable description from the definition, if it has one
    pub fn description(&self, name: &str) -> Option<&str> {
        self.descriptions.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Loader for RON model definitions
#[derive(Debug, Default)]
pub struct Loader {
    defs: IndexMap<String, ModelDef>,
}

impl Loader {
    /// Create a new loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a single RON file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        debug!(path = %path.display(), "loading model definitions");
        self.load_str(&content)
    }

    /// Load definitions from a RON string
    ///
    /// Accepts either a `(models: [..])` list or a single model definition.
    pub fn load_str(&mut self, content: &str) -> Result<()> {
        if declares_model_list(content) {
            let file: ModelDefs = ron::from_str(content)?;
            for def in file.models {
                self.add(def)?;
            }
            return Ok(());
        }
        let def: ModelDef = ron::from_str(content)?;
        self.add(def)
    }

    /// Load all RON files from a directory, in file name order
    pub fn load_directory(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if !path.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Not a directory: {:?}", path),
            )));
        }

        let mut entries = fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort();

        for file_path in entries {
            if file_path.extension().map(|e| e == "ron").unwrap_or(false) {
                self.load_file(&file_path)?;
            } else if file_path.is_dir() {
                self.load_directory(&file_path)?;
            }
        }

        Ok(())
    }

    /// Add one definition; names must be unique
    pub fn add(&mut self, def: ModelDef) -> Result<()> {
        if def.name.is_empty() {
            return Err(Error::InvalidSchema("model definition without a name".to_string()));
        }
        if self.defs.contains_key(&def.name) {
            return Err(Error::DuplicateDefinition(def.name));
        }
        self.defs.insert(def.name.clone(), def);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ModelDef> {
        self.defs.get(name)
    }

    /// Definitions in load order
    pub fn defs(&self) -> impl Iterator<Item = &ModelDef> {
        self.defs.values()
    }

    /// Resolve every definition, binding behaviour from `registry`
    ///
    /// Parents are resolved before their children whatever the load order.
    pub fn resolve(&self, registry: &ActionRegistry) -> Result<Models> {
        for model in registry.models() {
            if !self.defs.contains_key(model) {
                warn!(model, "bindings registered for an undefined model");
            }
        }

        let mut models = Models::default();
        let mut visiting = Vec::new();
        for name in self.defs.keys() {
            self.resolve_one(name, registry, &mut models, &mut visiting)?;
        }
        debug!(models = models.len(), "resolved model definitions");
        Ok(models)
    }

    fn resolve_one(
        &self,
        name: &str,
        registry: &ActionRegistry,
        models: &mut Models,
        visiting: &mut Vec<String>,
    ) -> Result<ResolvedModel> {
        if let Some(model) = models.get(name) {
            return Ok(model.clone());
        }
        if visiting.iter().any(|v| v == name) {
            let mut cycle = visiting.clone();
            cycle.push(name.to_string());
            return Err(Error::Cycle(cycle.join(" -> ")));
        }
        let Some(def) = self.defs.get(name) else {
            return Err(Error::InvalidSchema(format!("unknown model {name}")));
        };

        visiting.push(name.to_string());
        let parent = match &def.extends {
            Some(parent) if !self.defs.contains_key(parent) => {
                return Err(Error::UnknownParent {
                    model: name.to_string(),
                    parent: parent.clone(),
                });
            }
            Some(parent) => Some(self.resolve_one(parent, registry, models, visiting)?),
            None => None,
        };
        visiting.pop();

        let bindings = registry.get(name);
        for action in &def.actions {
            if bindings.and_then(|b| b.action(action)).is_none() {
                return Err(Error::MissingAction {
                    model: name.to_string(),
                    action: action.clone(),
                });
            }
        }

        let mut description = def.to_description();
        if let Some(bindings) = bindings {
            description = bindings.apply(description);
        }
        let model = match &parent {
            Some(parent) => extend_model(parent, description)?,
            None => create_model(description)?,
        };
        debug!(
            model = name,
            parent = def.extends.as_deref(),
            description = %def.description,
            "resolved model definition"
        );
        models.models.insert(name.to_string(), model.clone());
        if !def.description.is_empty() {
            models
                .descriptions
                .insert(name.to_string(), def.description.clone());
        }
        Ok(model)
    }
}

/// Whether the content opens with a `(models: ..)` list, past comments
fn declares_model_list(content: &str) -> bool {
    let mut rest = content.trim_start();
    while let Some(comment) = rest.strip_prefix("//") {
        rest = comment
            .split_once('\n')
            .map_or("", |(_, tail)| tail)
            .trim_start();
    }
    rest.strip_prefix('(')
        .is_some_and(|body| body.trim_start().starts_with("models"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use roof_core::{Action, Value};

    const USERS: &str = r#"
    (
        models: [
            (
                name: "chineseUser",
                extends: Some("user"),
                data: { "zodiac": "dragon" },
            ),
            (
                name: "user",
                description: "Signed-in account",
                data: { "username": "", "isLogin": false },
                constants: { "role": "member" },
                actions: ["logout"],
            ),
        ]
    )
    "#;

    fn registry() -> ActionRegistry {
        let mut registry = ActionRegistry::new();
        registry.action(
            "user",
            "logout",
            Action::new(|this, _| {
                this.set("isLogin", false)?;
                Ok(Value::Null)
            }),
        );
        registry
    }

    #[test]
    fn test_load_models() {
        let mut loader = Loader::new();
        loader.load_str(USERS).unwrap();

        assert!(loader.get("user").is_some());
        assert_eq!(loader.get("chineseUser").unwrap().extends.as_deref(), Some("user"));
    }

    #[test]
    fn test_load_single_model() {
        let mut loader = Loader::new();
        loader.load_str(r#"(name: "todo", data: { "items": [] })"#).unwrap();
        assert_eq!(loader.defs().count(), 1);
    }

    #[test]
    fn test_malformed_list_reports_list_error() {
        let mut loader = Loader::new();
        let content = "// users\n(\n    models: [\n        (name: \"a\", data: 3),\n    ],\n)";
        let err = loader.load_str(content).unwrap_err();
        assert!(matches!(err, Error::Ron(_)));
        assert!(!err.to_string().contains("`name`"));
        assert_eq!(loader.defs().count(), 0);
    }

    #[test]
    fn test_model_list_detection() {
        assert!(declares_model_list("(models: [])"));
        assert!(declares_model_list("// header\n  ( models: [])"));
        assert!(!declares_model_list("(name: \"models\")"));
        assert!(!declares_model_list("// (models: [])\n(name: \"a\")"));
    }

    #[test]
    fn test_duplicate_definition() {
        let mut loader = Loader::new();
        loader.load_str(r#"(name: "todo")"#).unwrap();
        let err = loader.load_str(r#"(name: "todo")"#).unwrap_err();
        assert!(matches!(err, Error::DuplicateDefinition(ref name) if name == "todo"));
    }

    #[test]
    fn test_resolve_parents_first() {
        let mut loader = Loader::new();
        loader.load_str(USERS).unwrap();
        let models = loader.resolve(&registry()).unwrap();

        assert_eq!(models.names().collect::<Vec<_>>(), ["user", "chineseUser"]);
        let chinese = models.get("chineseUser").unwrap();
        assert_eq!(chinese.name(), "ChineseUser");
        assert!(chinese.extends(models.get("user").unwrap()));

        let instance = chinese.instantiate().unwrap();
        assert!(instance.has_action("logout"));
        assert_eq!(instance.get("zodiac").unwrap(), Value::from("dragon"));
        assert_eq!(instance.get("role").unwrap(), Value::from("member"));

        assert_eq!(models.description("user"), Some("Signed-in account"));
        assert_eq!(models.description("chineseUser"), None);
    }

    #[test]
    fn test_missing_action() {
        let mut loader = Loader::new();
        loader.load_str(USERS).unwrap();
        let err = loader.resolve(&ActionRegistry::new()).unwrap_err();
        assert!(matches!(err, Error::MissingAction { ref action, .. } if action == "logout"));
    }

    #[test]
    fn test_unknown_parent() {
        let mut loader = Loader::new();
        loader.load_str(r#"(name: "admin", extends: Some("root"))"#).unwrap();
        let err = loader.resolve(&ActionRegistry::new()).unwrap_err();
        assert!(matches!(err, Error::UnknownParent { ref parent, .. } if parent == "root"));
    }

    #[test]
    fn test_cycle() {
        let mut loader = Loader::new();
        loader.load_str(r#"(name: "a", extends: Some("b"))"#).unwrap();
        loader.load_str(r#"(name: "b", extends: Some("a"))"#).unwrap();
        let err = loader.resolve(&ActionRegistry::new()).unwrap_err();
        assert_eq!(err.to_string(), "inheritance cycle: a -> b -> a");
    }

    #[test]
    fn test_core_errors_pass_through() {
        let mut loader = Loader::new();
        loader
            .load_str(r#"(name: "user", data: { "from": "" }, constants: { "from": "China" })"#)
            .unwrap();
        let err = loader.resolve(&ActionRegistry::new()).unwrap_err();
        assert!(matches!(err, Error::Core(roof_core::Error::NamespaceConflict(_))));
    }
}
