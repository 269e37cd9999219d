//! Turning descriptions into instantiable models
//!
//! Resolution validates one description and links it to its parent:
//!
//! 1. The name must be present and non-empty; it is stored capitalized.
//! 2. Private keys must start with `_`.
//! 3. The description's own namespaces must be disjoint, or resolution fails.
//! 4. The namespaces of the whole chain are checked together. Collisions found
//!    here are kept on the model and returned when it is instantiated.
//!
//! Values are not merged here; instantiation walks the chain root to leaf.

use super::description::{Action, ModelDescription};
use super::instance::ModelInstance;
use crate::conflict::{ConflictPhase, ConflictReport, Namespace, NamespaceIndex};
use crate::error::{Error, NamingError, Result};
use crate::identity::ModelId;
use crate::middleware::Middleware;
use crate::utils::{capitalize, each, is_private_key};
use crate::value::ValueMap;
use indexmap::IndexMap;
use std::rc::Rc;
use tracing::{debug, warn};

struct ModelInner {
    id: ModelId,
    name: String,
    description: ModelDescription,
    parent: Option<ResolvedModel>,
    merge_conflicts: ConflictReport,
}

/// A validated model, ready to instantiate
///
/// Cloning creates another handle to the same model.
#[derive(Clone)]
pub struct ResolvedModel {
    inner: Rc<ModelInner>,
}

/// Resolve a root model
///
/// # Example
///
/// ```
/// use roof_core::{create_model, ModelDescription};
///
/// let user = create_model(ModelDescription::new("user").with_data("username", "")).unwrap();
/// assert_eq!(user.name(), "User");
/// ```
pub fn create_model(description: ModelDescription) -> Result<ResolvedModel> {
    resolve(None, description)
}

/// Resolve a model that inherits from `parent`
///
/// The parent is left untouched; the child gets its own identity.
pub fn extend_model(parent: &ResolvedModel, description: ModelDescription) -> Result<ResolvedModel> {
    resolve(Some(parent.clone()), description)
}

fn resolve(parent: Option<ResolvedModel>, description: ModelDescription) -> Result<ResolvedModel> {
    let name = match description.name.as_deref() {
        Some(name) if !name.is_empty() => capitalize(name),
        _ => return Err(NamingError::MissingName.into()),
    };

    if let Some(key) = description.privates.keys().find(|k| !is_private_key(k)) {
        return Err(NamingError::PrivateKey(key.clone()).into());
    }

    let mut own = NamespaceIndex::new();
    declare(&mut own, &description);
    let report = own.into_report(&name, ConflictPhase::Definition);
    if !report.is_empty() {
        return Err(Error::conflicts(report));
    }

    let mut chain = NamespaceIndex::new();
    if let Some(parent) = &parent {
        for level in parent.chain() {
            declare(&mut chain, &level.inner.description);
        }
    }
    declare(&mut chain, &description);
    let merge_conflicts = chain.into_report(&name, ConflictPhase::Merge);
    if !merge_conflicts.is_empty() {
        warn!(model = %name, conflicts = merge_conflicts.len(), "merged model has namespace conflicts");
    }

    let model = ResolvedModel {
        inner: Rc::new(ModelInner {
            id: ModelId::new(),
            name,
            description,
            parent,
            merge_conflicts,
        }),
    };
    debug!(
        model = %model.name(),
        id = %model.id(),
        parent = model.parent().map(|p| p.name()),
        "resolved model"
    );
    Ok(model)
}

fn declare(index: &mut NamespaceIndex, description: &ModelDescription) {
    index.declare(Namespace::Data, description.data.keys());
    index.declare(Namespace::Actions, description.actions.keys());
    index.declare(Namespace::Constants, description.constants.keys());
    index.declare(Namespace::Privates, description.privates.keys());
}

impl ResolvedModel {
    pub fn id(&self) -> ModelId {
        self.inner.id
    }

    /// Capitalized model name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn parent(&self) -> Option<&ResolvedModel> {
        self.inner.parent.as_ref()
    }

    /// This level's own description
    pub fn description(&self) -> &ModelDescription {
        &self.inner.description
    }

    /// Every level from the root ancestor down to this model
    pub fn chain(&self) -> Vec<ResolvedModel> {
        let mut chain = vec![self.clone()];
        let mut current = self.parent();
        while let Some(model) = current {
            chain.push(model.clone());
            current = model.parent();
        }
        chain.reverse();
        chain
    }

    /// Whether `ancestor` is this model or one of its ancestors
    pub fn extends(&self, ancestor: &ResolvedModel) -> bool {
        let mut current = Some(self);
        while let Some(model) = current {
            if model.ptr_eq(ancestor) {
                return true;
            }
            current = model.parent();
        }
        false
    }

    /// Collisions introduced by merging with the ancestors
    pub fn merge_conflicts(&self) -> &ConflictReport {
        &self.inner.merge_conflicts
    }

    /// Data defaults merged across the chain, descendants winning
    pub fn data_defaults(&self) -> ValueMap {
        self.merge(|d| &d.data)
    }

    /// Constants merged across the chain, descendants winning
    pub fn constants(&self) -> ValueMap {
        self.merge(|d| &d.constants)
    }

    /// Actions merged across the chain, descendants winning
    pub fn actions(&self) -> IndexMap<String, Action> {
        self.merge(|d| &d.actions)
    }

    /// Local pipeline of the nearest level that declares one
    pub fn middleware(&self) -> Option<Middleware> {
        let mut current = Some(self);
        while let Some(model) = current {
            if let Some(middleware) = &model.inner.description.middleware {
                return Some(middleware.clone());
            }
            current = model.parent();
        }
        None
    }

    /// Create an instance with the declared defaults
    pub fn instantiate(&self) -> Result<ModelInstance> {
        ModelInstance::construct(self, ValueMap::new())
    }

    /// Create an instance, shallowly overriding data defaults
    pub fn instantiate_with(&self, overrides: ValueMap) -> Result<ModelInstance> {
        ModelInstance::construct(self, overrides)
    }

    pub fn ptr_eq(&self, other: &ResolvedModel) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn merge<V: Clone>(&self, select: impl Fn(&ModelDescription) -> &IndexMap<String, V>) -> IndexMap<String, V> {
        let mut merged = IndexMap::new();
        for level in self.chain() {
            each(select(&level.inner.description), |value, key| {
                merged.insert(key.to_string(), value.clone());
            });
        }
        merged
    }
}

impl std::fmt::Debug for ResolvedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedModel")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("parent", &self.parent().map(|p| p.name().to_string()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn noop() -> Action {
        Action::new(|_, _| Ok(Value::Null))
    }

    #[test]
    fn test_name_is_required() {
        let err = create_model(ModelDescription::unnamed()).unwrap_err();
        assert!(matches!(err, Error::Naming(NamingError::MissingName)));
        assert_eq!(err.to_string(), "model need a name");

        let err = create_model(ModelDescription::new("")).unwrap_err();
        assert!(matches!(err, Error::Naming(NamingError::MissingName)));
    }

    #[test]
    fn test_name_is_capitalized() {
        let model = create_model(ModelDescription::new("user")).unwrap();
        assert_eq!(model.name(), "User");
    }

    #[test]
    fn test_private_keys_need_prefix() {
        let err = create_model(ModelDescription::new("user").with_private("cache", 1u8)).unwrap_err();
        assert!(matches!(err, Error::Naming(NamingError::PrivateKey(ref k)) if k == "cache"));

        assert!(create_model(ModelDescription::new("user").with_private("_cache", 1u8)).is_ok());
    }

    #[test]
    fn test_definition_conflict() {
        let description = ModelDescription::new("user")
            .with_data("login", false)
            .with_action("login", noop());

        let err = create_model(description).unwrap_err();
        let report = err.conflict_report().unwrap();
        let conflict = report.get("login").unwrap();
        assert_eq!(conflict.phase, ConflictPhase::Definition);
        assert_eq!(conflict.namespaces, vec![Namespace::Data, Namespace::Actions]);
    }

    #[test]
    fn test_merge_conflict_is_deferred() {
        let user = create_model(ModelDescription::new("user").with_data("role", "member")).unwrap();
        let admin = extend_model(&user, ModelDescription::new("admin").with_constant("role", "admin")).unwrap();

        assert_eq!(admin.merge_conflicts().len(), 1);
        let err = admin.instantiate().unwrap_err();
        let conflict = err.conflict_report().unwrap().get("role").unwrap();
        assert_eq!(conflict.phase, ConflictPhase::Merge);
    }

    #[test]
    fn test_same_namespace_override_is_allowed() {
        let user = create_model(ModelDescription::new("user").with_data("name", "")).unwrap();
        let admin = extend_model(&user, ModelDescription::new("admin").with_data("name", "root")).unwrap();

        assert!(admin.merge_conflicts().is_empty());
        assert_eq!(admin.data_defaults().get("name"), Some(&Value::from("root")));
    }

    #[test]
    fn test_every_resolution_has_fresh_identity() {
        let a = create_model(ModelDescription::new("user")).unwrap();
        let b = create_model(ModelDescription::new("user")).unwrap();
        let c = extend_model(&a, ModelDescription::new("user")).unwrap();

        assert_ne!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert!(c.extends(&a));
        assert!(!a.extends(&c));
        assert!(!b.extends(&a));
    }

    #[test]
    fn test_chain_order() {
        let a = create_model(ModelDescription::new("a").with_data("x", 1i64)).unwrap();
        let b = extend_model(&a, ModelDescription::new("b").with_data("y", 2i64)).unwrap();
        let c = extend_model(&b, ModelDescription::new("c").with_data("x", 3i64)).unwrap();

        let names: Vec<_> = c.chain().iter().map(|m| m.name().to_string()).collect();
        assert_eq!(names, ["A", "B", "C"]);

        let keys: Vec<_> = c.data_defaults().into_iter().collect();
        assert_eq!(
            keys,
            vec![("x".to_string(), Value::Int(3)), ("y".to_string(), Value::Int(2))]
        );
    }

    #[test]
    fn test_nearest_middleware_wins() {
        let outer = Middleware::new();
        let inner = Middleware::new();
        let a = create_model(ModelDescription::new("a").with_middleware(outer.clone())).unwrap();
        let b = extend_model(&a, ModelDescription::new("b")).unwrap();
        let c = extend_model(&b, ModelDescription::new("c").with_middleware(inner.clone())).unwrap();

        assert!(b.middleware().unwrap().ptr_eq(&outer));
        assert!(c.middleware().unwrap().ptr_eq(&inner));
    }
}
