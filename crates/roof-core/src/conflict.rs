//! Namespace conflict detection for model schemas
//!
//! A model owns four namespaces: data, actions, constants and privates. Every
//! name must live in exactly one of them, across the whole extension chain.
//!
//! # Phases
//!
//! - **Definition**: collisions inside a single description. Detected when the
//!   description is resolved (`create_model` / `extend_model`).
//! - **Merge**: collisions that only appear once a description is combined
//!   with its ancestors. Detected at resolution time but reported when the
//!   model is instantiated.
//!
//! # Algorithm
//!
//! Both phases run the same set-based pass: build a map from name to the
//! namespaces that declare it, then report every name claimed by more than
//! one namespace. Names overriding the same namespace of an ancestor are not
//! conflicts. Output order follows declaration order so reports are
//! deterministic.

use indexmap::IndexMap;
use std::fmt;

/// One of the disjoint namespaces of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    Data,
    Actions,
    Constants,
    Privates,
}

impl Namespace {
    /// Lower-case name used in diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Data => "data",
            Namespace::Actions => "actions",
            Namespace::Constants => "constants",
            Namespace::Privates => "privates",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When a conflict was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPhase {
    /// Inside a single model description
    Definition,
    /// After merging a description with its ancestors
    Merge,
}

/// A single name claimed by more than one namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceConflict {
    /// The colliding name
    pub key: String,
    /// Every namespace that declares the name (sorted, deduplicated)
    pub namespaces: Vec<Namespace>,
    /// Detection phase
    pub phase: ConflictPhase,
}

impl NamespaceConflict {
    /// Whether the given namespace takes part in this conflict
    pub fn involves(&self, namespace: Namespace) -> bool {
        self.namespaces.contains(&namespace)
    }
}

impl fmt::Display for NamespaceConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.namespaces.iter().map(Namespace::as_str).collect();
        match self.phase {
            ConflictPhase::Definition => {
                write!(f, "\"{}\" is defined in {}", self.key, names.join(" and "))
            }
            ConflictPhase::Merge => write!(
                f,
                "\"{}\" is defined in {} across the extension chain",
                self.key,
                names.join(" and ")
            ),
        }
    }
}

/// All conflicts found for one model
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConflictReport {
    /// Name of the model being resolved
    pub model: String,
    /// Conflicts in declaration order
    pub conflicts: Vec<NamespaceConflict>,
}

impl ConflictReport {
    /// Create an empty report for a model
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            conflicts: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    /// Find the conflict for a given name
    pub fn get(&self, key: &str) -> Option<&NamespaceConflict> {
        self.conflicts.iter().find(|c| c.key == key)
    }

    /// Iterate conflicts detected in a given phase
    pub fn in_phase(&self, phase: ConflictPhase) -> impl Iterator<Item = &NamespaceConflict> {
        self.conflicts.iter().filter(move |c| c.phase == phase)
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model {}: ", self.model)?;
        for (i, conflict) in self.conflicts.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", conflict)?;
        }
        Ok(())
    }
}

/// Collects name declarations and reports cross-namespace collisions
#[derive(Debug, Default)]
pub struct NamespaceIndex {
    claims: IndexMap<String, Vec<Namespace>>,
}

impl NamespaceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every key of one namespace
    pub fn declare<'a>(&mut self, namespace: Namespace, keys: impl IntoIterator<Item = &'a String>) {
        for key in keys {
            let claims = self.claims.entry(key.clone()).or_default();
            if !claims.contains(&namespace) {
                claims.push(namespace);
            }
        }
    }

    /// Build a report of every name claimed more than once
    pub fn into_report(self, model: impl Into<String>, phase: ConflictPhase) -> ConflictReport {
        let conflicts = self
            .claims
            .into_iter()
            .filter(|(_, namespaces)| namespaces.len() > 1)
            .map(|(key, mut namespaces)| {
                namespaces.sort();
                NamespaceConflict {
                    key,
                    namespaces,
                    phase,
                }
            })
            .collect();

        ConflictReport {
            model: model.into(),
            conflicts,
        }
    }
}
