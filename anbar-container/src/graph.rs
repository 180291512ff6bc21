//! Dependency graph validation.
//!
//! Checks the eager dependency graph without constructing anything:
//! - Detects circular dependencies
//! - Checks that every eager target can be produced
//!
//! Nodes are classes (with their eager fields, ancestors included) and
//! keys bound to classes. On-demand fields add no edges: they are resolved
//! after construction, so they cannot form a construction cycle.
//! Keys produced by objects, callbacks or custom factories are leaves.

use std::collections::{HashMap, HashSet};

use anbar_support::rendering::suggest_similar;
use tracing::{debug, instrument, warn};

use crate::error::{CircularDependencyError, ContainerError, DependencyResolutionError};
use crate::key::TypeKey;

/// Maximum number of "did you mean" suggestions per error.
const MAX_SUGGESTIONS: usize = 3;

/// Validates the dependency graph for correctness.
///
/// # Algorithm
/// Depth-first search over the edges, keeping the current path to detect
/// cycles and to report which key required a missing one.
pub(crate) struct GraphValidator<'a> {
    /// Outgoing edges of every node
    edges: HashMap<TypeKey, Vec<TypeKey>>,
    /// Whether a key without edges can still be produced
    is_known: &'a dyn Fn(&TypeKey) -> bool,
    /// Names offered as suggestions
    available: Vec<String>,
    /// Currently being visited
    visiting: HashSet<TypeKey>,
    /// Already validated
    validated: HashSet<TypeKey>,
    /// Current DFS path
    path: Vec<TypeKey>,
}

impl<'a> GraphValidator<'a> {
    pub fn new(
        edges: HashMap<TypeKey, Vec<TypeKey>>,
        is_known: &'a dyn Fn(&TypeKey) -> bool,
        available: Vec<String>,
    ) -> Self {
        Self {
            edges,
            is_known,
            available,
            visiting: HashSet::new(),
            validated: HashSet::new(),
            path: Vec::new(),
        }
    }

    /// Validates every node.
    ///
    /// # Errors
    /// - [`ContainerError::CircularDependency`]: cycle detected
    /// - [`ContainerError::DependencyResolution`]: an eager target nothing produces
    #[instrument(skip(self), name = "graph_validation")]
    pub fn validate(&mut self) -> Result<(), ContainerError> {
        let mut keys: Vec<TypeKey> = self.edges.keys().cloned().collect();
        keys.sort();

        debug!(node_count = keys.len(), "Starting dependency graph validation");

        for key in keys {
            if !self.validated.contains(&key) {
                self.validate_key(&key)?;
            }
        }

        debug!("Dependency graph validation passed");
        Ok(())
    }

    fn validate_key(&mut self, key: &TypeKey) -> Result<(), ContainerError> {
        if self.validated.contains(key) {
            return Ok(());
        }

        if self.visiting.contains(key) {
            let cycle_start = self.path.iter().position(|k| k == key).unwrap_or(0);
            let mut chain: Vec<TypeKey> = self.path[cycle_start..].to_vec();
            chain.push(key.clone());

            warn!(cycle = ?chain, "Circular dependency detected");
            return Err(ContainerError::CircularDependency(CircularDependencyError { chain }));
        }

        let Some(dependencies) = self.edges.get(key).cloned() else {
            if (self.is_known)(key) {
                self.validated.insert(key.clone());
                return Ok(());
            }
            return Err(self.missing(key));
        };

        self.visiting.insert(key.clone());
        self.path.push(key.clone());

        for dep in &dependencies {
            self.validate_key(dep)?;
        }

        self.path.pop();
        self.visiting.remove(key);
        self.validated.insert(key.clone());

        Ok(())
    }

    fn missing(&self, key: &TypeKey) -> ContainerError {
        let available: Vec<&str> = self.available.iter().map(String::as_str).collect();
        ContainerError::DependencyResolution(DependencyResolutionError {
            key: key.clone(),
            required_by: self.path.last().cloned(),
            suggestions: suggest_similar(key.as_str(), &available, MAX_SUGGESTIONS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&'static str, &[&'static str])]) -> HashMap<TypeKey, Vec<TypeKey>> {
        edges
            .iter()
            .map(|(key, deps)| (TypeKey::new(*key), deps.iter().map(|d| TypeKey::new(*d)).collect()))
            .collect()
    }

    fn nothing_else(_: &TypeKey) -> bool {
        false
    }

    #[test]
    fn valid_simple_graph() {
        let edges = graph(&[
            ("app::Database", &[]),
            ("app::UserRepo", &["app::Database"]),
            ("app::UserService", &["app::UserRepo"]),
        ]);
        let mut validator = GraphValidator::new(edges, &nothing_else, vec![]);
        assert!(validator.validate().is_ok());
    }

    #[test]
    fn detect_circular_dependency() {
        // A → B → C → A
        let edges = graph(&[("A", &["B"]), ("B", &["C"]), ("C", &["A"])]);
        let mut validator = GraphValidator::new(edges, &nothing_else, vec![]);

        match validator.validate().unwrap_err() {
            ContainerError::CircularDependency(err) => {
                assert_eq!(err.chain.len(), 4);
                assert_eq!(err.chain.first(), err.chain.last());
            }
            other => panic!("Expected CircularDependency, got: {other:?}"),
        }
    }

    #[test]
    fn detect_self_dependency() {
        let edges = graph(&[("A", &["A"])]);
        let mut validator = GraphValidator::new(edges, &nothing_else, vec![]);
        assert!(validator.validate().is_err());
    }

    #[test]
    fn detect_missing_dependency() {
        let edges = graph(&[("app::Service", &["app::Loger"])]);
        let mut validator = GraphValidator::new(edges, &nothing_else, vec!["app::Logger".into()]);

        match validator.validate().unwrap_err() {
            ContainerError::DependencyResolution(err) => {
                assert_eq!(err.key.as_str(), "app::Loger");
                assert_eq!(err.required_by, Some(TypeKey::new("app::Service")));
                assert_eq!(err.suggestions, vec!["app::Logger".to_string()]);
            }
            other => panic!("Expected DependencyResolution, got: {other:?}"),
        }
    }

    #[test]
    fn leaves_known_elsewhere_are_fine() {
        let edges = graph(&[("app::Service", &["app::Config"])]);
        let known = |key: &TypeKey| key.as_str() == "app::Config";
        let mut validator = GraphValidator::new(edges, &known, vec![]);
        assert!(validator.validate().is_ok());
    }

    #[test]
    fn diamond_dependency_ok() {
        //     A
        //    / \
        //   B   C
        //    \ /
        //     D
        let edges = graph(&[("D", &[]), ("B", &["D"]), ("C", &["D"]), ("A", &["B", "C"])]);
        let mut validator = GraphValidator::new(edges, &nothing_else, vec![]);
        assert!(validator.validate().is_ok());
    }
}
