//! Error types for Anbar container operations.
//!
//! Every failure names the key, class or field involved and, where it
//! helps, a hint on how to fix the registration.

use std::fmt;

use anbar_support::rendering::render_chain;

use crate::key::TypeKey;

/// Main error type for all Anbar operations.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// No factory produced the key and no concrete class matches it.
    #[error("{}", .0)]
    DependencyResolution(DependencyResolutionError),

    /// Read of a field that was neither injected nor bound on demand.
    #[error("Property {field} is undefined in class {class}")]
    UndefinedProperty { field: String, class: String },

    /// An on-demand binding was handed to a slot that only holds eager values.
    #[error("Property {field} of class {class} is declared on-demand but its slot is eager\n  Hint: declare the field as OnDemand<T>")]
    EagerSlotOnDemand { field: String, class: String },

    /// A descriptor carries none of its production strategies.
    #[error("Unknown registration type for {key}: the descriptor names no object, class or callback")]
    UnknownDescriptorVariant { key: TypeKey },

    /// Resolution re-entered a key that is still being resolved.
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),

    /// Resolution nested deeper than the configured limit.
    #[error("Resolution of {key} exceeded the maximum depth of {depth}")]
    DepthExceeded { key: TypeKey, depth: usize },

    /// A class-name descriptor names a class the catalog does not know.
    #[error("Class {class} is not known to the container\n  Hint: derive Injectable for it or add it with .class::<T>()")]
    UnknownClass { class: TypeKey },

    /// The produced instance is not of the requested Rust type.
    #[error("Type mismatch for {key}: expected {expected}, found {found}")]
    TypeMismatch {
        key: TypeKey,
        expected: &'static str,
        found: &'static str,
    },

    /// A constructor argument is missing or has the wrong type.
    #[error("Constructor argument #{index} is missing or is not a {expected}")]
    MissingArgument { index: usize, expected: &'static str },

    /// The finish-construction step of a class failed.
    #[error("Failed to construct {class}: {source}")]
    ConstructionFailed {
        class: TypeKey,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An on-demand field outlived the container it was bound to.
    #[error("Cannot resolve {key}: the container that bound this field has been dropped")]
    ContainerDropped { key: TypeKey },
}

impl ContainerError {
    /// Wraps an application error raised while constructing `class`.
    pub fn construction(
        class: impl Into<TypeKey>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ConstructionFailed {
            class: class.into(),
            source: source.into(),
        }
    }

    /// Error for a field read that has no value and no pending binding.
    pub fn undefined_property(field: impl Into<String>, class: impl Into<String>) -> Self {
        Self::UndefinedProperty {
            field: field.into(),
            class: class.into(),
        }
    }
}

/// Error when a key cannot be resolved.
#[derive(Debug)]
pub struct DependencyResolutionError {
    /// The key that was requested.
    pub key: TypeKey,
    /// The key whose resolution needed it, if any.
    pub required_by: Option<TypeKey>,
    /// Known keys with similar names.
    pub suggestions: Vec<String>,
}

impl fmt::Display for DependencyResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unable to resolve dependency {}", self.key)?;

        if let Some(ref parent) = self.required_by {
            write!(f, "\n  Required by: {parent}")?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(
            f,
            "\n  Hint: register {} or make it a known class",
            self.key.short_name()
        )
    }
}

/// Error when a resolution chain loops back onto itself.
#[derive(Debug)]
pub struct CircularDependencyError {
    /// The keys forming the cycle, first and last being the same key.
    pub chain: Vec<TypeKey>,
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Circular dependency detected:\n  {}", render_chain(&self.chain))?;
        write!(
            f,
            "\n  Hint: mark one of the fields on-demand or restructure the dependencies"
        )
    }
}

/// Convenient Result type for Anbar operations.
pub type Result<T> = std::result::Result<T, ContainerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_error_display() {
        let err = ContainerError::DependencyResolution(DependencyResolutionError {
            key: TypeKey::new("app::Mailer"),
            required_by: Some(TypeKey::new("app::Signup")),
            suggestions: vec!["app::Mail".into()],
        });

        let msg = err.to_string();
        assert!(msg.contains("Unable to resolve dependency app::Mailer"));
        assert!(msg.contains("Required by: app::Signup"));
        assert!(msg.contains("- app::Mail"));
    }

    #[test]
    fn circular_dependency_display() {
        let err = ContainerError::CircularDependency(CircularDependencyError {
            chain: vec![TypeKey::new("A"), TypeKey::new("B"), TypeKey::new("A")],
        });

        let msg = err.to_string();
        assert!(msg.contains("Circular"));
        assert!(msg.contains("A → B → A"));
    }

    #[test]
    fn undefined_property_display() {
        let err = ContainerError::undefined_property("mailer", "app::Signup");
        assert_eq!(err.to_string(), "Property mailer is undefined in class app::Signup");
    }

    #[test]
    fn construction_wraps_source() {
        let err = ContainerError::construction("app::Db", "connection refused");
        assert!(err.to_string().contains("Failed to construct app::Db: connection refused"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
