//! Naming-convention resolution.
//!
//! A [`ConventionFactory`] maps an abstract key to a concrete class name
//! with a rule, and activates the class if the container knows it. It lets
//! applications skip registering every `IFoo → Foo` pair by hand.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::error::Result;
use crate::flags::DependencyFlags;
use crate::instance::Instance;
use crate::key::{SEPARATOR, TypeKey};
use crate::resolver::{Activator, DependencyContainer, DependencyFactory};

/// Maps a requested key to the class that should satisfy it.
pub type ConventionRule = Arc<dyn Fn(&TypeKey) -> Option<TypeKey> + Send + Sync>;

/// `ns::IFoo` → `ns::Foo`.
///
/// Only applies when the short name is `I` followed by an upper-case letter.
pub fn strip_interface_prefix(key: &TypeKey) -> Option<TypeKey> {
    let short = key.short_name();
    let rest = short.strip_prefix('I')?;
    if !rest.chars().next().is_some_and(char::is_uppercase) {
        return None;
    }
    Some(rebuild(key.namespace(), rest))
}

/// `ns::Foo` → `ns::Foo<suffix>`.
pub fn suffix(suffix: &'static str) -> impl Fn(&TypeKey) -> Option<TypeKey> + Send + Sync {
    move |key| Some(rebuild(key.namespace(), &format!("{}{suffix}", key.short_name())))
}

fn rebuild(namespace: &str, short: &str) -> TypeKey {
    if namespace.is_empty() {
        TypeKey::new(short.to_owned())
    } else {
        TypeKey::new(format!("{namespace}{SEPARATOR}{short}"))
    }
}

/// Resolves keys to classes by naming convention.
///
/// The factory reports its flags for every key its rule maps, whether or
/// not the mapped class exists. [`Container::validate`](crate::Container::validate)
/// therefore treats every such key as producible; with a rule like
/// [`suffix`], which maps any key, no missing target is reported.
pub struct ConventionFactory {
    rule: ConventionRule,
    flags: DependencyFlags,
}

impl ConventionFactory {
    /// A factory applying `rule`, reporting `flags` for every key it maps.
    pub fn new(rule: impl Fn(&TypeKey) -> Option<TypeKey> + Send + Sync + 'static, flags: DependencyFlags) -> Self {
        Self {
            rule: Arc::new(rule),
            flags,
        }
    }

    /// The class `key` maps to, if the rule applies.
    pub fn map(&self, key: &TypeKey) -> Option<TypeKey> {
        (self.rule)(key).filter(|class| class != key)
    }
}

impl DependencyFactory for ConventionFactory {
    fn create_dependency(
        &self,
        key: &TypeKey,
        _container: &dyn DependencyContainer,
        activator: &dyn Activator,
    ) -> Result<Option<Instance>> {
        let Some(class) = self.map(key) else {
            return Ok(None);
        };
        if !activator.class_exists(&class) {
            return Ok(None);
        }
        trace!(key = %key, class = %class, "Resolved by convention");
        activator.create_instance(&class).map(Some)
    }

    fn dependency_flags(&self, key: &TypeKey) -> Option<DependencyFlags> {
        // Claims every key the rule maps; non-existent classes still fall
        // through in create_dependency.
        self.map(key).map(|_| self.flags)
    }

    fn name(&self) -> &str {
        "convention"
    }
}

impl fmt::Debug for ConventionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConventionFactory")
            .field("flags", &self.flags)
            .finish()
    }
}
