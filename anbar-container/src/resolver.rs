//! The seams between the container and its collaborators.
//!
//! Factories, descriptors and injectors never see the concrete
//! [`Container`](crate::container::Container); they talk to it through
//! these traits, which keeps each piece testable on its own.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::class::InjectTarget;
use crate::error::{ContainerError, Result};
use crate::flags::DependencyFlags;
use crate::instance::{Args, Instance};
use crate::key::TypeKey;

/// Resolves keys to instances.
pub trait DependencyContainer: Send + Sync {
    /// Resolve `key` to an instance.
    ///
    /// # Errors
    /// [`ContainerError::DependencyResolution`] when nothing can produce `key`.
    fn resolve(&self, key: &TypeKey) -> Result<Instance>;

    /// A weak capability to resolve through this container later.
    ///
    /// On-demand fields keep this handle until their first read.
    fn handle(&self) -> ResolverHandle;
}

/// Creates brand-new instances of named classes.
pub trait Activator: Send + Sync {
    /// Allocate `class`, inject its declared dependencies, then finish
    /// construction with `args`.
    fn create_instance_args(&self, class: &TypeKey, args: Args) -> Result<Instance>;

    /// [`create_instance_args`](Self::create_instance_args) without arguments.
    fn create_instance(&self, class: &TypeKey) -> Result<Instance> {
        self.create_instance_args(class, Args::new())
    }

    /// Populate the declared dependencies of an existing object.
    fn inject_into(&self, target: &mut dyn InjectTarget) -> Result<()>;

    /// Returns `true` if `class` names a class this activator can create.
    fn class_exists(&self, class: &TypeKey) -> bool;
}

/// One link in the container's resolution chain.
///
/// Returning `Ok(None)` means "not mine": the container moves on to the
/// next factory.
pub trait DependencyFactory: Send + Sync {
    /// Produce an instance for `key`, or `None` if this factory does not know it.
    fn create_dependency(
        &self,
        key: &TypeKey,
        container: &dyn DependencyContainer,
        activator: &dyn Activator,
    ) -> Result<Option<Instance>>;

    /// Flags for `key`, or `None` if this factory does not know it.
    fn dependency_flags(&self, key: &TypeKey) -> Option<DependencyFlags>;

    /// Human-readable name for diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Resolve a typed dependency from any [`DependencyContainer`].
///
/// Use this inside callbacks:
///
/// ```rust,ignore
/// builder.callback("app::Mailer", |c, _| {
///     let transport = resolve_as::<SmtpTransport>(c, &"app::Transport".into())?;
///     Ok(Instance::new(Mailer::new(transport)))
/// })
/// ```
pub fn resolve_as<T: Any + Send + Sync>(
    container: &dyn DependencyContainer,
    key: &TypeKey,
) -> Result<Arc<T>> {
    container.resolve(key)?.downcast_for::<T>(key)
}

/// Weak capability to resolve through a container.
///
/// Holding a handle does not keep the container alive; resolving through
/// a handle whose container is gone fails with
/// [`ContainerError::ContainerDropped`].
#[derive(Clone)]
pub struct ResolverHandle(Weak<dyn DependencyContainer>);

impl ResolverHandle {
    /// Handle to a shared container.
    pub fn new<C: DependencyContainer + 'static>(container: &Arc<C>) -> Self {
        let weak: Weak<C> = Arc::downgrade(container);
        Self(weak)
    }

    /// Handle from an existing weak reference.
    pub fn from_weak(container: Weak<dyn DependencyContainer>) -> Self {
        Self(container)
    }

    /// Resolve `key` if the container is still alive.
    pub fn resolve(&self, key: &TypeKey) -> Result<Instance> {
        let container = self
            .0
            .upgrade()
            .ok_or_else(|| ContainerError::ContainerDropped { key: key.clone() })?;
        container.resolve(key)
    }

    /// Returns `true` while the container is alive.
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl fmt::Debug for ResolverHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Instance);

    impl DependencyContainer for Fixed {
        fn resolve(&self, _key: &TypeKey) -> Result<Instance> {
            Ok(self.0.clone())
        }

        fn handle(&self) -> ResolverHandle {
            unreachable!("not used in these tests")
        }
    }

    #[test]
    fn handle_resolves_while_alive() {
        let container = Arc::new(Fixed(Instance::new(7u8)));
        let handle = ResolverHandle::new(&container);
        assert!(handle.is_alive());

        let value = handle.resolve(&TypeKey::new("n")).unwrap();
        assert_eq!(*value.downcast::<u8>().unwrap(), 7);
    }

    #[test]
    fn handle_fails_after_drop() {
        let container = Arc::new(Fixed(Instance::new(7u8)));
        let handle = ResolverHandle::new(&container);
        drop(container);

        assert!(!handle.is_alive());
        assert!(matches!(
            handle.resolve(&TypeKey::new("n")),
            Err(ContainerError::ContainerDropped { .. })
        ));
    }

    #[test]
    fn resolve_as_downcasts() {
        let container = Fixed(Instance::new(String::from("x")));
        let key = TypeKey::new("name");
        assert_eq!(*resolve_as::<String>(&container, &key).unwrap(), "x");
        assert!(resolve_as::<u8>(&container, &key).is_err());
    }
}
