//! Registry-based resolution factory.
//!
//! The registry maps [`TypeKey`]s to descriptors. It is the first link of
//! every container's resolution chain and the target of all registration
//! calls made by application start-up code.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::descriptor::{Descriptor, DependencyDescriptor};
use crate::error::Result;
use crate::flags::DependencyFlags;
use crate::instance::{Args, Instance};
use crate::key::TypeKey;
use crate::resolver::{Activator, DependencyContainer, DependencyFactory};

/// Registration entry for a single key.
#[derive(Clone)]
struct Binding {
    descriptor: Arc<dyn DependencyDescriptor>,
    flags: DependencyFlags,
}

/// Stores type → descriptor bindings.
///
/// Registering a key twice replaces the earlier binding.
#[derive(Default)]
pub struct RegistryFactory {
    bindings: RwLock<HashMap<TypeKey, Binding>>,
}

impl RegistryFactory {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `key` to `descriptor`, replacing any earlier binding.
    ///
    /// Returns `true` if an earlier binding was replaced.
    pub fn register(&self, key: impl Into<TypeKey>, descriptor: impl DependencyDescriptor + 'static) -> bool {
        let key = key.into();
        let flags = descriptor.flags();
        debug!(key = %key, flags = %flags, "Registered dependency");
        self.bindings
            .write()
            .insert(
                key,
                Binding {
                    descriptor: Arc::new(descriptor),
                    flags,
                },
            )
            .is_some()
    }

    /// Binds `key` to a pre-built instance.
    pub fn register_object(&self, key: impl Into<TypeKey>, instance: Instance, flags: DependencyFlags) -> bool {
        self.register(key, Descriptor::object(instance).with_flags(flags))
    }

    /// Binds `key` to a value, wrapping it in a new [`Instance`].
    pub fn register_value<T: Any + Send + Sync>(&self, key: impl Into<TypeKey>, value: T) -> bool {
        self.register(key, Descriptor::object(Instance::new(value)))
    }

    /// Binds `key` to a class activated with `args`.
    pub fn register_class(
        &self,
        key: impl Into<TypeKey>,
        class: impl Into<TypeKey>,
        args: Args,
        flags: DependencyFlags,
    ) -> bool {
        self.register(key, Descriptor::class_name(class, args).with_flags(flags))
    }

    /// Binds `key` to a callback.
    pub fn register_callback(
        &self,
        key: impl Into<TypeKey>,
        callback: impl Fn(&dyn DependencyContainer, &dyn Activator) -> Result<Instance>
            + Send
            + Sync
            + 'static,
        flags: DependencyFlags,
    ) -> bool {
        self.register(key, Descriptor::callback(callback).with_flags(flags))
    }

    /// Removes the binding for `key`. Returns `true` if there was one.
    pub fn unregister(&self, key: &TypeKey) -> bool {
        let removed = self.bindings.write().remove(key).is_some();
        if removed {
            debug!(key = %key, "Unregistered dependency");
        }
        removed
    }

    /// Returns `true` if `key` is bound.
    pub fn contains(&self, key: &TypeKey) -> bool {
        self.bindings.read().contains_key(key)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.read().len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.bindings.read().is_empty()
    }

    /// All bound keys, sorted.
    pub fn registered_keys(&self) -> Vec<TypeKey> {
        let mut keys: Vec<_> = self.bindings.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Class names of the class-name bindings, keyed by the bound key.
    pub(crate) fn class_bindings(&self) -> Vec<(TypeKey, TypeKey)> {
        self.bindings
            .read()
            .iter()
            .filter_map(|(key, binding)| {
                let class = binding.descriptor.activated_class()?;
                Some((key.clone(), class.clone()))
            })
            .collect()
    }

    fn binding(&self, key: &TypeKey) -> Option<Binding> {
        self.bindings.read().get(key).cloned()
    }
}

impl DependencyFactory for RegistryFactory {
    fn create_dependency(
        &self,
        key: &TypeKey,
        container: &dyn DependencyContainer,
        activator: &dyn Activator,
    ) -> Result<Option<Instance>> {
        // Clone the binding out so the lock is released before the
        // descriptor runs; descriptors may register or resolve.
        let Some(binding) = self.binding(key) else {
            return Ok(None);
        };
        trace!(key = %key, "Registry producing dependency");
        binding
            .descriptor
            .create_dependency(key, container, activator)
            .map(Some)
    }

    fn dependency_flags(&self, key: &TypeKey) -> Option<DependencyFlags> {
        self.bindings.read().get(key).map(|b| b.flags)
    }

    fn name(&self) -> &str {
        "registry"
    }
}

impl fmt::Debug for RegistryFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryFactory")
            .field("registered", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::InjectTarget;
    use crate::resolver::ResolverHandle;

    struct Null;

    impl DependencyContainer for Null {
        fn resolve(&self, key: &TypeKey) -> Result<Instance> {
            Ok(Instance::new(key.to_string()))
        }

        fn handle(&self) -> ResolverHandle {
            unreachable!("not used in these tests")
        }
    }

    impl Activator for Null {
        fn create_instance_args(&self, class: &TypeKey, _args: Args) -> Result<Instance> {
            Ok(Instance::new(class.to_string()))
        }

        fn inject_into(&self, _target: &mut dyn InjectTarget) -> Result<()> {
            Ok(())
        }

        fn class_exists(&self, _class: &TypeKey) -> bool {
            false
        }
    }

    #[test]
    fn register_and_create() {
        let reg = RegistryFactory::new();
        let key = TypeKey::new("app::Answer");
        reg.register_value(key.clone(), 42i32);

        let out = reg.create_dependency(&key, &Null, &Null).unwrap().unwrap();
        assert_eq!(*out.downcast::<i32>().unwrap(), 42);
        assert_eq!(reg.dependency_flags(&key), Some(DependencyFlags::SINGLETON));
    }

    #[test]
    fn unknown_key_is_not_found() {
        let reg = RegistryFactory::new();
        let key = TypeKey::new("app::Missing");
        assert!(reg.create_dependency(&key, &Null, &Null).unwrap().is_none());
        assert_eq!(reg.dependency_flags(&key), None);
    }

    #[test]
    fn last_registration_wins() {
        let reg = RegistryFactory::new();
        let key = TypeKey::new("app::Answer");
        assert!(!reg.register_value(key.clone(), 1i32));
        assert!(reg.register_object(key.clone(), Instance::new(2i32), DependencyFlags::NONE));

        let out = reg.create_dependency(&key, &Null, &Null).unwrap().unwrap();
        assert_eq!(*out.downcast::<i32>().unwrap(), 2);
        assert_eq!(reg.dependency_flags(&key), Some(DependencyFlags::NONE));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn unregister_removes_binding() {
        let reg = RegistryFactory::new();
        let key = TypeKey::new("app::Answer");
        reg.register_value(key.clone(), 1i32);
        assert!(reg.unregister(&key));
        assert!(!reg.unregister(&key));
        assert!(reg.is_empty());
    }

    #[test]
    fn callback_may_register_while_running() {
        let reg = Arc::new(RegistryFactory::new());
        let inner = reg.clone();
        reg.register_callback(
            "app::Outer",
            move |_, _| {
                inner.register_value("app::Late", 1u8);
                Ok(Instance::new(()))
            },
            DependencyFlags::NONE,
        );

        reg.create_dependency(&TypeKey::new("app::Outer"), &Null, &Null).unwrap();
        assert!(reg.contains(&TypeKey::new("app::Late")));
    }

    #[test]
    fn class_bindings_lists_class_names() {
        let reg = RegistryFactory::new();
        reg.register_class("app::IPool", "app::Pool", Args::new(), DependencyFlags::SINGLETON);
        reg.register_value("app::Answer", 1u8);

        assert_eq!(
            reg.class_bindings(),
            vec![(TypeKey::new("app::IPool"), TypeKey::new("app::Pool"))]
        );
    }
}
