//! Type-erased instances and constructor arguments.
//!
//! Everything the container hands out is an [`Instance`]: a shared,
//! type-erased value. Cloning an instance clones the handle, never the
//! value, so identity survives every trip through the container.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use crate::error::{ContainerError, Result};
use crate::key::TypeKey;

/// A shared, type-erased dependency instance.
///
/// # Examples
/// ```
/// use anbar_container::instance::Instance;
///
/// let a = Instance::new(String::from("hello"));
/// let b = a.clone();
/// assert!(a.ptr_eq(&b));
/// assert_eq!(*a.downcast::<String>().unwrap(), "hello");
/// ```
#[derive(Clone)]
pub struct Instance {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Instance {
    /// Wraps a value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Wraps an already shared value without copying it.
    ///
    /// The resulting instance is identity-equal to every other instance
    /// created from a clone of the same `Arc`.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            value,
            type_name: type_name::<T>(),
        }
    }

    /// Returns the value as `Arc<T>` if it holds a `T`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }

    /// Like [`downcast`](Self::downcast), but reports a [`ContainerError::TypeMismatch`]
    /// naming `key` on failure.
    pub fn downcast_for<T: Any + Send + Sync>(&self, key: &TypeKey) -> Result<Arc<T>> {
        self.downcast::<T>().ok_or_else(|| ContainerError::TypeMismatch {
            key: key.clone(),
            expected: type_name::<T>(),
            found: self.type_name,
        })
    }

    /// Returns `true` if the value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Identity comparison: both handles point at the same value.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.value), Arc::as_ptr(&other.value))
    }

    /// Identity comparison against a typed handle.
    pub fn is_same<T: Any + Send + Sync>(&self, other: &Arc<T>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.value), Arc::as_ptr(other))
    }

    /// Rust type name of the wrapped value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance<{}>@{:p}", self.type_name, Arc::as_ptr(&self.value))
    }
}

/// Ordered constructor arguments for the finish-construction step.
///
/// # Examples
/// ```
/// use anbar_container::instance::Args;
///
/// let args = Args::new().with(String::from("/var/www")).with(8080u16);
/// assert_eq!(args.len(), 2);
/// assert_eq!(args.cloned::<u16>(1).unwrap(), 8080);
/// assert!(args.get::<u16>(0).is_err());
/// ```
#[derive(Clone, Default, Debug)]
pub struct Args(Vec<Instance>);

impl Args {
    /// No arguments.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a value.
    pub fn with<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.0.push(Instance::new(value));
        self
    }

    /// Appends an existing instance, keeping its identity.
    pub fn with_instance(mut self, instance: Instance) -> Self {
        self.0.push(instance);
        self
    }

    /// Argument at `index` as `Arc<T>`.
    ///
    /// # Errors
    /// [`ContainerError::MissingArgument`] when the index is out of range or
    /// the argument is not a `T`.
    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>> {
        self.0
            .get(index)
            .and_then(Instance::downcast::<T>)
            .ok_or(ContainerError::MissingArgument {
                index,
                expected: type_name::<T>(),
            })
    }

    /// Argument at `index`, cloned out of its shared handle.
    pub fn cloned<T: Any + Send + Sync + Clone>(&self, index: usize) -> Result<T> {
        self.get::<T>(index).map(|value| (*value).clone())
    }

    /// Raw instance at `index`.
    pub fn instance(&self, index: usize) -> Option<&Instance> {
        self.0.get(index)
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Instance>> for Args {
    fn from(values: Vec<Instance>) -> Self {
        Self(values)
    }
}

impl FromIterator<Instance> for Args {
    fn from_iter<I: IntoIterator<Item = Instance>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Logger;

    #[test]
    fn clones_share_identity() {
        let a = Instance::new(Logger);
        let b = a.clone();
        let c = Instance::new(Logger);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn from_arc_keeps_identity() {
        let shared = Arc::new(Logger);
        let instance = Instance::from_arc(shared.clone());
        assert!(instance.is_same(&shared));
        let back = instance.downcast::<Logger>().unwrap();
        assert!(Arc::ptr_eq(&back, &shared));
    }

    #[test]
    fn downcast_for_reports_mismatch() {
        let instance = Instance::new(42u32);
        let err = instance.downcast_for::<String>(&TypeKey::new("app::Name")).unwrap_err();
        match err {
            ContainerError::TypeMismatch { key, expected, found } => {
                assert_eq!(key.as_str(), "app::Name");
                assert!(expected.contains("String"));
                assert_eq!(found, "u32");
            }
            other => panic!("Expected TypeMismatch, got: {other:?}"),
        }
    }

    #[test]
    fn args_by_position() {
        let args = Args::new().with(1u8).with(String::from("two"));
        assert_eq!(args.cloned::<u8>(0).unwrap(), 1);
        assert_eq!(args.cloned::<String>(1).unwrap(), "two");
        assert!(matches!(
            args.get::<u8>(5),
            Err(ContainerError::MissingArgument { index: 5, .. })
        ));
    }

    #[test]
    fn args_keep_instance_identity() {
        let logger = Instance::new(Logger);
        let args = Args::new().with_instance(logger.clone());
        assert!(args.instance(0).unwrap().ptr_eq(&logger));
    }
}
