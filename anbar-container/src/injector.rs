//! Metadata-driven field injection.
//!
//! The injector reads a class's static spec (including every ancestor),
//! resolves eager fields right away and hands on-demand fields a pending
//! binding. The values travel to the object in a [`Dependencies`] bag;
//! the object's [`Injectable::populate`](crate::class::Injectable::populate)
//! moves them into its field slots.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::class::{ClassSpec, InjectTarget, InjectionMode};
use crate::error::{ContainerError, Result};
use crate::instance::Instance;
use crate::key::TypeKey;
use crate::resolver::{DependencyContainer, ResolverHandle};

/// A key bound to a resolver, waiting for its first read.
#[derive(Clone, Debug)]
pub struct PendingBinding {
    key: TypeKey,
    resolver: ResolverHandle,
}

impl PendingBinding {
    /// Binds `key` to `resolver`.
    pub fn new(key: TypeKey, resolver: ResolverHandle) -> Self {
        Self { key, resolver }
    }

    /// The key resolved on first read.
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    /// Resolves the key now.
    pub fn resolve(&self) -> Result<Instance> {
        self.resolver.resolve(&self.key)
    }
}

/// What the injector hands to one field.
#[derive(Clone, Debug)]
pub enum Injection {
    /// An eagerly resolved instance.
    Resolved { key: TypeKey, instance: Instance },
    /// A binding resolved on first read.
    Pending(PendingBinding),
}

/// A field that can receive an [`Injection`].
pub trait InjectSlot {
    /// Stores the injection.
    fn receive(&mut self, injection: Injection) -> Result<()>;
}

/// Injected values for one object, addressed by (declaring class, field).
#[derive(Default, Debug)]
pub struct Dependencies {
    injections: HashMap<(&'static str, &'static str), Injection>,
}

impl Dependencies {
    /// An empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the injection for `field` declared by `class`.
    pub fn insert(&mut self, class: &'static str, field: &'static str, injection: Injection) {
        self.injections.insert((class, field), injection);
    }

    /// Removes and returns the injection for `field` declared by `class`.
    pub fn take(&mut self, class: &'static str, field: &'static str) -> Option<Injection> {
        self.injections.remove(&(class, field))
    }

    /// Moves the injection for `field` (if any) into `slot`.
    ///
    /// Fields without an injection are left untouched.
    pub fn fill(&mut self, class: &'static str, field: &'static str, slot: &mut impl InjectSlot) -> Result<()> {
        match self.take(class, field) {
            Some(injection) => slot.receive(injection),
            None => Ok(()),
        }
    }

    /// Fields bound on demand and their keys.
    pub fn pending(&self) -> Vec<(&'static str, &TypeKey)> {
        let mut pending: Vec<_> = self
            .injections
            .iter()
            .filter_map(|(&(_, field), injection)| match injection {
                Injection::Pending(binding) => Some((field, binding.key())),
                Injection::Resolved { .. } => None,
            })
            .collect();
        pending.sort();
        pending
    }

    /// Number of injections still held.
    pub fn len(&self) -> usize {
        self.injections.len()
    }

    /// Returns `true` if every injection has been taken.
    pub fn is_empty(&self) -> bool {
        self.injections.is_empty()
    }
}

/// Slot for an eagerly injected dependency.
///
/// Reading a slot that was never injected is an error, never a silent
/// default.
pub struct Inject<T> {
    class: &'static str,
    field: &'static str,
    value: Option<Arc<T>>,
}

impl<T: Any + Send + Sync> Inject<T> {
    /// An unset slot for `field` of `class`.
    pub fn declared(class: &'static str, field: &'static str) -> Self {
        Self {
            class,
            field,
            value: None,
        }
    }

    /// The injected value.
    ///
    /// # Errors
    /// [`ContainerError::UndefinedProperty`] if nothing was injected.
    pub fn get(&self) -> Result<&Arc<T>> {
        self.value
            .as_ref()
            .ok_or_else(|| ContainerError::undefined_property(self.field, self.class))
    }

    /// Returns `true` once a value has been injected.
    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Stores `value` directly.
    pub fn set(&mut self, value: Arc<T>) {
        self.value = Some(value);
    }
}

impl<T: Any + Send + Sync> InjectSlot for Inject<T> {
    fn receive(&mut self, injection: Injection) -> Result<()> {
        match injection {
            Injection::Resolved { key, instance } => {
                self.value = Some(instance.downcast_for::<T>(&key)?);
                Ok(())
            }
            Injection::Pending(_) => Err(ContainerError::EagerSlotOnDemand {
                field: self.field.to_string(),
                class: self.class.to_string(),
            }),
        }
    }
}

impl<T> fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inject")
            .field("field", &self.field)
            .field("set", &self.value.is_some())
            .finish()
    }
}

/// Populates the declared dependencies of objects.
pub trait DependencyInjector: Send + Sync {
    /// Injects every declared field of `target`, resolving through `container`.
    fn inject_into(&self, target: &mut dyn InjectTarget, container: &dyn DependencyContainer) -> Result<()>;
}

/// A declared field with its namespace-qualified target.
#[derive(Debug, Clone)]
struct ResolvedPoint {
    class: &'static str,
    field: &'static str,
    target: Option<TypeKey>,
    mode: InjectionMode,
}

/// The standard injector.
///
/// Walks the class and its ancestors, qualifying each target against the
/// namespace of the class that declares the field. The flattened result is
/// cached per type.
#[derive(Default)]
pub struct StdInjector {
    specs: DashMap<TypeId, Arc<[ResolvedPoint]>>,
}

impl StdInjector {
    /// A new injector with an empty spec cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The namespace-qualified targets of `spec`, ancestors included, as
    /// (declaring class, field, target, mode).
    pub fn qualified_targets(spec: &ClassSpec) -> Vec<(&'static str, &'static str, Option<TypeKey>, InjectionMode)> {
        Self::flatten(spec)
            .into_iter()
            .map(|p| (p.class, p.field, p.target, p.mode))
            .collect()
    }

    fn flatten(spec: &ClassSpec) -> Vec<ResolvedPoint> {
        spec.lineage()
            .iter()
            .flat_map(|declaring| {
                let namespace = declaring.namespace();
                declaring.points.iter().map(move |point| ResolvedPoint {
                    class: declaring.name,
                    field: point.field,
                    target: point.target.map(|t| TypeKey::qualify(t, namespace)),
                    mode: point.mode,
                })
            })
            .collect()
    }

    fn points_for(&self, target: &dyn InjectTarget) -> Arc<[ResolvedPoint]> {
        let type_id = target.target_type();
        if let Some(points) = self.specs.get(&type_id) {
            return points.clone();
        }
        let points: Arc<[ResolvedPoint]> = Self::flatten(&target.target_spec()).into();
        self.specs.insert(type_id, points.clone());
        points
    }
}

impl DependencyInjector for StdInjector {
    fn inject_into(&self, target: &mut dyn InjectTarget, container: &dyn DependencyContainer) -> Result<()> {
        let points = self.points_for(target);
        let mut deps = Dependencies::new();

        for point in points.iter() {
            let Some(key) = &point.target else {
                debug!(class = point.class, field = point.field, "No target type declared, skipping field");
                continue;
            };

            let injection = match point.mode {
                InjectionMode::Eager => {
                    trace!(class = point.class, field = point.field, key = %key, "Injecting");
                    Injection::Resolved {
                        key: key.clone(),
                        instance: container.resolve(key)?,
                    }
                }
                InjectionMode::OnDemand => {
                    trace!(class = point.class, field = point.field, key = %key, "Binding on demand");
                    Injection::Pending(PendingBinding::new(key.clone(), container.handle()))
                }
            };
            deps.insert(point.class, point.field, injection);
        }

        target.accept(&mut deps)
    }
}

impl fmt::Debug for StdInjector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdInjector")
            .field("cached_specs", &self.specs.len())
            .finish()
    }
}
