//! Classes: static injection specs and the catalog of instantiable types.
//!
//! Rust has no runtime reflection, so every injectable type describes
//! itself through [`Injectable`]: its fully-qualified class name, its
//! ancestor (an embedded base class), and the fields it wants injected.
//! `#[derive(Injectable)]` writes this impl; it can also be written by hand.
//!
//! Construction is two-phase. [`Injectable::allocate`] builds the object
//! with placeholder fields, the injector fills the declared fields, and
//! only then [`Injectable::construct`] finishes construction with the
//! caller's arguments. Construction code can therefore rely on injected
//! collaborators.
//!
//! # Examples
//! ```
//! use anbar_container::prelude::*;
//!
//! struct Logger;
//!
//! struct Service {
//!     logger: Inject<Logger>,
//!     greeting: String,
//! }
//!
//! impl Injectable for Service {
//!     const CLASS: &'static str = "app::Service";
//!
//!     fn describe() -> ClassSpec {
//!         ClassSpec::new(Self::CLASS).eager("logger", "Logger")
//!     }
//!
//!     fn allocate() -> Self {
//!         Service { logger: Inject::declared(Self::CLASS, "logger"), greeting: String::new() }
//!     }
//!
//!     fn populate(&mut self, deps: &mut Dependencies) -> Result<()> {
//!         deps.fill(Self::CLASS, "logger", &mut self.logger)
//!     }
//!
//!     fn construct(&mut self, args: &Args) -> Result<()> {
//!         self.logger.get()?; // already injected
//!         self.greeting = args.cloned::<String>(0)?;
//!         Ok(())
//!     }
//! }
//! ```

use std::any::TypeId;
use std::fmt;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, warn};

use crate::error::Result;
use crate::injector::{Dependencies, DependencyInjector};
use crate::instance::{Args, Instance};
use crate::key::{SEPARATOR, TypeKey, namespace_of};
use crate::resolver::DependencyContainer;

/// When a declared dependency is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InjectionMode {
    /// Resolved during injection, before construction finishes.
    Eager,
    /// Resolved on first read of the field, then memoized.
    OnDemand,
}

impl InjectionMode {
    /// Interprets an `inject` annotation value.
    ///
    /// A bare marker (`None`) or `"eager"` means eager; `"on-demand"`,
    /// `"onDemand"` and `"on_demand"` mean on-demand. Anything else is not
    /// an injection mode and yields `None`.
    pub fn from_annotation(value: Option<&str>) -> Option<Self> {
        match value.map(str::trim) {
            None | Some("") | Some("eager") => Some(Self::Eager),
            Some("on-demand" | "onDemand" | "on_demand") => Some(Self::OnDemand),
            Some(_) => None,
        }
    }
}

impl fmt::Display for InjectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eager => write!(f, "eager"),
            Self::OnDemand => write!(f, "on-demand"),
        }
    }
}

/// One declared dependency field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionPoint {
    /// Field name, unique within the declaring class.
    pub field: &'static str,
    /// Target type as written in the declaration, relative to the declaring
    /// class's namespace unless it starts with `::`. `None` means the type
    /// could not be determined; such fields are skipped.
    pub target: Option<&'static str>,
    /// When to resolve.
    pub mode: InjectionMode,
}

/// Static injection spec of one class.
#[derive(Debug, Clone)]
pub struct ClassSpec {
    /// Fully-qualified class name.
    pub name: &'static str,
    /// Spec of the embedded base class, if any.
    pub parent: Option<fn() -> ClassSpec>,
    /// Fields declared by this class itself.
    pub points: Vec<InjectionPoint>,
}

impl ClassSpec {
    /// Spec for `name` with no fields and no parent.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            parent: None,
            points: Vec::new(),
        }
    }

    /// Declares an eagerly injected field.
    pub fn eager(self, field: &'static str, target: &'static str) -> Self {
        self.point(field, Some(target), InjectionMode::Eager)
    }

    /// Declares an on-demand field.
    pub fn on_demand(self, field: &'static str, target: &'static str) -> Self {
        self.point(field, Some(target), InjectionMode::OnDemand)
    }

    /// Declares a field whose target type is unknown.
    pub fn untyped(self, field: &'static str, mode: InjectionMode) -> Self {
        self.point(field, None, mode)
    }

    /// Declares a field from raw annotation values.
    ///
    /// Unrecognised modes leave the spec unchanged.
    pub fn annotated(self, field: &'static str, target: Option<&'static str>, mode: Option<&str>) -> Self {
        match InjectionMode::from_annotation(mode) {
            Some(mode) => self.point(field, target, mode),
            None => self,
        }
    }

    /// Declares a field.
    pub fn point(mut self, field: &'static str, target: Option<&'static str>, mode: InjectionMode) -> Self {
        self.points.push(InjectionPoint { field, target, mode });
        self
    }

    /// Sets the base class.
    pub fn extends(mut self, parent: fn() -> ClassSpec) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Namespace the class was declared in, without a leading `::`.
    pub fn namespace(&self) -> &'static str {
        namespace_of(self.name.strip_prefix(SEPARATOR).unwrap_or(self.name))
    }

    /// This spec followed by every ancestor spec, nearest first.
    pub fn lineage(&self) -> Vec<ClassSpec> {
        let mut lineage = vec![self.clone()];
        let mut next = self.parent;
        while let Some(parent) = next {
            let spec = parent();
            next = spec.parent;
            lineage.push(spec);
        }
        lineage
    }
}

/// A type the container can allocate, inject and construct.
pub trait Injectable: Send + Sync + Sized + 'static {
    /// Fully-qualified class name, e.g. `app::services::Mailer`.
    const CLASS: &'static str;

    /// The static injection spec.
    fn describe() -> ClassSpec;

    /// First phase: an object whose dependency fields are still unset.
    fn allocate() -> Self;

    /// Moves injected values from `deps` into the declared fields.
    fn populate(&mut self, deps: &mut Dependencies) -> Result<()>;

    /// Second phase: finish construction with the caller's arguments.
    fn construct(&mut self, _args: &Args) -> Result<()> {
        Ok(())
    }

    /// Key naming this class.
    fn type_key() -> TypeKey {
        TypeKey::from_static(Self::CLASS)
    }
}

/// Object-safe view of an injectable object, used by injectors.
pub trait InjectTarget {
    /// Identity of the concrete type, for spec caching.
    fn target_type(&self) -> TypeId;

    /// The static injection spec of the concrete type.
    fn target_spec(&self) -> ClassSpec;

    /// Accepts injected values.
    fn accept(&mut self, deps: &mut Dependencies) -> Result<()>;
}

impl<T: Injectable> InjectTarget for T {
    fn target_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn target_spec(&self) -> ClassSpec {
        T::describe()
    }

    fn accept(&mut self, deps: &mut Dependencies) -> Result<()> {
        self.populate(deps)
    }
}

/// Runs both construction phases for `T`.
pub fn build<T: Injectable>(
    injector: &dyn DependencyInjector,
    container: &dyn DependencyContainer,
    args: &Args,
) -> Result<T> {
    let mut object = T::allocate();
    injector.inject_into(&mut object, container)?;
    object.construct(args)?;
    Ok(object)
}

fn activate<T: Injectable>(
    injector: &dyn DependencyInjector,
    container: &dyn DependencyContainer,
    args: Args,
) -> Result<Instance> {
    build::<T>(injector, container, &args).map(Instance::new)
}

/// Type-erased activation entry point of a class.
pub type ActivateFn = fn(&dyn DependencyInjector, &dyn DependencyContainer, Args) -> Result<Instance>;

/// Catalog entry for one class.
///
/// `#[derive(Injectable)]` submits one of these through `inventory`;
/// [`ClassCatalog::discover`] collects them.
#[derive(Clone, Copy)]
pub struct ClassRegistration {
    /// Fully-qualified class name.
    pub name: &'static str,
    /// The class's static injection spec.
    pub describe: fn() -> ClassSpec,
    /// Allocate, inject, construct.
    pub activate: ActivateFn,
    /// Identity of the Rust type behind the name.
    pub type_id: fn() -> TypeId,
}

impl ClassRegistration {
    /// Registration for `T`.
    pub const fn of<T: Injectable>() -> Self {
        Self {
            name: T::CLASS,
            describe: T::describe,
            activate: activate::<T>,
            type_id: TypeId::of::<T>,
        }
    }
}

impl fmt::Debug for ClassRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassRegistration").field("name", &self.name).finish()
    }
}

inventory::collect!(ClassRegistration);

/// The set of classes a container can instantiate by name.
#[derive(Default)]
pub struct ClassCatalog {
    classes: DashMap<TypeKey, ClassRegistration>,
}

impl ClassCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog holding every class submitted through `inventory`.
    pub fn discover() -> Self {
        let catalog = Self::new();
        catalog.extend_discovered();
        catalog
    }

    /// Adds every class submitted through `inventory`. Returns how many
    /// were added.
    pub fn extend_discovered(&self) -> usize {
        let mut added = 0;
        for registration in inventory::iter::<ClassRegistration> {
            if self.add(*registration) {
                added += 1;
            }
        }
        debug!(added, "Discovered classes");
        added
    }

    /// Adds `T`.
    pub fn register<T: Injectable>(&self) -> bool {
        self.add(ClassRegistration::of::<T>())
    }

    /// Adds a registration. Returns `false` if the name was already known,
    /// in which case the first registration is kept.
    pub fn add(&self, registration: ClassRegistration) -> bool {
        match self.classes.entry(TypeKey::from_static(registration.name)) {
            Entry::Occupied(existing) => {
                if (existing.get().type_id)() != (registration.type_id)() {
                    warn!(class = registration.name, "Two types share a class name; keeping the first one registered");
                }
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(registration);
                true
            }
        }
    }

    /// Looks up a class by name.
    pub fn get(&self, class: &TypeKey) -> Option<ClassRegistration> {
        self.classes.get(class).map(|entry| *entry)
    }

    /// Returns `true` if `class` is known.
    pub fn contains(&self, class: &TypeKey) -> bool {
        self.classes.contains_key(class)
    }

    /// Number of known classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if no class is known.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Names of all known classes, sorted.
    pub fn names(&self) -> Vec<TypeKey> {
        let mut names: Vec<_> = self.classes.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }
}

impl fmt::Debug for ClassCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassCatalog").field("classes", &self.len()).finish()
    }
}
