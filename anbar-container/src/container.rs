//! # The Container
//!
//! Resolves keys through an ordered chain of factories, caches singletons,
//! and activates classes in two phases (allocate, inject, construct).
//!
//! # Architecture
//! ```text
//! ContainerBuilder ──build()──> Arc<Container>
//!                                   │
//!          resolve(key) ────────────┤
//!                                   ▼
//!   singleton cache ─miss─> [factory_first..] → registry → [factory..]
//!                                   │
//!                                   ▼
//!                    fallback: activate key as a class
//! ```
//!
//! # Examples
//! ```rust
//! use anbar_container::prelude::*;
//!
//! struct Config {
//!     url: String,
//! }
//!
//! let container = Container::builder()
//!     .object("app::Config", Config { url: "postgres://localhost".into() })
//!     .callback("app::Url", |c, _| {
//!         let config = resolve_as::<Config>(c, &TypeKey::new("app::Config"))?;
//!         Ok(Instance::new(config.url.clone()))
//!     })
//!     .build()
//!     .expect("container");
//!
//! let url = container.get::<String>("app::Url").expect("url");
//! assert_eq!(*url, "postgres://localhost");
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use anbar_support::rendering::suggest_similar;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use tracing::{debug, info, instrument, trace, warn};

use crate::class::{ClassCatalog, ClassRegistration, InjectTarget, Injectable, InjectionMode, build};
use crate::config::{BindingsConfig, ConfigFactory, ContainerSettings};
use crate::descriptor::{DependencyDescriptor, Descriptor};
use crate::error::{ContainerError, DependencyResolutionError, Result};
use crate::flags::DependencyFlags;
use crate::graph::GraphValidator;
use crate::injector::{DependencyInjector, StdInjector};
use crate::instance::{Args, Instance};
use crate::key::TypeKey;
use crate::provider::{Provider, ProviderRegistry};
use crate::registry::RegistryFactory;
use crate::resolution::{ResolutionFrame, current_requester, next_container_id};
use crate::resolver::{Activator, DependencyContainer, DependencyFactory, ResolverHandle};

/// Maximum number of "did you mean" suggestions per error.
const MAX_SUGGESTIONS: usize = 3;

// ============================================================
// ContainerBuilder
// ============================================================

/// Builds a [`Container`].
///
/// # Examples
/// ```rust,ignore
/// let container = Container::builder()
///     .object("app::Config", Config::load())
///     .bind("app::ILogger", "app::ConsoleLogger")
///     .class::<ConsoleLogger>()
///     .build()?;
/// ```
pub struct ContainerBuilder {
    settings: ContainerSettings,
    registry: RegistryFactory,
    leading: Vec<Arc<dyn DependencyFactory>>,
    trailing: Vec<Arc<dyn DependencyFactory>>,
    classes: ClassCatalog,
    injector: Option<Arc<dyn DependencyInjector>>,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self {
            settings: ContainerSettings::default(),
            registry: RegistryFactory::new(),
            leading: Vec::new(),
            trailing: Vec::new(),
            classes: ClassCatalog::new(),
            injector: None,
        }
    }

    /// Replaces the settings.
    pub fn settings(mut self, settings: ContainerSettings) -> Self {
        self.settings = settings;
        self
    }

    // ── Registry ──

    /// Binds `key` to any descriptor.
    pub fn register(self, key: impl Into<TypeKey>, descriptor: impl DependencyDescriptor + 'static) -> Self {
        self.registry.register(key, descriptor);
        self
    }

    /// Binds `key` to a pre-built value, shared by every resolution.
    pub fn object<T: Any + Send + Sync>(self, key: impl Into<TypeKey>, value: T) -> Self {
        self.registry.register_value(key, value);
        self
    }

    /// Binds `key` to an existing instance.
    pub fn instance(self, key: impl Into<TypeKey>, instance: Instance) -> Self {
        self.registry.register_object(key, instance, DependencyFlags::SINGLETON);
        self
    }

    /// Binds `key` to a class, activated once and cached.
    pub fn bind(self, key: impl Into<TypeKey>, class: impl Into<TypeKey>) -> Self {
        self.registry.register_class(key, class, Args::new(), DependencyFlags::SINGLETON);
        self
    }

    /// Binds `key` to a class with constructor arguments and explicit flags.
    pub fn bind_with(
        self,
        key: impl Into<TypeKey>,
        class: impl Into<TypeKey>,
        args: Args,
        flags: DependencyFlags,
    ) -> Self {
        self.registry.register_class(key, class, args, flags);
        self
    }

    /// Binds `key` to a callback whose result is cached.
    pub fn callback(
        self,
        key: impl Into<TypeKey>,
        callback: impl Fn(&dyn DependencyContainer, &dyn Activator) -> Result<Instance> + Send + Sync + 'static,
    ) -> Self {
        self.registry.register_callback(key, callback, DependencyFlags::SINGLETON);
        self
    }

    /// Binds `key` to a callback invoked on every resolution.
    pub fn transient_callback(
        self,
        key: impl Into<TypeKey>,
        callback: impl Fn(&dyn DependencyContainer, &dyn Activator) -> Result<Instance> + Send + Sync + 'static,
    ) -> Self {
        self.registry.register_callback(key, callback, DependencyFlags::NONE);
        self
    }

    // ── Factories ──

    /// Appends a factory after the registry.
    pub fn factory(mut self, factory: impl DependencyFactory + 'static) -> Self {
        self.trailing.push(Arc::new(factory));
        self
    }

    /// Adds a factory consulted before the registry.
    pub fn factory_first(mut self, factory: impl DependencyFactory + 'static) -> Self {
        self.leading.push(Arc::new(factory));
        self
    }

    /// Serves the bindings of a configuration document.
    pub fn bindings(self, config: &BindingsConfig) -> Self {
        self.factory(ConfigFactory::from_config(config))
    }

    // ── Classes ──

    /// Makes `T` available for activation by name.
    pub fn class<T: Injectable>(self) -> Self {
        self.classes.register::<T>();
        self
    }

    /// Replaces the default [`StdInjector`].
    pub fn injector(mut self, injector: impl DependencyInjector + 'static) -> Self {
        self.injector = Some(Arc::new(injector));
        self
    }

    // ── Provider modules ──

    /// Adds a [`Provider`] module.
    pub fn provider(mut self, provider: &dyn Provider) -> Self {
        debug!(provider = provider.name(), "Adding provider");
        provider.register(&mut self);
        self
    }

    // ── Build ──

    /// Builds the container.
    ///
    /// Discovers derived classes and validates the dependency graph when the
    /// settings ask for it.
    #[instrument(skip(self), name = "container_build")]
    pub fn build(self) -> Result<Arc<Container>> {
        info!(
            registered = self.registry.len(),
            factories = self.leading.len() + self.trailing.len(),
            "Building container"
        );

        if self.settings.discover_classes {
            self.classes.extend_discovered();
        }

        let registry = Arc::new(self.registry);
        let mut chain = self.leading;
        chain.push(registry.clone() as Arc<dyn DependencyFactory>);
        chain.extend(self.trailing);

        let injector = self.injector.unwrap_or_else(|| Arc::new(StdInjector::new()));
        let container = Container::assemble(self.settings, registry, chain, self.classes, injector);

        if container.settings.validate_on_build {
            container.validate()?;
        }

        info!(classes = container.classes.len(), "Container built successfully");
        Ok(container)
    }
}

impl ProviderRegistry for ContainerBuilder {
    fn register(&mut self, key: TypeKey, descriptor: Descriptor) {
        self.registry.register(key, descriptor);
    }

    fn add_factory(&mut self, factory: Arc<dyn DependencyFactory>) {
        self.trailing.push(factory);
    }

    fn add_class(&mut self, class: ClassRegistration) {
        self.classes.add(class);
    }
}

impl fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("registered", &self.registry.len())
            .field("factories", &(self.leading.len() + self.trailing.len()))
            .field("classes", &self.classes.len())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// Why a singleton slot was left empty.
enum Attempt {
    NotProduced,
    Failed(ContainerError),
}

/// Thread-safe dependency resolution and injection container.
///
/// Always lives behind an `Arc`, so on-demand fields can hold a weak
/// handle to it.
pub struct Container {
    id: usize,
    this: Weak<Container>,
    settings: ContainerSettings,
    registry: Arc<RegistryFactory>,
    factories: RwLock<Vec<Arc<dyn DependencyFactory>>>,
    singletons: DashMap<TypeKey, Arc<OnceCell<Instance>>>,
    classes: ClassCatalog,
    injector: Arc<dyn DependencyInjector>,
}

impl Container {
    /// Create a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// A container with default settings and an empty registry.
    pub fn new() -> Arc<Self> {
        Self::with_settings(ContainerSettings::default())
    }

    /// A container with an empty registry.
    pub fn with_settings(settings: ContainerSettings) -> Arc<Self> {
        let classes = ClassCatalog::new();
        if settings.discover_classes {
            classes.extend_discovered();
        }
        let registry = Arc::new(RegistryFactory::new());
        let chain: Vec<Arc<dyn DependencyFactory>> = vec![registry.clone()];
        Self::assemble(settings, registry, chain, classes, Arc::new(StdInjector::new()))
    }

    fn assemble(
        settings: ContainerSettings,
        registry: Arc<RegistryFactory>,
        factories: Vec<Arc<dyn DependencyFactory>>,
        classes: ClassCatalog,
        injector: Arc<dyn DependencyInjector>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            id: next_container_id(),
            this: this.clone(),
            settings,
            registry,
            factories: RwLock::new(factories),
            singletons: DashMap::new(),
            classes,
            injector,
        })
    }

    // ── Resolution ──

    /// Resolves `key` to an instance.
    ///
    /// # Errors
    /// [`ContainerError::DependencyResolution`] if no factory produces the
    /// key and it names no known class.
    pub fn resolve(&self, key: impl Into<TypeKey>) -> Result<Instance> {
        self.resolve_key(&key.into())
    }

    /// Resolves `key` and downcasts it.
    ///
    /// ```rust,ignore
    /// let logger: Arc<ConsoleLogger> = container.get("app::ILogger")?;
    /// ```
    pub fn get<T: Any + Send + Sync>(&self, key: impl Into<TypeKey>) -> Result<Arc<T>> {
        let key = key.into();
        self.resolve_key(&key)?.downcast_for::<T>(&key)
    }

    /// Resolves the class key of `T` and downcasts it.
    pub fn get_class<T: Injectable>(&self) -> Result<Arc<T>> {
        self.get::<T>(T::type_key())
    }

    fn resolve_key(&self, key: &TypeKey) -> Result<Instance> {
        if let Some(instance) = self.cached(key) {
            trace!(key = %key, "Resolved from singleton cache");
            return Ok(instance);
        }

        let frame = ResolutionFrame::enter(self.id, key, self.settings.max_depth)?;
        trace!(key = %key, "Resolving");

        // Snapshot so factories can be added while one of them runs.
        let factories: Vec<Arc<dyn DependencyFactory>> = self.factories.read().clone();
        for factory in &factories {
            let produced = match factory.dependency_flags(key) {
                Some(flags) if flags.is_singleton() => self.produce_singleton(factory.as_ref(), key)?,
                _ => factory.create_dependency(key, self, self)?,
            };
            if let Some(instance) = produced {
                return Ok(instance);
            }
        }

        if self.settings.fallback_construction && self.classes.contains(key) {
            debug!(key = %key, "No factory knows the key, constructing it as a class");
            return self.create_instance(key);
        }

        drop(frame);
        Err(self.unresolvable(key))
    }

    fn produce_singleton(&self, factory: &dyn DependencyFactory, key: &TypeKey) -> Result<Option<Instance>> {
        let cell = self.singletons.entry(key.clone()).or_default().clone();

        let outcome = cell.get_or_try_init(|| match factory.create_dependency(key, self, self) {
            Ok(Some(instance)) => {
                debug!(key = %key, factory = factory.name(), "Cached singleton");
                Ok(instance)
            }
            Ok(None) => Err(Attempt::NotProduced),
            Err(err) => Err(Attempt::Failed(err)),
        });

        match outcome {
            Ok(instance) => Ok(Some(instance.clone())),
            Err(Attempt::NotProduced) => Ok(None),
            Err(Attempt::Failed(err)) => Err(err),
        }
    }

    fn cached(&self, key: &TypeKey) -> Option<Instance> {
        self.singletons.get(key).and_then(|cell| cell.value().get().cloned())
    }

    fn unresolvable(&self, key: &TypeKey) -> ContainerError {
        let available = self.known_names();
        let available: Vec<&str> = available.iter().map(String::as_str).collect();
        ContainerError::DependencyResolution(DependencyResolutionError {
            key: key.clone(),
            required_by: current_requester(self.id),
            suggestions: suggest_similar(key.as_str(), &available, MAX_SUGGESTIONS),
        })
    }

    fn known_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .registry
            .registered_keys()
            .into_iter()
            .chain(self.classes.names())
            .map(|key| key.to_string())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    // ── Activation ──

    /// Allocates, injects and constructs `T` directly, without a catalog
    /// lookup or caching.
    pub fn create<T: Injectable>(&self, args: Args) -> Result<T> {
        debug!(class = T::CLASS, args = args.len(), "Creating instance");
        build::<T>(self.injector.as_ref(), self, &args)
    }

    // ── Registration ──

    /// Binds `key` to `descriptor`.
    ///
    /// A singleton already cached for `key` stays cached and keeps being
    /// returned.
    pub fn register(&self, key: impl Into<TypeKey>, descriptor: impl DependencyDescriptor + 'static) -> bool {
        let key = key.into();
        if self.is_cached(&key) {
            warn!(key = %key, "Re-registering a key whose singleton is already cached; the cached instance is kept");
        }
        self.registry.register(key, descriptor)
    }

    /// The registry factory at the head of the default chain.
    ///
    /// Registering through it directly skips the stale-singleton warning of
    /// [`register`](Self::register); a cached singleton still wins either way.
    pub fn registration(&self) -> &RegistryFactory {
        &self.registry
    }

    /// Appends a factory to the end of the chain.
    pub fn add_factory(&self, factory: Arc<dyn DependencyFactory>) {
        debug!(factory = factory.name(), "Added factory");
        self.factories.write().push(factory);
    }

    /// Inserts a factory at `index`; indexes past the end append.
    pub fn insert_factory(&self, index: usize, factory: Arc<dyn DependencyFactory>) {
        let mut factories = self.factories.write();
        let index = index.min(factories.len());
        debug!(factory = factory.name(), index, "Inserted factory");
        factories.insert(index, factory);
    }

    /// Names of the factories in resolution order.
    pub fn factory_names(&self) -> Vec<String> {
        self.factories.read().iter().map(|f| f.name().to_string()).collect()
    }

    /// The classes this container can activate by name.
    pub fn classes(&self) -> &ClassCatalog {
        &self.classes
    }

    /// The settings the container was built with.
    pub fn settings(&self) -> &ContainerSettings {
        &self.settings
    }

    /// Returns `true` if a singleton is cached for `key`.
    pub fn is_cached(&self, key: &TypeKey) -> bool {
        self.cached(key).is_some()
    }

    /// A weak handle to this container.
    pub fn handle(&self) -> ResolverHandle {
        ResolverHandle::from_weak(self.this.clone() as Weak<dyn DependencyContainer>)
    }

    // ── Validation ──

    /// Checks the eager dependency graph for cycles and missing keys
    /// without constructing anything.
    ///
    /// Catalog classes count as producible, as they are under fallback
    /// construction. A class binding must name a catalog class. Any key a
    /// factory reports flags for is treated as producible, so a convention
    /// factory whose rule maps every key hides missing targets.
    #[instrument(skip(self), name = "container_validate")]
    pub fn validate(&self) -> Result<()> {
        let mut bindings = self.registry.class_bindings();
        bindings.sort();
        if let Some((key, class)) = bindings.iter().find(|(_, class)| !self.classes.contains(class)) {
            let available = self.known_names();
            let available: Vec<&str> = available.iter().map(String::as_str).collect();
            return Err(ContainerError::DependencyResolution(DependencyResolutionError {
                key: class.clone(),
                required_by: Some(key.clone()),
                suggestions: suggest_similar(class.as_str(), &available, MAX_SUGGESTIONS),
            }));
        }

        let mut edges: HashMap<TypeKey, Vec<TypeKey>> = HashMap::new();

        for name in self.classes.names() {
            let Some(entry) = self.classes.get(&name) else {
                continue;
            };
            let eager = StdInjector::qualified_targets(&(entry.describe)())
                .into_iter()
                .filter(|(_, _, _, mode)| *mode == InjectionMode::Eager)
                .filter_map(|(_, _, target, _)| target)
                .collect();
            edges.insert(name, eager);
        }

        for (key, class) in bindings {
            if key != class {
                edges.insert(key, vec![class]);
            }
        }

        let factories = self.factories.read().clone();
        let is_known = |key: &TypeKey| factories.iter().any(|f| f.dependency_flags(key).is_some());

        GraphValidator::new(edges, &is_known, self.known_names()).validate()
    }
}

impl DependencyContainer for Container {
    fn resolve(&self, key: &TypeKey) -> Result<Instance> {
        self.resolve_key(key)
    }

    fn handle(&self) -> ResolverHandle {
        Container::handle(self)
    }
}

impl Activator for Container {
    fn create_instance_args(&self, class: &TypeKey, args: Args) -> Result<Instance> {
        let entry = self
            .classes
            .get(class)
            .ok_or_else(|| ContainerError::UnknownClass { class: class.clone() })?;
        debug!(class = %class, args = args.len(), "Activating class");
        (entry.activate)(self.injector.as_ref(), self, args)
    }

    fn inject_into(&self, target: &mut dyn InjectTarget) -> Result<()> {
        self.injector.inject_into(target, self)
    }

    fn class_exists(&self, class: &TypeKey) -> bool {
        self.classes.contains(class)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("registered", &self.registry.len())
            .field("factories", &self.factories.read().len())
            .field("cached", &self.singletons.iter().filter(|c| c.value().get().is_some()).count())
            .field("classes", &self.classes.len())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Container, ContainerBuilder};
    pub use crate::class::{ClassCatalog, ClassRegistration, ClassSpec, InjectTarget, Injectable, InjectionMode};
    pub use crate::config::{BindingsConfig, ContainerSettings};
    pub use crate::descriptor::{DependencyDescriptor, Descriptor};
    pub use crate::error::{ContainerError, Result};
    pub use crate::flags::DependencyFlags;
    pub use crate::injector::{Dependencies, Inject};
    pub use crate::instance::{Args, Instance};
    pub use crate::key::TypeKey;
    pub use crate::on_demand::OnDemand;
    pub use crate::provider::{Provider, ProviderRegistry};
    pub use crate::resolver::{Activator, DependencyContainer, DependencyFactory, resolve_as};
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
