//! Core container implementation for Anbar.
//!
//! Keys are resolved through an ordered chain of factories, singletons are
//! cached per container, and classes are activated in two phases with their
//! declared dependencies injected in between.

pub mod class;
pub mod config;
pub mod container;
pub mod convention;
pub mod descriptor;
pub mod error;
pub mod flags;
mod graph;
pub mod injector;
pub mod instance;
pub mod key;
pub mod on_demand;
pub mod provider;
pub mod registry;
mod resolution;
pub mod resolver;

pub use class::{ClassCatalog, ClassRegistration, ClassSpec, InjectTarget, Injectable, InjectionMode, InjectionPoint};
pub use config::{AnbarConfig, BindingsConfig, ClassBinding, ConfigFactory, ContainerSettings};
pub use container::{Container, ContainerBuilder, prelude};
pub use convention::ConventionFactory;
pub use descriptor::{DependencyDescriptor, Descriptor, Source};
pub use error::{CircularDependencyError, ContainerError, DependencyResolutionError, Result};
pub use flags::DependencyFlags;
pub use injector::{Dependencies, DependencyInjector, Inject, InjectSlot, Injection, PendingBinding, StdInjector};
pub use instance::{Args, Instance};
pub use key::TypeKey;
pub use on_demand::OnDemand;
pub use provider::{Provider, ProviderRegistry};
pub use registry::RegistryFactory;
pub use resolver::{Activator, DependencyContainer, DependencyFactory, ResolverHandle, resolve_as};
