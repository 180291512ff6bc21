//! Provider trait: a module of related registrations.
//!
//! Providers group the registrations of one area of an application so
//! start-up code can add them as a unit.
//!
//! # Examples
//! ```rust,ignore
//! struct MailProvider;
//!
//! impl Provider for MailProvider {
//!     fn register(&self, registry: &mut dyn ProviderRegistry) {
//!         registry.register("app::ITransport".into(), Descriptor::class_name("app::Smtp", Args::new()));
//!         registry.add_class(ClassRegistration::of::<Mailer>());
//!     }
//! }
//!
//! let container = Container::builder().provider(&MailProvider).build()?;
//! ```

use std::sync::Arc;

use crate::class::ClassRegistration;
use crate::descriptor::Descriptor;
use crate::key::TypeKey;
use crate::resolver::DependencyFactory;

/// A module that registers related dependencies into a container.
pub trait Provider: Send + Sync {
    /// Register dependencies. Called once while the container is built.
    fn register(&self, registry: &mut dyn ProviderRegistry);

    /// Human-readable name for diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// The registration surface providers see.
///
/// A subset of the builder's API, so providers can be tested against a
/// mock.
pub trait ProviderRegistry {
    /// Bind `key` to `descriptor`.
    fn register(&mut self, key: TypeKey, descriptor: Descriptor);

    /// Append a factory to the resolution chain.
    fn add_factory(&mut self, factory: Arc<dyn DependencyFactory>);

    /// Make a class available for activation by name.
    fn add_class(&mut self, class: ClassRegistration);
}
