//! Dependency descriptors — strategies that produce one instance.
//!
//! A [`Descriptor`] is created at registration time and never changes
//! afterwards. It knows *how* to produce an instance; the container decides
//! *when* (and whether to cache it) from the descriptor's flags.
//!
//! # Examples
//! ```rust,ignore
//! // Pre-built object, shared as-is
//! Descriptor::object(Instance::new(Config::load()));
//!
//! // Class to activate with constructor arguments, new instance each time
//! Descriptor::class_name("app::db::Pool", Args::new().with(16usize)).transient();
//!
//! // Callback that composes other dependencies
//! Descriptor::callback(|c, _| {
//!     let config = resolve_as::<Config>(c, &"app::Config".into())?;
//!     Ok(Instance::new(Mailer::new(&config)))
//! });
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::{ContainerError, Result};
use crate::flags::DependencyFlags;
use crate::instance::{Args, Instance};
use crate::key::TypeKey;
use crate::resolver::{Activator, DependencyContainer};

/// Callback producing an instance from the container and activator.
pub type CallbackFn =
    Arc<dyn Fn(&dyn DependencyContainer, &dyn Activator) -> Result<Instance> + Send + Sync>;

/// Produces one dependency instance.
///
/// Implement this for registration strategies beyond the built-in
/// [`Descriptor`] variants.
pub trait DependencyDescriptor: Send + Sync {
    /// Flags the registry records for this descriptor.
    fn flags(&self) -> DependencyFlags;

    /// Produce the instance registered under `key`.
    fn create_dependency(
        &self,
        key: &TypeKey,
        container: &dyn DependencyContainer,
        activator: &dyn Activator,
    ) -> Result<Instance>;

    /// The class this descriptor activates, when it is known up front.
    ///
    /// Used by graph validation; opaque strategies return `None`.
    fn activated_class(&self) -> Option<&TypeKey> {
        None
    }
}

/// How a [`Descriptor`] produces its instance.
#[derive(Clone)]
pub enum Source {
    /// A pre-built instance, returned unchanged on every call.
    Object(Instance),
    /// A class activated with the stored constructor arguments.
    ClassName { class: TypeKey, args: Args },
    /// A callback invoked with the current container and activator.
    Callback(CallbackFn),
}

/// The built-in descriptor: a [`Source`] plus flags.
#[derive(Clone)]
pub struct Descriptor {
    source: Source,
    flags: DependencyFlags,
}

impl Descriptor {
    /// Describes a pre-built object.
    pub fn object(instance: Instance) -> Self {
        Self::from_source(Source::Object(instance))
    }

    /// Describes a class activated with `args`.
    pub fn class_name(class: impl Into<TypeKey>, args: Args) -> Self {
        Self::from_source(Source::ClassName {
            class: class.into(),
            args,
        })
    }

    /// Describes a callback.
    pub fn callback(
        callback: impl Fn(&dyn DependencyContainer, &dyn Activator) -> Result<Instance>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self::from_source(Source::Callback(Arc::new(callback)))
    }

    fn from_source(source: Source) -> Self {
        Self {
            source,
            flags: DependencyFlags::default(),
        }
    }

    /// Replaces the flags.
    pub fn with_flags(mut self, flags: DependencyFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Shorthand for `with_flags(DependencyFlags::NONE)`.
    pub fn transient(self) -> Self {
        self.with_flags(DependencyFlags::NONE)
    }

    /// The production strategy.
    pub fn source(&self) -> &Source {
        &self.source
    }
}

impl DependencyDescriptor for Descriptor {
    fn flags(&self) -> DependencyFlags {
        self.flags
    }

    fn create_dependency(
        &self,
        key: &TypeKey,
        container: &dyn DependencyContainer,
        activator: &dyn Activator,
    ) -> Result<Instance> {
        match &self.source {
            Source::Object(instance) => Ok(instance.clone()),
            Source::ClassName { class, .. } if class.is_empty() => {
                Err(ContainerError::UnknownDescriptorVariant { key: key.clone() })
            }
            Source::ClassName { class, args } => activator.create_instance_args(class, args.clone()),
            Source::Callback(callback) => callback(container, activator),
        }
    }

    fn activated_class(&self) -> Option<&TypeKey> {
        match &self.source {
            Source::ClassName { class, .. } => Some(class),
            _ => None,
        }
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Descriptor");
        match &self.source {
            Source::Object(instance) => s.field("object", instance),
            Source::ClassName { class, args } => s.field("class", class).field("args", &args.len()),
            Source::Callback(_) => s.field("callback", &"<fn>"),
        };
        s.field("flags", &self.flags).finish()
    }
}
