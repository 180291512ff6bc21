//! Container settings and configuration-driven bindings.
//!
//! Both types deserialize with serde, so they can live in whatever
//! configuration format the application already loads.
//!
//! ```json
//! {
//!   "settings": { "fallback_construction": false, "max_depth": 64 },
//!   "bindings": [
//!     { "key": "app::IMailer", "class": "app::SmtpMailer" },
//!     { "key": "app::IClock", "class": "app::SystemClock", "singleton": false }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::Result;
use crate::flags::DependencyFlags;
use crate::instance::Instance;
use crate::key::TypeKey;
use crate::resolver::{Activator, DependencyContainer, DependencyFactory};

/// Runtime behaviour switches of a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerSettings {
    /// Construct an unregistered key directly when it names a known class.
    pub fallback_construction: bool,
    /// Load every class submitted through `#[derive(Injectable)]` on build.
    pub discover_classes: bool,
    /// Run graph validation as part of `build()`.
    pub validate_on_build: bool,
    /// Maximum nesting of resolutions on one thread.
    pub max_depth: usize,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            fallback_construction: true,
            discover_classes: true,
            validate_on_build: false,
            max_depth: 128,
        }
    }
}

/// One configured key → class binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassBinding {
    pub key: String,
    pub class: String,
    #[serde(default = "default_singleton")]
    pub singleton: bool,
}

fn default_singleton() -> bool {
    true
}

/// A list of configured bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingsConfig {
    #[serde(default)]
    pub bindings: Vec<ClassBinding>,
}

/// Settings and bindings loaded together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnbarConfig {
    #[serde(default)]
    pub settings: ContainerSettings,
    #[serde(flatten)]
    pub bindings: BindingsConfig,
}

/// Factory serving the bindings of a [`BindingsConfig`].
///
/// Each configured key is activated from its class through the container's
/// activator. Later entries for the same key win.
pub struct ConfigFactory {
    bindings: HashMap<TypeKey, (TypeKey, DependencyFlags)>,
}

impl ConfigFactory {
    /// Builds the factory from configuration.
    pub fn from_config(config: &BindingsConfig) -> Self {
        let bindings = config
            .bindings
            .iter()
            .map(|binding| {
                let flags = if binding.singleton {
                    DependencyFlags::SINGLETON
                } else {
                    DependencyFlags::NONE
                };
                (
                    TypeKey::new(binding.key.clone()),
                    (TypeKey::new(binding.class.clone()), flags),
                )
            })
            .collect::<HashMap<_, _>>();
        debug!(bindings = bindings.len(), "Loaded configured bindings");
        Self { bindings }
    }

    /// Number of configured keys.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` if no binding is configured.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl DependencyFactory for ConfigFactory {
    fn create_dependency(
        &self,
        key: &TypeKey,
        _container: &dyn DependencyContainer,
        activator: &dyn Activator,
    ) -> Result<Option<Instance>> {
        let Some((class, _)) = self.bindings.get(key) else {
            return Ok(None);
        };
        trace!(key = %key, class = %class, "Activating configured class");
        activator.create_instance(class).map(Some)
    }

    fn dependency_flags(&self, key: &TypeKey) -> Option<DependencyFlags> {
        self.bindings.get(key).map(|(_, flags)| *flags)
    }

    fn name(&self) -> &str {
        "config"
    }
}

impl fmt::Debug for ConfigFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigFactory")
            .field("bindings", &self.bindings.len())
            .finish()
    }
}
