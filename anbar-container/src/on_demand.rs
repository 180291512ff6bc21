//! Lazily resolved dependency fields.
//!
//! An [`OnDemand`] field is bound at injection time but resolved only when
//! it is first read. After that it behaves like an ordinary field holding
//! the resolved instance.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::trace;

use crate::error::{ContainerError, Result};
use crate::injector::{InjectSlot, Injection, PendingBinding};
use crate::key::TypeKey;

/// Slot for a dependency resolved on first read.
///
/// ```
/// use anbar_container::prelude::*;
///
/// let slot: OnDemand<String> = OnDemand::declared("app::Controller", "views");
/// assert!(matches!(slot.get(), Err(ContainerError::UndefinedProperty { .. })));
/// ```
pub struct OnDemand<T> {
    class: &'static str,
    field: &'static str,
    pending: Option<PendingBinding>,
    value: OnceCell<Arc<T>>,
}

impl<T: Any + Send + Sync> OnDemand<T> {
    /// An unbound slot for `field` of `class`.
    pub fn declared(class: &'static str, field: &'static str) -> Self {
        Self {
            class,
            field,
            pending: None,
            value: OnceCell::new(),
        }
    }

    /// The dependency, resolved on the first call.
    ///
    /// Later calls return the same instance without consulting the
    /// container. Concurrent first reads resolve once.
    ///
    /// # Errors
    /// [`ContainerError::UndefinedProperty`] if the field was never bound,
    /// or the resolution error of the bound key. A failed read leaves the
    /// binding in place.
    pub fn get(&self) -> Result<Arc<T>> {
        self.value
            .get_or_try_init(|| {
                let binding = self
                    .pending
                    .as_ref()
                    .ok_or_else(|| ContainerError::undefined_property(self.field, self.class))?;
                trace!(class = self.class, field = self.field, key = %binding.key(), "Resolving on demand");
                binding.resolve()?.downcast_for::<T>(binding.key())
            })
            .cloned()
    }

    /// Returns `true` while the field is bound but not yet read.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some() && self.value.get().is_none()
    }

    /// Returns `true` once the field holds a value.
    pub fn is_resolved(&self) -> bool {
        self.value.get().is_some()
    }

    /// The key this field will resolve, while it is pending.
    pub fn pending_key(&self) -> Option<&TypeKey> {
        if self.is_resolved() {
            return None;
        }
        self.pending.as_ref().map(PendingBinding::key)
    }
}

impl<T: Any + Send + Sync> InjectSlot for OnDemand<T> {
    fn receive(&mut self, injection: Injection) -> Result<()> {
        match injection {
            Injection::Pending(binding) => {
                // Rebinding discards any value from an earlier injection.
                self.pending = Some(binding);
                self.value = OnceCell::new();
            }
            Injection::Resolved { key, instance } => {
                self.pending = None;
                self.value = OnceCell::with_value(instance.downcast_for::<T>(&key)?);
            }
        }
        Ok(())
    }
}

impl<T> fmt::Debug for OnDemand<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnDemand")
            .field("field", &self.field)
            .field("pending", &self.pending.as_ref().map(|b| b.key().as_str()))
            .field("resolved", &self.value.get().is_some())
            .finish()
    }
}
