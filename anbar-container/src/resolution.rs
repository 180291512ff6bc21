//! Runtime cycle detection.
//!
//! Every resolution pushes a frame onto a thread-local stack tagged with the
//! resolving container's id. Re-entering a key that is already on the stack
//! for the same container is a cycle; a stack deeper than the configured
//! limit is reported as well. Frames pop when their guard drops, so errors
//! and panics unwind the stack correctly.

use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::warn;

use crate::error::{CircularDependencyError, ContainerError, Result};
use crate::key::TypeKey;

thread_local! {
    static STACK: RefCell<Vec<(usize, TypeKey)>> = const { RefCell::new(Vec::new()) };
}

static NEXT_ID: AtomicUsize = AtomicUsize::new(1);

/// A fresh id distinguishing one container's frames from another's.
pub(crate) fn next_container_id() -> usize {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// The key currently being resolved by `container` on this thread.
pub(crate) fn current_requester(container: usize) -> Option<TypeKey> {
    STACK.with(|stack| {
        stack
            .borrow()
            .iter()
            .rev()
            .find(|(owner, _)| *owner == container)
            .map(|(_, key)| key.clone())
    })
}

/// Guard for one in-flight resolution.
#[must_use]
pub(crate) struct ResolutionFrame {
    container: usize,
}

impl ResolutionFrame {
    /// Pushes `key` for `container`.
    ///
    /// # Errors
    /// [`ContainerError::CircularDependency`] if `key` is already being
    /// resolved by `container` on this thread, or
    /// [`ContainerError::DepthExceeded`] if `max_depth` frames are already open.
    pub(crate) fn enter(container: usize, key: &TypeKey, max_depth: usize) -> Result<Self> {
        STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            let open: Vec<&TypeKey> = stack
                .iter()
                .filter(|(owner, _)| *owner == container)
                .map(|(_, k)| k)
                .collect();

            if let Some(start) = open.iter().position(|k| *k == key) {
                let mut chain: Vec<TypeKey> = open[start..].iter().map(|k| (*k).clone()).collect();
                chain.push(key.clone());
                warn!(cycle = ?chain, "Circular dependency detected");
                return Err(ContainerError::CircularDependency(CircularDependencyError { chain }));
            }

            if open.len() >= max_depth {
                warn!(key = %key, depth = max_depth, "Resolution depth limit reached");
                return Err(ContainerError::DepthExceeded {
                    key: key.clone(),
                    depth: max_depth,
                });
            }

            stack.push((container, key.clone()));
            Ok(Self { container })
        })
    }
}

impl Drop for ResolutionFrame {
    fn drop(&mut self) {
        STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|(owner, _)| *owner == self.container) {
                stack.remove(pos);
            }
        });
    }
}
