//! Dependency lifecycle flags.
//!
//! Flags travel with a registration and tell the container what to do with
//! a produced instance:
//! - [`DependencyFlags::SINGLETON`] — cache the first instance for the
//!   lifetime of the container
//! - [`DependencyFlags::NONE`] — produce a fresh instance on every resolve
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Bit set of per-registration options.
///
/// Registrations are singletons unless stated otherwise.
///
/// # Examples
/// ```
/// use anbar_container::flags::DependencyFlags;
///
/// assert!(DependencyFlags::default().is_singleton());
/// assert!(!DependencyFlags::NONE.is_singleton());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DependencyFlags(u8);

impl DependencyFlags {
    /// No flags: the dependency is created on every resolve.
    pub const NONE: Self = Self(0);

    /// One instance per container, created on first resolve.
    pub const SINGLETON: Self = Self(1);

    /// Returns `true` if every bit of `other` is set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if the singleton bit is set.
    #[inline]
    pub const fn is_singleton(self) -> bool {
        self.contains(Self::SINGLETON)
    }

    /// Raw bits.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl Default for DependencyFlags {
    fn default() -> Self {
        Self::SINGLETON
    }
}

impl BitOr for DependencyFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for DependencyFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for DependencyFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_singleton() {
            write!(f, "Singleton")
        } else {
            write!(f, "Transient")
        }
    }
}
