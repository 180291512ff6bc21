//! Dependency identification keys.
//!
//! A [`TypeKey`] names an abstract contract or a concrete class by its
//! fully-qualified, `::`-separated name. Two keys are equal when their
//! names are equal; there is no structural matching.

use std::borrow::{Borrow, Cow};
use std::fmt;

/// Namespace separator used by class names.
pub const SEPARATOR: &str = "::";

/// Uniquely identifies a dependency contract.
///
/// # Examples
/// ```
/// use anbar_container::key::TypeKey;
///
/// let key = TypeKey::new("app::services::Logger");
/// assert_eq!(key.namespace(), "app::services");
/// assert_eq!(key.short_name(), "Logger");
///
/// // Relative names are resolved against a namespace,
/// // absolute names (leading `::`) are taken verbatim.
/// assert_eq!(TypeKey::qualify("Logger", "app::web"), TypeKey::new("app::web::Logger"));
/// assert_eq!(TypeKey::qualify("::infra::Logger", "app::web"), TypeKey::new("infra::Logger"));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(Cow<'static, str>);

impl TypeKey {
    /// Creates a key from any string. A leading `::` is stripped.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        let name = name.into();
        match name {
            Cow::Borrowed(s) => Self(Cow::Borrowed(s.strip_prefix(SEPARATOR).unwrap_or(s))),
            Cow::Owned(s) => match s.strip_prefix(SEPARATOR) {
                Some(stripped) => Self(Cow::Owned(stripped.to_owned())),
                None => Self(Cow::Owned(s)),
            },
        }
    }

    /// Creates a key from a static name without allocating.
    ///
    /// Like [`new`](Self::new), a leading `::` is stripped.
    #[inline]
    pub fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name.strip_prefix(SEPARATOR).unwrap_or(name)))
    }

    /// Resolves a type reference against the namespace it was declared in.
    ///
    /// `reference` is absolute when it starts with `::`; otherwise it is
    /// prefixed with `namespace` (unless the namespace is empty).
    pub fn qualify(reference: &str, namespace: &str) -> Self {
        if let Some(absolute) = reference.strip_prefix(SEPARATOR) {
            return Self(Cow::Owned(absolute.to_owned()));
        }
        if namespace.is_empty() {
            return Self(Cow::Owned(reference.to_owned()));
        }
        Self(Cow::Owned(format!("{namespace}{SEPARATOR}{reference}")))
    }

    /// The full name.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Everything before the last `::`, or `""` for a bare name.
    pub fn namespace(&self) -> &str {
        namespace_of(&self.0)
    }

    /// The last path segment.
    pub fn short_name(&self) -> &str {
        self.0.rsplit(SEPARATOR).next().unwrap_or(&self.0)
    }

    /// Returns true if the name is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Namespace part of a fully-qualified class name.
pub fn namespace_of(name: &str) -> &str {
    name.rsplit_once(SEPARATOR).map_or("", |(ns, _)| ns)
}

impl From<&'static str> for TypeKey {
    fn from(name: &'static str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeKey {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&TypeKey> for TypeKey {
    fn from(key: &TypeKey) -> Self {
        key.clone()
    }
}

impl Borrow<str> for TypeKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TypeKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.0)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
