//! `Name` interning for attribute and type names.
//!
//! Every attribute and type name used by the runtime is interned in a single
//! process-wide registry, so each unique string maps to exactly one [`Name`].
//! This makes names `Copy`, gives O(1) equality and hashing, and lets stores
//! and registries key on a 4-byte id instead of a heap string.
//!
//! # Architecture
//!
//! Interned text is leaked and lives for the entire program duration, the
//! same lifetime model the selector table uses. The registry maps text to id
//! under a `parking_lot::RwLock`; the fast path only takes the read lock.
//!
//! # Example
//!
//! ```rust
//! use oxidex_attr::Name;
//!
//! let a = Name::new("radius");
//! let b = Name::new("radius");
//!
//! assert_eq!(a, b);
//! assert_eq!(a.as_str(), "radius");
//! ```

use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::OnceLock;

/// Global name registry.
struct NameRegistry {
    ids: RwLock<FxHashMap<&'static str, u32>>,
}

static REGISTRY: OnceLock<NameRegistry> = OnceLock::new();

fn registry() -> &'static NameRegistry {
    REGISTRY.get_or_init(|| NameRegistry {
        ids: RwLock::new(FxHashMap::default()),
    })
}

/// An interned attribute or type name.
///
/// Two `Name`s are equal exactly when their text is equal. Comparison and
/// hashing use the interned id only.
#[derive(Clone, Copy)]
pub struct Name {
    id: u32,
    text: &'static str,
}

impl Name {
    /// Returns the interned name for `text`, interning it if necessary.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` distinct names are interned.
    #[must_use]
    pub fn new(text: &str) -> Self {
        let registry = registry();

        if let Some((&text, &id)) = registry.ids.read().get_key_value(text) {
            return Name { id, text };
        }

        let mut ids = registry.ids.write();
        // Another thread may have interned it between the two locks.
        if let Some((&text, &id)) = ids.get_key_value(text) {
            return Name { id, text };
        }

        let id = u32::try_from(ids.len()).expect("name registry overflow");
        let text: &'static str = Box::leak(text.to_owned().into_boxed_str());
        ids.insert(text, id);
        Name { id, text }
    }

    /// Returns the name's text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.text
    }

    /// Returns the interned id.
    #[must_use]
    pub const fn id(self) -> u32 {
        self.id
    }

    /// Returns true if the name starts with `prefix`.
    ///
    /// An empty prefix reserves nothing.
    #[must_use]
    pub fn has_prefix(self, prefix: &str) -> bool {
        !prefix.is_empty() && self.text.starts_with(prefix)
    }

    /// Returns true for protocol-level names such as `__len__`.
    #[must_use]
    pub fn is_dunder(self) -> bool {
        self.text.len() > 4 && self.text.starts_with("__") && self.text.ends_with("__")
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.text.cmp(other.text)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.text)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text)
    }
}

impl From<&str> for Name {
    fn from(text: &str) -> Self {
        Name::new(text)
    }
}

impl From<&String> for Name {
    fn from(text: &String) -> Self {
        Name::new(text)
    }
}

impl FromStr for Name {
    type Err = std::convert::Infallible;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Ok(Name::new(text))
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        self.text
    }
}
