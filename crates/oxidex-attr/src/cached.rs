//! Resolvers that compute a value once and cache it on the instance.
//!
//! [`CachedResolver::new`] builds a non-data resolver. Its first read runs
//! the computation and writes the result through the engine under the same
//! name; because the resolver is non-data, every later read is served by the
//! stored value without reaching it again. Deleting the stored value makes
//! the next read recompute.
//!
//! The cached value is an ordinary attribute and can be overwritten.
//! [`CachedResolver::read_only`] builds the protected variant: a data
//! resolver keeping the value in a private `_lazy_<name>` slot, rejecting
//! writes and deletes.
//!
//! Two threads reading an uncached value at once may both compute it; the
//! last write wins.
//!
//! # Example
//!
//! ```rust
//! use oxidex_attr::{CachedResolver, Runtime, Value};
//!
//! let rt = Runtime::new();
//! let circle = rt.declare_type("Circle", &[]).unwrap();
//! rt.attach_resolver(
//!     circle,
//!     "area",
//!     CachedResolver::new(|access| {
//!         let r = access.get("radius")?.as_float().unwrap_or(0.0);
//!         Ok(Value::from(std::f64::consts::PI * r * r))
//!     }),
//! )
//! .unwrap();
//!
//! let c = rt.create_instance(circle).unwrap();
//! rt.write(&c, "radius", 2.0).unwrap();
//! rt.read(&c, "area").unwrap();
//! assert!(c.raw_contains("area"));
//! ```

use crate::dispatch::Access;
use crate::error::Result;
use crate::name::Name;
use crate::resolver::{ReadFn, Resolver};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Prefix of the private slot used by [`CachedResolver::read_only`].
pub const LAZY_SLOT_PREFIX: &str = "_lazy_";

/// A compute-once resolver.
#[derive(Clone)]
pub struct CachedResolver {
    compute: ReadFn,
    protected: bool,
}

impl CachedResolver {
    /// Caches the computed value in the instance store under the same name.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn(&Access<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        CachedResolver {
            compute: Arc::new(compute),
            protected: false,
        }
    }

    /// Caches the computed value in a private slot and rejects writes and
    /// deletes.
    pub fn read_only<F>(compute: F) -> Self
    where
        F: Fn(&Access<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        CachedResolver {
            compute: Arc::new(compute),
            protected: true,
        }
    }

    #[must_use]
    pub fn is_protected(&self) -> bool {
        self.protected
    }

    /// The store slot holding the cached value for `name`.
    #[must_use]
    pub fn slot_for(&self, name: Name) -> Name {
        if self.protected {
            Name::new(&format!("{LAZY_SLOT_PREFIX}{name}"))
        } else {
            name
        }
    }

    #[must_use]
    pub fn build(self) -> Resolver {
        if self.protected {
            self.build_protected()
        } else {
            self.build_unprotected()
        }
    }

    fn build_unprotected(self) -> Resolver {
        let compute = self.compute;
        Resolver::read_only(move |access| {
            let value = compute(access)?;
            tracing::trace!(name = %access.name(), "cached computed value");
            access.set(access.name().as_str(), value.clone())?;
            Ok(value)
        })
    }

    fn build_protected(self) -> Resolver {
        let compute = self.compute;
        Resolver::builder()
            .getter(move |access| {
                let slot = format!("{LAZY_SLOT_PREFIX}{}", access.name());
                if let Some(value) = access.store_get(&slot) {
                    return Ok(value);
                }
                let value = compute(access)?;
                tracing::trace!(name = %access.name(), %slot, "cached computed value");
                access.store_set(&slot, value.clone());
                Ok(value)
            })
            .rejects_writes()
            .undeletable()
            .build()
    }
}

impl From<CachedResolver> for Resolver {
    fn from(cached: CachedResolver) -> Self {
        cached.build()
    }
}

impl fmt::Debug for CachedResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedResolver")
            .field("protected", &self.protected)
            .finish_non_exhaustive()
    }
}
