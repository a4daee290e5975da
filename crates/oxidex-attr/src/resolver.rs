//! Resolvers, methods and fallback hooks.
//!
//! A [`Resolver`] intercepts reads, writes and deletes of one attribute name
//! on one type. It carries up to three operations; which ones it carries
//! decides its precedence against instance storage:
//!
//! - a **data resolver** supplies `on_write` or `on_delete` and always wins
//!   over a stored value of the same name
//! - a **non-data resolver** supplies only `on_read` and is shadowed as soon
//!   as the instance stores a value under its name
//!
//! A [`Method`] is a plain callable bound to a name. Methods share the
//! resolver namespace and behave like non-data members.
//!
//! A [`Fallback`] is a per-type catch-all for names no member handles. The
//! forwarding proxy is built on it.
//!
//! # Example
//!
//! ```rust
//! use oxidex_attr::Resolver;
//!
//! let name = Resolver::builder()
//!     .getter(|access| {
//!         access.store_get("_name").ok_or_else(|| access.not_found())
//!     })
//!     .setter(|access, value| {
//!         if value.as_str().is_none() {
//!             return Err(access.reject("Expected a string"));
//!         }
//!         access.store_set("_name", value);
//!         Ok(())
//!     })
//!     .undeletable()
//!     .build();
//!
//! assert!(name.is_data());
//! ```

use crate::dispatch::Access;
use crate::error::{Error, Result};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Read operation of a resolver.
pub type ReadFn = Arc<dyn Fn(&Access<'_>) -> Result<Value> + Send + Sync>;

/// Write operation of a resolver.
pub type WriteFn = Arc<dyn Fn(&Access<'_>, Value) -> Result<()> + Send + Sync>;

/// Delete operation of a resolver.
pub type DeleteFn = Arc<dyn Fn(&Access<'_>) -> Result<()> + Send + Sync>;

/// Body of a method.
pub type MethodFn = Arc<dyn Fn(&Access<'_>, &[Value]) -> Result<Value> + Send + Sync>;

/// Attribute interceptor with optional read, write and delete operations.
#[derive(Clone, Default)]
pub struct Resolver {
    pub(crate) on_read: Option<ReadFn>,
    pub(crate) on_write: Option<WriteFn>,
    pub(crate) on_delete: Option<DeleteFn>,
}

impl Resolver {
    /// Starts building a resolver with no operations.
    #[must_use]
    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::default()
    }

    /// A non-data resolver computing its value with `f`.
    pub fn read_only<F>(f: F) -> Self
    where
        F: Fn(&Access<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        Self::builder().getter(f).build()
    }

    /// Returns true if this resolver supplies `on_write` or `on_delete`.
    #[must_use]
    pub fn is_data(&self) -> bool {
        self.on_write.is_some() || self.on_delete.is_some()
    }

    #[must_use]
    pub fn can_read(&self) -> bool {
        self.on_read.is_some()
    }

    #[must_use]
    pub fn can_write(&self) -> bool {
        self.on_write.is_some()
    }

    #[must_use]
    pub fn can_delete(&self) -> bool {
        self.on_delete.is_some()
    }

    /// Runs `on_read`, or fails with [`Error::NotReadable`].
    pub(crate) fn read(&self, access: &Access<'_>) -> Result<Value> {
        match &self.on_read {
            Some(read) => read(access),
            None => Err(Error::NotReadable { name: access.name() }),
        }
    }

    /// Runs `on_write`, or fails with [`Error::NotWritable`].
    pub(crate) fn write(&self, access: &Access<'_>, value: Value) -> Result<()> {
        match &self.on_write {
            Some(write) => write(access, value),
            None => Err(Error::NotWritable { name: access.name() }),
        }
    }

    /// Runs `on_delete`, or fails with [`Error::NotDeletable`].
    pub(crate) fn delete(&self, access: &Access<'_>) -> Result<()> {
        match &self.on_delete {
            Some(delete) => delete(access),
            None => Err(Error::NotDeletable { name: access.name() }),
        }
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("read", &self.can_read())
            .field("write", &self.can_write())
            .field("delete", &self.can_delete())
            .finish()
    }
}

/// Builder for [`Resolver`], composed the way properties are.
#[derive(Default)]
#[must_use]
pub struct ResolverBuilder {
    resolver: Resolver,
}

impl ResolverBuilder {
    pub fn getter<F>(mut self, f: F) -> Self
    where
        F: Fn(&Access<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        self.resolver.on_read = Some(Arc::new(f));
        self
    }

    pub fn setter<F>(mut self, f: F) -> Self
    where
        F: Fn(&Access<'_>, Value) -> Result<()> + Send + Sync + 'static,
    {
        self.resolver.on_write = Some(Arc::new(f));
        self
    }

    pub fn deleter<F>(mut self, f: F) -> Self
    where
        F: Fn(&Access<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.resolver.on_delete = Some(Arc::new(f));
        self
    }

    /// Every write fails with [`Error::NotWritable`].
    pub fn rejects_writes(self) -> Self {
        self.setter(|access, _| Err(Error::NotWritable { name: access.name() }))
    }

    /// Every delete fails with [`Error::Undeletable`].
    pub fn undeletable(self) -> Self {
        self.deleter(|access| Err(Error::Undeletable { name: access.name() }))
    }

    pub fn build(self) -> Resolver {
        self.resolver
    }
}

/// A plain callable member.
#[derive(Clone)]
pub struct Method {
    pub(crate) body: MethodFn,
}

impl Method {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Access<'_>, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Method { body: Arc::new(f) }
    }

    pub(crate) fn invoke(&self, access: &Access<'_>, args: &[Value]) -> Result<Value> {
        (self.body)(access, args)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Method")
    }
}

/// Anything attached to a (type, name) slot.
#[derive(Debug, Clone)]
pub enum Member {
    /// An attribute interceptor.
    Resolver(Resolver),
    /// A plain method.
    Method(Method),
}

impl Member {
    /// Data members win over stored values; everything else is shadowed.
    #[must_use]
    pub fn is_data(&self) -> bool {
        match self {
            Member::Resolver(resolver) => resolver.is_data(),
            Member::Method(_) => false,
        }
    }
}

impl From<Resolver> for Member {
    fn from(resolver: Resolver) -> Self {
        Member::Resolver(resolver)
    }
}

impl From<Method> for Member {
    fn from(method: Method) -> Self {
        Member::Method(method)
    }
}

/// Catch-all hook for names no member resolves.
///
/// Reads and calls reach the hook only after ordinary resolution found
/// nothing. Writes and deletes go through the hook first; the default
/// implementations fall back to the ordinary behaviour.
pub trait Fallback: Send + Sync {
    /// Called when a read found no member and no stored value.
    ///
    /// # Errors
    ///
    /// Defaults to [`Error::AttributeNotFound`].
    fn read(&self, access: &Access<'_>) -> Result<Value> {
        Err(access.not_found())
    }

    /// Called for every write on instances of the hooked type.
    ///
    /// # Errors
    ///
    /// Defaults to whatever the ordinary write returns.
    fn write(&self, access: &Access<'_>, value: Value) -> Result<()> {
        access.write_default(value)
    }

    /// Called for every delete on instances of the hooked type.
    ///
    /// # Errors
    ///
    /// Defaults to whatever the ordinary delete returns.
    fn delete(&self, access: &Access<'_>) -> Result<()> {
        access.delete_default()
    }

    /// Called when a call found no method and no stored value.
    ///
    /// # Errors
    ///
    /// Defaults to [`Error::AttributeNotFound`].
    fn call(&self, access: &Access<'_>, args: &[Value]) -> Result<Value> {
        let _ = args;
        Err(access.not_found())
    }
}
