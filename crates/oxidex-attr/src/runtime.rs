//! The runtime: type graph, linearizer and member registry behind one handle.
//!
//! A [`Runtime`] owns every piece of shared state. Typical use has two
//! phases:
//!
//! 1. **Declaration**: declare types, attach resolvers, methods and
//!    fallback hooks
//! 2. **Use**: create instances and read, write, delete and call attributes
//!
//! The first resolution order computed freezes the type graph. Members may
//! still be attached afterwards; each attach invalidates the lookup cache.
//!
//! # Thread Safety
//!
//! `Runtime` is `Send + Sync`. Share it across threads behind an `Arc`.
//!
//! # Example
//!
//! ```rust
//! use oxidex_attr::Runtime;
//!
//! let rt = Runtime::new();
//! rt.declare_type("Base", &[]).unwrap();
//! rt.declare_type("A", &["Base"]).unwrap();
//! rt.declare_type("B", &["Base"]).unwrap();
//! let c = rt.declare_type("C", &["A", "B"]).unwrap();
//!
//! let names: Vec<_> = rt
//!     .resolution_order_names(c)
//!     .unwrap()
//!     .iter()
//!     .map(|name| name.as_str())
//!     .collect();
//! assert_eq!(names, ["C", "A", "B", "Base"]);
//! ```

use crate::config::RuntimeConfig;
use crate::error::{Error, Result};
use crate::graph::{TypeGraph, TypeId};
use crate::instance::Instance;
use crate::linearize::{Linearizer, ResolutionOrder};
use crate::name::Name;
use crate::registry::ResolverRegistry;
use crate::resolver::{Fallback, Member, Method, Resolver};
use std::fmt;
use std::sync::Arc;

/// Attribute resolution runtime.
pub struct Runtime {
    pub(crate) config: RuntimeConfig,
    pub(crate) graph: TypeGraph,
    pub(crate) linearizer: Linearizer,
    pub(crate) registry: ResolverRegistry,
}

impl Runtime {
    /// Creates a runtime with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    #[must_use]
    pub fn with_config(config: RuntimeConfig) -> Self {
        let registry = ResolverRegistry::new(config.cache_lookups());
        Runtime {
            config,
            graph: TypeGraph::new(),
            linearizer: Linearizer::new(),
            registry,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    #[must_use]
    pub fn graph(&self) -> &TypeGraph {
        &self.graph
    }

    #[must_use]
    pub fn registry(&self) -> &ResolverRegistry {
        &self.registry
    }

    /// Declares a type with its direct parents, in precedence order.
    ///
    /// # Errors
    ///
    /// - [`Error::FrozenGraph`] once any resolution order has been computed
    /// - [`Error::DuplicateType`] if `name` is already declared
    /// - [`Error::UnknownParent`] if a parent is undeclared
    /// - [`Error::DuplicateParent`] if a parent is listed twice
    pub fn declare_type(&self, name: &str, parents: &[&str]) -> Result<TypeId> {
        self.graph.declare(name, parents)
    }

    /// Looks a type up by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownType`] if no type has that name.
    pub fn type_id(&self, name: &str) -> Result<TypeId> {
        self.graph.lookup(name).ok_or_else(|| Error::UnknownType {
            ty: name.to_string(),
        })
    }

    /// # Errors
    ///
    /// Returns [`Error::UnknownType`] if `ty` was not declared here.
    pub fn type_name(&self, ty: TypeId) -> Result<Name> {
        self.graph.name_of(ty)
    }

    /// The resolution order of `ty`, computing and caching it on first use.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownType`] if `ty` was not declared here
    /// - [`Error::Linearization`] if the hierarchy is inconsistent
    pub fn resolution_order_of(&self, ty: TypeId) -> Result<ResolutionOrder> {
        self.linearizer.order_of(&self.graph, ty)
    }

    /// The resolution order of `ty` as type names.
    ///
    /// # Errors
    ///
    /// See [`Runtime::resolution_order_of`].
    pub fn resolution_order_names(&self, ty: TypeId) -> Result<Vec<Name>> {
        self.resolution_order_of(ty)?
            .iter()
            .map(|&id| self.graph.name_of(id))
            .collect()
    }

    /// Returns true if `ancestor` appears in the resolution order of `ty`.
    ///
    /// # Errors
    ///
    /// See [`Runtime::resolution_order_of`].
    pub fn is_subtype(&self, ty: TypeId, ancestor: TypeId) -> Result<bool> {
        Ok(self.resolution_order_of(ty)?.contains(ancestor))
    }

    /// Attaches a resolver to `ty` under `name`.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownType`] if `ty` was not declared here
    /// - [`Error::AlreadyAttached`] if `ty` already binds `name`
    pub fn attach_resolver(
        &self,
        ty: TypeId,
        name: &str,
        resolver: impl Into<Resolver>,
    ) -> Result<()> {
        self.attach(ty, name, Member::Resolver(resolver.into()))
    }

    /// Attaches a method to `ty` under `name`.
    ///
    /// # Errors
    ///
    /// See [`Runtime::attach_resolver`].
    pub fn attach_method(&self, ty: TypeId, name: &str, method: Method) -> Result<()> {
        self.attach(ty, name, Member::Method(method))
    }

    fn attach(&self, ty: TypeId, name: &str, member: Member) -> Result<()> {
        let type_name = self.graph.name_of(ty)?;
        self.registry.attach(ty, type_name, Name::new(name), member)
    }

    /// Attaches a fallback hook to `ty`.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownType`] if `ty` was not declared here
    /// - [`Error::AlreadyAttached`] if `ty` already has a hook
    pub fn attach_fallback(&self, ty: TypeId, hook: impl Fallback + 'static) -> Result<()> {
        let type_name = self.graph.name_of(ty)?;
        self.registry.attach_fallback(ty, type_name, Arc::new(hook))
    }

    /// Creates an instance of `ty` with an empty store.
    ///
    /// The resolution order is not computed here; an inconsistent hierarchy
    /// surfaces on the first attribute operation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownType`] if `ty` was not declared here.
    pub fn create_instance(&self, ty: TypeId) -> Result<Instance> {
        let type_name = self.graph.name_of(ty)?;
        let instance = Instance::new(ty, type_name);
        tracing::trace!(?instance, "created instance");
        Ok(instance)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("graph", &self.graph)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_runtime_is_send_sync() {
        assert_send_sync::<Runtime>();
        assert_send_sync::<Instance>();
    }

    #[test]
    fn test_type_lookup() {
        let rt = Runtime::new();
        let base = rt.declare_type("Base", &[]).unwrap();
        assert_eq!(rt.type_id("Base").unwrap(), base);
        assert_eq!(
            rt.type_id("Missing").unwrap_err(),
            Error::UnknownType {
                ty: "Missing".to_string()
            }
        );
    }

    #[test]
    fn test_attach_to_unknown_type() {
        let rt = Runtime::new();
        let other = Runtime::new();
        other.declare_type("A", &[]).unwrap();
        let foreign = other.declare_type("B", &["A"]).unwrap();

        let err = rt
            .attach_method(foreign, "spam", Method::new(|_, _| Ok(Value::None)))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownType { .. }));
        assert!(rt.create_instance(foreign).is_err());
    }

    #[test]
    fn test_attach_after_freeze_is_allowed() {
        let rt = Runtime::new();
        let t = rt.declare_type("T", &[]).unwrap();
        rt.resolution_order_of(t).unwrap();

        assert!(matches!(
            rt.declare_type("U", &[]),
            Err(Error::FrozenGraph { .. })
        ));
        rt.attach_method(t, "late", Method::new(|_, _| Ok(Value::from(1))))
            .unwrap();

        let obj = rt.create_instance(t).unwrap();
        assert_eq!(rt.call(&obj, "late", &[]).unwrap(), Value::from(1));
    }

    #[test]
    fn test_is_subtype() {
        let rt = Runtime::new();
        let base = rt.declare_type("Base", &[]).unwrap();
        let a = rt.declare_type("A", &["Base"]).unwrap();
        let other = rt.declare_type("Other", &[]).unwrap();

        assert!(rt.is_subtype(a, base).unwrap());
        assert!(rt.is_subtype(a, a).unwrap());
        assert!(!rt.is_subtype(a, other).unwrap());
    }
}
