//! Forwarding proxies.
//!
//! A proxy is an instance whose type carries a [`ForwardingResolver`]
//! fallback hook. Operations on names the proxy does not handle itself are
//! redirected to a wrapped target instance:
//!
//! - reads and calls of names no member or stored value resolves
//! - every write and delete of a non-reserved name
//!
//! Reserved names stay on the proxy. A name is reserved if it starts with
//! the configured prefix (`_` by default), if it is a protocol-level dunder
//! name such as `__len__` or `__eq__`, or if it is the slot holding the
//! target.
//!
//! # Protocol Names
//!
//! Protocol-level names are never forwarded, whatever the prefix. A proxy
//! that should support them must attach them explicitly, typically as
//! methods that call through to [`ForwardingProxy::target`].
//!
//! # Loop Detection
//!
//! A proxy wrapping itself, or two proxies wrapping each other, would forward
//! forever. Nested forwards on a thread are counted; beyond
//! [`RuntimeConfig::max_forwarding_depth`](crate::RuntimeConfig::max_forwarding_depth)
//! the operation fails with [`Error::ForwardingLoop`].
//!
//! The counter belongs to the thread, not to a [`Runtime`]. Forwards that
//! nest across runtimes on one thread add up, and each forward is checked
//! against the limit of the runtime performing it.
//!
//! # Example
//!
//! ```rust
//! use oxidex_attr::{ForwardingProxy, Runtime, Value};
//!
//! let rt = Runtime::new();
//! let spam = rt.declare_type("Spam", &[]).unwrap();
//! let proxy_type = ForwardingProxy::declare(&rt, "Proxy").unwrap();
//!
//! let target = rt.create_instance(spam).unwrap();
//! rt.write(&target, "x", 2).unwrap();
//!
//! let p = proxy_type.wrap(&rt, &target).unwrap();
//! assert_eq!(rt.read(&p, "x").unwrap(), Value::from(2));
//!
//! rt.write(&p, "_internal", 9).unwrap();
//! assert!(p.raw_contains("_internal"));
//! assert!(!target.raw_contains("_internal"));
//! ```

use crate::dispatch::Access;
use crate::error::{Error, Result};
use crate::graph::TypeId;
use crate::instance::Instance;
use crate::name::Name;
use crate::resolver::Fallback;
use crate::runtime::Runtime;
use crate::value::Value;
use std::cell::Cell;

thread_local! {
    /// Nested forwards on the current thread, across all runtimes.
    static FORWARDING_DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// Counts one level of forwarding for as long as it lives.
struct DepthGuard;

impl DepthGuard {
    fn enter(max: u32, name: Name) -> Result<Self> {
        FORWARDING_DEPTH.with(|depth| {
            let current = depth.get();
            if current >= max {
                tracing::debug!(%name, depth = current, "forwarding loop detected");
                return Err(Error::ForwardingLoop {
                    name,
                    depth: current,
                });
            }
            depth.set(current + 1);
            Ok(DepthGuard)
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        FORWARDING_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Fallback hook forwarding non-reserved names to a wrapped target.
#[derive(Debug, Clone)]
pub struct ForwardingResolver {
    prefix: String,
    target_slot: Name,
}

impl ForwardingResolver {
    /// Reserves names starting with `prefix`; the target lives in
    /// `{prefix}target`.
    #[must_use]
    pub fn new(prefix: &str) -> Self {
        ForwardingResolver {
            prefix: prefix.to_string(),
            target_slot: Name::new(&format!("{prefix}target")),
        }
    }

    /// The store slot holding the wrapped target.
    #[must_use]
    pub fn target_slot(&self) -> Name {
        self.target_slot
    }

    /// Returns true if `name` stays on the proxy.
    #[must_use]
    pub fn is_reserved(&self, name: Name) -> bool {
        name == self.target_slot || name.is_dunder() || name.has_prefix(&self.prefix)
    }

    fn target(&self, access: &Access<'_>) -> Result<Instance> {
        match access.instance().store_get(self.target_slot) {
            Some(Value::Instance(target)) => Ok(target),
            _ => Err(Error::AttributeNotFound {
                ty: access.instance().type_name(),
                name: self.target_slot,
            }),
        }
    }

    fn forward<T>(
        &self,
        access: &Access<'_>,
        op: &'static str,
        f: impl FnOnce(&Runtime, &Instance) -> Result<T>,
    ) -> Result<T> {
        let target = self.target(access)?;
        let _guard = DepthGuard::enter(access.runtime().config().max_forwarding_depth(), access.name())?;
        tracing::trace!(name = %access.name(), ?target, op, "forwarding");
        f(access.runtime(), &target)
    }
}

impl Default for ForwardingResolver {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_RESERVED_PREFIX)
    }
}

impl Fallback for ForwardingResolver {
    fn read(&self, access: &Access<'_>) -> Result<Value> {
        if self.is_reserved(access.name()) {
            return Err(access.not_found());
        }
        self.forward(access, "read", |rt, target| {
            rt.read(target, access.name().as_str())
        })
    }

    fn write(&self, access: &Access<'_>, value: Value) -> Result<()> {
        if self.is_reserved(access.name()) {
            return access.write_default(value);
        }
        self.forward(access, "write", |rt, target| {
            rt.write(target, access.name().as_str(), value)
        })
    }

    fn delete(&self, access: &Access<'_>) -> Result<()> {
        if self.is_reserved(access.name()) {
            return access.delete_default();
        }
        self.forward(access, "delete", |rt, target| {
            rt.delete(target, access.name().as_str())
        })
    }

    fn call(&self, access: &Access<'_>, args: &[Value]) -> Result<Value> {
        if self.is_reserved(access.name()) {
            return Err(access.not_found());
        }
        self.forward(access, "call", |rt, target| {
            rt.call(target, access.name().as_str(), args)
        })
    }
}

/// A proxy type: a declared type with a [`ForwardingResolver`] attached.
#[derive(Debug, Clone, Copy)]
pub struct ForwardingProxy {
    ty: TypeId,
    target_slot: Name,
}

impl ForwardingProxy {
    /// Declares a root type `name` and makes it forward.
    ///
    /// # Errors
    ///
    /// See [`Runtime::declare_type`].
    pub fn declare(rt: &Runtime, name: &str) -> Result<Self> {
        let ty = rt.declare_type(name, &[])?;
        Self::attach(rt, ty)
    }

    /// Makes an existing type forward.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownType`] if `ty` was not declared on `rt`
    /// - [`Error::AlreadyAttached`] if `ty` already has a fallback hook
    pub fn attach(rt: &Runtime, ty: TypeId) -> Result<Self> {
        let resolver = ForwardingResolver::new(rt.config().reserved_prefix());
        let target_slot = resolver.target_slot();
        rt.attach_fallback(ty, resolver)?;
        Ok(ForwardingProxy { ty, target_slot })
    }

    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.ty
    }

    /// Creates a proxy instance wrapping `target`.
    ///
    /// # Errors
    ///
    /// See [`Runtime::create_instance`].
    pub fn wrap(&self, rt: &Runtime, target: &Instance) -> Result<Instance> {
        let proxy = rt.create_instance(self.ty)?;
        proxy.store_insert(self.target_slot, Value::Instance(target.clone()));
        Ok(proxy)
    }

    /// The instance wrapped by `proxy`, if any.
    #[must_use]
    pub fn target(&self, proxy: &Instance) -> Option<Instance> {
        match proxy.store_get(self.target_slot) {
            Some(Value::Instance(target)) => Some(target),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::resolver::Method;

    fn setup(rt: &Runtime) -> (ForwardingProxy, Instance, Instance) {
        let spam = rt.declare_type("Spam", &[]).unwrap();
        rt.attach_method(
            spam,
            "bar",
            Method::new(|_, args| Ok(args.first().cloned().unwrap_or_default())),
        )
        .unwrap();
        let proxy_type = ForwardingProxy::declare(rt, "Proxy").unwrap();

        let target = rt.create_instance(spam).unwrap();
        rt.write(&target, "x", 2).unwrap();
        let proxy = proxy_type.wrap(rt, &target).unwrap();
        (proxy_type, proxy, target)
    }

    #[test]
    fn test_reserved_names() {
        let resolver = ForwardingResolver::default();
        assert!(resolver.is_reserved(Name::new("_internal")));
        assert!(resolver.is_reserved(Name::new("__len__")));
        assert!(resolver.is_reserved(Name::new("_target")));
        assert!(!resolver.is_reserved(Name::new("x")));

        let custom = ForwardingResolver::new("p_");
        assert!(custom.is_reserved(Name::new("p_state")));
        assert!(custom.is_reserved(Name::new("__eq__")));
        assert!(custom.is_reserved(Name::new("p_target")));
        assert!(!custom.is_reserved(Name::new("_internal")));
    }

    #[test]
    fn test_forwards_read_write_delete_call() {
        let rt = Runtime::new();
        let (proxy_type, proxy, target) = setup(&rt);

        assert_eq!(rt.read(&proxy, "x").unwrap(), Value::from(2));
        assert_eq!(
            rt.call(&proxy, "bar", &[Value::from(3)]).unwrap(),
            Value::from(3)
        );

        rt.write(&proxy, "x", 37).unwrap();
        assert_eq!(target.raw_get("x"), Some(Value::from(37)));
        assert!(!proxy.raw_contains("x"));

        rt.delete(&proxy, "x").unwrap();
        assert!(!target.raw_contains("x"));
        assert_eq!(proxy_type.target(&proxy), Some(target));
    }

    #[test]
    fn test_reserved_names_stay_local() {
        let rt = Runtime::new();
        let (_, proxy, target) = setup(&rt);

        rt.write(&proxy, "_internal", 9).unwrap();
        assert_eq!(proxy.raw_get("_internal"), Some(Value::from(9)));
        assert!(!target.raw_contains("_internal"));
        assert_eq!(rt.read(&proxy, "_internal").unwrap(), Value::from(9));

        rt.delete(&proxy, "_internal").unwrap();
        assert!(matches!(
            rt.read(&proxy, "_internal"),
            Err(Error::AttributeNotFound { .. })
        ));
    }

    #[test]
    fn test_dunder_names_are_not_forwarded() {
        let rt = Runtime::new();
        let (proxy_type, proxy, target) = setup(&rt);
        target.raw_set("__len__", 3);

        assert!(matches!(
            rt.call(&proxy, "__len__", &[]),
            Err(Error::AttributeNotFound { .. })
        ));

        rt.attach_method(
            proxy_type.type_id(),
            "__len__",
            Method::new(move |access, _| {
                let target = proxy_type
                    .target(access.instance())
                    .ok_or_else(|| access.not_found())?;
                access.runtime().read(&target, "__len__")
            }),
        )
        .unwrap();
        assert_eq!(rt.call(&proxy, "__len__", &[]).unwrap(), Value::from(3));
    }

    #[test]
    fn test_forwarding_loop_detected() {
        let rt = Runtime::with_config(RuntimeConfig::default().with_max_forwarding_depth(4));
        let proxy_type = ForwardingProxy::declare(&rt, "Proxy").unwrap();

        let first = rt.create_instance(proxy_type.type_id()).unwrap();
        let second = proxy_type.wrap(&rt, &first).unwrap();
        first.raw_set("_target", second.clone());

        let err = rt.read(&first, "x").unwrap_err();
        assert_eq!(
            err,
            Error::ForwardingLoop {
                name: Name::new("x"),
                depth: 4,
            }
        );
        FORWARDING_DEPTH.with(|depth| assert_eq!(depth.get(), 0));

        // Break the cycle so both instances are freed.
        first.raw_remove("_target");
    }

    #[test]
    fn test_depth_is_shared_across_runtimes() {
        let inner = std::sync::Arc::new(Runtime::with_config(
            RuntimeConfig::default().with_max_forwarding_depth(1),
        ));
        let (_, inner_proxy, _) = setup(&inner);
        assert_eq!(inner.read(&inner_proxy, "x").unwrap(), Value::from(2));

        let outer = Runtime::new();
        let peeker = outer.declare_type("Peeker", &[]).unwrap();
        let proxy_type = ForwardingProxy::declare(&outer, "Proxy").unwrap();
        let peek_rt = std::sync::Arc::clone(&inner);
        let peek_proxy = inner_proxy.clone();
        outer
            .attach_method(
                peeker,
                "peek",
                Method::new(move |_, _| peek_rt.read(&peek_proxy, "x")),
            )
            .unwrap();

        let target = outer.create_instance(peeker).unwrap();
        let proxy = proxy_type.wrap(&outer, &target).unwrap();
        assert_eq!(outer.call(&target, "peek", &[]).unwrap(), Value::from(2));
        assert_eq!(
            outer.call(&proxy, "peek", &[]).unwrap_err(),
            Error::ForwardingLoop {
                name: Name::new("x"),
                depth: 1,
            }
        );
        FORWARDING_DEPTH.with(|depth| assert_eq!(depth.get(), 0));
    }

    #[test]
    fn test_unwrapped_proxy() {
        let rt = Runtime::new();
        let proxy_type = ForwardingProxy::declare(&rt, "Proxy").unwrap();
        let proxy = rt.create_instance(proxy_type.type_id()).unwrap();

        assert_eq!(
            rt.read(&proxy, "x").unwrap_err(),
            Error::AttributeNotFound {
                ty: Name::new("Proxy"),
                name: Name::new("_target"),
            }
        );
        assert!(proxy_type.target(&proxy).is_none());
    }
}
