//! Instances: a fixed actual type plus an attribute store.
//!
//! [`Instance`] is a reference-counted handle. Clones refer to the same
//! object and compare equal; distinct instances never do, even with equal
//! contents.
//!
//! # Thread Safety
//!
//! The store sits behind its own lock, held only for a single store access.
//! The engine never holds it while a resolver runs, so resolvers may freely
//! read and write the same instance. Sequences of accesses are not atomic.

use crate::graph::TypeId;
use crate::name::Name;
use crate::store::AttributeStore;
use crate::value::Value;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for instance identities.
static INSTANCE_ID: AtomicU64 = AtomicU64::new(0);

struct InstanceInner {
    id: u64,
    ty: TypeId,
    type_name: Name,
    store: RwLock<AttributeStore>,
}

/// Handle to a runtime instance.
#[derive(Clone)]
pub struct Instance {
    inner: Arc<InstanceInner>,
}

impl Instance {
    /// Creates an instance of `ty` with an empty store.
    ///
    /// Use [`Runtime::create_instance`](crate::Runtime::create_instance),
    /// which checks that `ty` exists.
    pub(crate) fn new(ty: TypeId, type_name: Name) -> Self {
        Instance {
            inner: Arc::new(InstanceInner {
                id: INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
                ty,
                type_name,
                store: RwLock::new(AttributeStore::new()),
            }),
        }
    }

    /// Unique identity of this instance.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// The actual type, fixed at creation.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.inner.ty
    }

    #[must_use]
    pub fn type_name(&self) -> Name {
        self.inner.type_name
    }

    /// Reads the store directly, bypassing resolution.
    #[must_use]
    pub fn raw_get(&self, name: &str) -> Option<Value> {
        self.inner.store.read().get(Name::new(name))
    }

    /// Writes the store directly, bypassing resolution.
    pub fn raw_set(&self, name: &str, value: impl Into<Value>) -> Option<Value> {
        self.inner.store.write().insert(Name::new(name), value.into())
    }

    /// Removes a store entry directly, bypassing resolution.
    pub fn raw_remove(&self, name: &str) -> Option<Value> {
        self.inner.store.write().remove(Name::new(name))
    }

    #[must_use]
    pub fn raw_contains(&self, name: &str) -> bool {
        self.inner.store.read().contains(Name::new(name))
    }

    /// A copy of the current store contents.
    #[must_use]
    pub fn snapshot(&self) -> AttributeStore {
        self.inner.store.read().clone()
    }

    pub(crate) fn store_get(&self, name: Name) -> Option<Value> {
        self.inner.store.read().get(name)
    }

    pub(crate) fn store_contains(&self, name: Name) -> bool {
        self.inner.store.read().contains(name)
    }

    pub(crate) fn store_insert(&self, name: Name, value: Value) -> Option<Value> {
        self.inner.store.write().insert(name, value)
    }

    pub(crate) fn store_remove(&self, name: Name) -> Option<Value> {
        self.inner.store.write().remove(name)
    }

    /// Returns true if both handles refer to the same instance.
    #[must_use]
    pub fn ptr_eq(a: &Instance, b: &Instance) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        Instance::ptr_eq(self, other)
    }
}

impl Eq for Instance {}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} #{}>", self.inner.type_name, self.inner.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance() -> Instance {
        Instance::new(TypeId::from_raw(0), Name::new("Spam"))
    }

    #[test]
    fn test_identity() {
        let a = instance();
        let b = instance();
        let a2 = a.clone();

        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_raw_store_access() {
        let obj = instance();
        assert!(obj.raw_set("x", 2).is_none());
        assert_eq!(obj.raw_get("x"), Some(Value::from(2)));
        assert!(obj.raw_contains("x"));
        assert_eq!(obj.snapshot().len(), 1);
        assert_eq!(obj.raw_remove("x"), Some(Value::from(2)));
        assert!(!obj.raw_contains("x"));
    }

    #[test]
    fn test_clones_share_store() {
        let obj = instance();
        let alias = obj.clone();
        alias.raw_set("y", "shared");
        assert_eq!(obj.raw_get("y"), Some(Value::from("shared")));
    }

    #[test]
    fn test_debug_format() {
        let obj = instance();
        assert_eq!(format!("{obj:?}"), format!("<Spam #{}>", obj.id()));
    }
}
