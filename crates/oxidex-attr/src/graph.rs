//! Type declarations and their direct parents.
//!
//! The [`TypeGraph`] is an append-only DAG: a type can only name parents that
//! are already declared, so cycles cannot be expressed. Declaration order of
//! parents is preserved because the linearizer uses it as a tie-break.
//!
//! # Freezing
//!
//! Resolution orders are cached for the lifetime of a type. To keep those
//! caches valid the graph freezes the first time any order is computed, and
//! every later declaration fails with [`Error::FrozenGraph`].
//!
//! # Thread Safety
//!
//! Declarations take a write lock; queries take a read lock. Once frozen the
//! graph is read-only and readers never contend with a writer.

use crate::error::{Error, Result};
use crate::name::Name;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Dense identifier of a declared type.
///
/// Ids are assigned in declaration order and are only meaningful for the
/// graph that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(u32);

impl TypeId {
    pub(crate) const fn from_raw(raw: u32) -> Self {
        TypeId(raw)
    }

    /// Returns the id as an index into the graph's node table.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A declared type: identity plus ordered direct parents.
#[derive(Debug, Clone)]
pub struct TypeNode {
    id: TypeId,
    name: Name,
    parents: Arc<[TypeId]>,
}

impl TypeNode {
    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    #[must_use]
    pub const fn name(&self) -> Name {
        self.name
    }

    /// Direct parents in declaration order.
    #[must_use]
    pub fn parents(&self) -> &[TypeId] {
        &self.parents
    }
}

#[derive(Default)]
struct GraphInner {
    nodes: Vec<TypeNode>,
    by_name: FxHashMap<Name, TypeId>,
}

/// Append-only store of type declarations.
#[derive(Default)]
pub struct TypeGraph {
    inner: RwLock<GraphInner>,
    frozen: AtomicBool,
}

impl TypeGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a type with the given parents, in order.
    ///
    /// # Errors
    ///
    /// - [`Error::FrozenGraph`] if a resolution order was already computed
    /// - [`Error::DuplicateType`] if `name` is already declared
    /// - [`Error::UnknownParent`] if a parent is not declared
    /// - [`Error::DuplicateParent`] if a parent is listed twice
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` types are declared.
    pub fn declare(&self, name: &str, parents: &[&str]) -> Result<TypeId> {
        let name = Name::new(name);
        let mut inner = self.inner.write();

        if self.is_frozen() {
            return Err(Error::FrozenGraph { ty: name });
        }
        if inner.by_name.contains_key(&name) {
            return Err(Error::DuplicateType { ty: name });
        }

        let mut resolved: Vec<TypeId> = Vec::with_capacity(parents.len());
        for parent in parents {
            let parent = Name::new(parent);
            let Some(&id) = inner.by_name.get(&parent) else {
                return Err(Error::UnknownParent { ty: name, parent });
            };
            if resolved.contains(&id) {
                return Err(Error::DuplicateParent { ty: name, parent });
            }
            resolved.push(id);
        }

        let raw = u32::try_from(inner.nodes.len()).expect("type graph overflow");
        let id = TypeId::from_raw(raw);
        inner.nodes.push(TypeNode {
            id,
            name,
            parents: resolved.into(),
        });
        inner.by_name.insert(name, id);

        tracing::debug!(ty = %name, %id, parents = ?parents, "declared type");
        Ok(id)
    }

    /// Returns the direct parents of `ty`, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownType`] if `ty` was not issued by this graph.
    pub fn parents_of(&self, ty: TypeId) -> Result<Arc<[TypeId]>> {
        self.with_node(ty, |node| Arc::clone(&node.parents))
    }

    /// Returns the name of `ty`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownType`] if `ty` was not issued by this graph.
    pub fn name_of(&self, ty: TypeId) -> Result<Name> {
        self.with_node(ty, TypeNode::name)
    }

    /// Returns a copy of the node for `ty`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownType`] if `ty` was not issued by this graph.
    pub fn node(&self, ty: TypeId) -> Result<TypeNode> {
        self.with_node(ty, TypeNode::clone)
    }

    /// Looks a type up by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.inner.read().by_name.get(&Name::new(name)).copied()
    }

    /// Returns true if `ty` was issued by this graph.
    #[must_use]
    pub fn contains(&self, ty: TypeId) -> bool {
        ty.index() < self.inner.read().nodes.len()
    }

    /// Number of declared types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true once a resolution order has been published.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    /// Rejects all further declarations.
    pub(crate) fn freeze(&self) {
        if !self.frozen.swap(true, Ordering::AcqRel) {
            tracing::debug!(types = self.len(), "type graph frozen");
        }
    }

    fn with_node<T>(&self, ty: TypeId, f: impl FnOnce(&TypeNode) -> T) -> Result<T> {
        let inner = self.inner.read();
        inner.nodes.get(ty.index()).map(f).ok_or_else(|| Error::UnknownType {
            ty: ty.to_string(),
        })
    }
}

impl fmt::Debug for TypeGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("TypeGraph")
            .field("types", &inner.nodes.len())
            .field("frozen", &self.is_frozen())
            .finish()
    }
}
