//! Resolution order computation.
//!
//! The order of a type is the type itself followed by the merge of its
//! parents' orders (in declaration order) and the list of parents itself:
//!
//! ```text
//! L[C] = C + merge(L[P1], ..., L[Pn], [P1, ..., Pn])
//! ```
//!
//! `merge` repeatedly takes the first list head that does not appear in the
//! tail of any other list, emits it and removes it from every list. If every
//! head appears in some tail the hierarchy is inconsistent and linearization
//! fails; it is never resolved by reordering.
//!
//! The resulting order satisfies three rules:
//! - a type is searched before its parents
//! - parents are searched in the order they were declared
//! - between two valid candidates, the one earliest across the lists wins
//!
//! # Caching
//!
//! Orders are computed once per type and shared as [`ResolutionOrder`]
//! handles. Computing any order freezes the graph, so cached orders can never
//! go stale.

use crate::error::{Error, Result};
use crate::graph::{TypeGraph, TypeId};
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::ops::Deref;
use std::sync::Arc;

/// The linear search order of a type: the type first, each ancestor once.
///
/// Cloning is cheap; all clones share the same slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionOrder(Arc<[TypeId]>);

impl ResolutionOrder {
    /// The type this order belongs to.
    #[must_use]
    pub fn owner(&self) -> TypeId {
        self.0[0]
    }

    /// Position of `ty` in the order, if it is the owner or an ancestor.
    #[must_use]
    pub fn position(&self, ty: TypeId) -> Option<usize> {
        self.0.iter().position(|&t| t == ty)
    }

    /// Returns true if `ty` is the owner or one of its ancestors.
    #[must_use]
    pub fn contains(&self, ty: TypeId) -> bool {
        self.position(ty).is_some()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[TypeId] {
        &self.0
    }
}

impl Deref for ResolutionOrder {
    type Target = [TypeId];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a> IntoIterator for &'a ResolutionOrder {
    type Item = &'a TypeId;
    type IntoIter = std::slice::Iter<'a, TypeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Merges sequences into one order, or returns the stuck heads.
fn merge(mut seqs: Vec<VecDeque<TypeId>>) -> std::result::Result<Vec<TypeId>, Vec<TypeId>> {
    let mut out = Vec::new();

    loop {
        seqs.retain(|s| !s.is_empty());
        if seqs.is_empty() {
            return Ok(out);
        }

        let good_head = seqs.iter().filter_map(|s| s.front().copied()).find(|&candidate| {
            !seqs
                .iter()
                .any(|s| s.iter().skip(1).any(|&t| t == candidate))
        });

        let Some(head) = good_head else {
            let mut stuck: Vec<TypeId> = Vec::new();
            for head in seqs.iter().filter_map(|s| s.front().copied()) {
                if !stuck.contains(&head) {
                    stuck.push(head);
                }
            }
            return Err(stuck);
        };

        out.push(head);
        for seq in &mut seqs {
            if seq.front() == Some(&head) {
                seq.pop_front();
            }
        }
    }
}

/// Computes and memoizes resolution orders for a [`TypeGraph`].
#[derive(Debug, Default)]
pub struct Linearizer {
    cache: RwLock<FxHashMap<TypeId, ResolutionOrder>>,
}

impl Linearizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the resolution order of `ty`, computing it on first use.
    ///
    /// The first call freezes `graph`.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownType`] if `ty` is not part of `graph`
    /// - [`Error::Linearization`] if the hierarchy of `ty` is inconsistent
    pub fn order_of(&self, graph: &TypeGraph, ty: TypeId) -> Result<ResolutionOrder> {
        if let Some(order) = self.cache.read().get(&ty) {
            return Ok(order.clone());
        }

        graph.node(ty)?;
        graph.freeze();
        self.compute(graph, ty)
    }

    /// Number of orders currently cached.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.read().len()
    }

    #[tracing::instrument(level = "debug", skip(self, graph))]
    fn compute(&self, graph: &TypeGraph, ty: TypeId) -> Result<ResolutionOrder> {
        let node = graph.node(ty)?;

        // Parents are always declared before their children, so this
        // recursion terminates and walks each ancestor at most once.
        let mut seqs = Vec::with_capacity(node.parents().len() + 1);
        for &parent in node.parents() {
            let order = self.order_of(graph, parent)?;
            seqs.push(order.iter().copied().collect::<VecDeque<_>>());
        }
        seqs.push(node.parents().iter().copied().collect());

        let merged = merge(seqs).map_err(|stuck| {
            let conflicting = stuck
                .into_iter()
                .map(|t| graph.name_of(t).map_or_else(|_| t.to_string(), |n| n.to_string()))
                .collect();
            let err = Error::Linearization {
                ty: node.name(),
                conflicting,
            };
            tracing::debug!(error = %err, "linearization failed");
            err
        })?;

        let mut order = Vec::with_capacity(merged.len() + 1);
        order.push(ty);
        order.extend(merged);
        let order = ResolutionOrder(order.into());

        // A concurrent computation may have won; either result is identical.
        let order = self
            .cache
            .write()
            .entry(ty)
            .or_insert(order)
            .clone();

        tracing::debug!(ty = %node.name(), len = order.len(), "computed resolution order");
        Ok(order)
    }
}
