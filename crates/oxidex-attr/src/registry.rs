//! Member registry: (type, name) → resolver or method.
//!
//! The registry holds at most one [`Member`] per (type, name) pair and at
//! most one [`Fallback`] per type. Lookups scan a [`ResolutionOrder`] and
//! return the first type that binds the name.
//!
//! # Lookup Cache
//!
//! Full lookups are cached per (actual type, name). Attaching anything
//! clears the cache, the same invalidation model used for method caches
//! when categories are added. Cooperative dispatch scans from an offset and
//! is never cached.

use crate::error::{Error, Result};
use crate::graph::TypeId;
use crate::linearize::ResolutionOrder;
use crate::name::Name;
use crate::resolver::{Fallback, Member};
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// A member found while scanning a resolution order.
#[derive(Debug, Clone)]
pub struct Found {
    /// Position of `owner` in the scanned order.
    pub index: usize,
    /// Type that binds the name.
    pub owner: TypeId,
    /// The bound member.
    pub member: Member,
}

/// A fallback hook found while scanning a resolution order.
#[derive(Clone)]
pub struct FoundFallback {
    pub index: usize,
    pub owner: TypeId,
    pub hook: Arc<dyn Fallback>,
}

/// Maps (type, attribute name) to attached members.
pub struct ResolverRegistry {
    members: RwLock<FxHashMap<(TypeId, Name), Member>>,
    fallbacks: RwLock<FxHashMap<TypeId, Arc<dyn Fallback>>>,
    cache: RwLock<FxHashMap<(TypeId, Name), Option<Found>>>,
    cache_enabled: bool,
}

impl ResolverRegistry {
    #[must_use]
    pub fn new(cache_enabled: bool) -> Self {
        ResolverRegistry {
            members: RwLock::new(FxHashMap::default()),
            fallbacks: RwLock::new(FxHashMap::default()),
            cache: RwLock::new(FxHashMap::default()),
            cache_enabled,
        }
    }

    /// Attaches `member` to `ty` under `name`.
    ///
    /// `type_name` is only used for error reporting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyAttached`] if `ty` already binds `name`.
    pub fn attach(&self, ty: TypeId, type_name: Name, name: Name, member: Member) -> Result<()> {
        {
            let mut members = self.members.write();
            if members.contains_key(&(ty, name)) {
                return Err(Error::AlreadyAttached { ty: type_name, name });
            }
            members.insert((ty, name), member);
            // Cleared under the members lock so no lookup can cache a stale miss.
            self.invalidate_cache();
        }

        tracing::debug!(ty = %type_name, %name, "attached member");
        Ok(())
    }

    /// Attaches a fallback hook to `ty`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyAttached`] if `ty` already has a hook.
    pub fn attach_fallback(
        &self,
        ty: TypeId,
        type_name: Name,
        hook: Arc<dyn Fallback>,
    ) -> Result<()> {
        {
            let mut fallbacks = self.fallbacks.write();
            if fallbacks.contains_key(&ty) {
                return Err(Error::AlreadyAttached {
                    ty: type_name,
                    name: Name::new("<fallback>"),
                });
            }
            fallbacks.insert(ty, hook);
        }

        tracing::debug!(ty = %type_name, "attached fallback hook");
        Ok(())
    }

    /// The member attached exactly on `ty`, ignoring ancestors.
    #[must_use]
    pub fn member(&self, ty: TypeId, name: Name) -> Option<Member> {
        self.members.read().get(&(ty, name)).cloned()
    }

    /// First member bound to `name` in `order`.
    #[must_use]
    pub fn lookup(&self, order: &ResolutionOrder, name: Name) -> Option<Found> {
        if !self.cache_enabled {
            return self.lookup_from(order, 0, name);
        }

        let key = (order.owner(), name);
        if let Some(hit) = self.cache.read().get(&key) {
            tracing::trace!(%name, "lookup cache hit");
            return hit.clone();
        }

        let members = self.members.read();
        let found = Self::scan(&members, order, 0, name);
        self.cache.write().insert(key, found.clone());
        drop(members);
        tracing::trace!(%name, found = found.is_some(), "lookup cache miss");
        found
    }

    /// First member bound to `name` in `order[start..]`.
    #[must_use]
    pub fn lookup_from(&self, order: &ResolutionOrder, start: usize, name: Name) -> Option<Found> {
        Self::scan(&self.members.read(), order, start, name)
    }

    fn scan(
        members: &FxHashMap<(TypeId, Name), Member>,
        order: &ResolutionOrder,
        start: usize,
        name: Name,
    ) -> Option<Found> {
        order
            .iter()
            .enumerate()
            .skip(start)
            .find_map(|(index, &owner)| {
                members.get(&(owner, name)).map(|member| Found {
                    index,
                    owner,
                    member: member.clone(),
                })
            })
    }

    /// First fallback hook in `order`.
    #[must_use]
    pub fn fallback(&self, order: &ResolutionOrder) -> Option<FoundFallback> {
        let fallbacks = self.fallbacks.read();
        if fallbacks.is_empty() {
            return None;
        }
        order.iter().enumerate().find_map(|(index, &owner)| {
            fallbacks.get(&owner).map(|hook| FoundFallback {
                index,
                owner,
                hook: Arc::clone(hook),
            })
        })
    }

    /// Number of attached members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached lookup.
    pub(crate) fn invalidate_cache(&self) {
        self.cache.write().clear();
    }

    #[cfg(test)]
    fn cached(&self) -> usize {
        self.cache.read().len()
    }
}

impl Default for ResolverRegistry {
    fn default() -> Self {
        Self::new(true)
    }
}

impl fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverRegistry")
            .field("members", &self.len())
            .field("fallbacks", &self.fallbacks.read().len())
            .field("cache_enabled", &self.cache_enabled)
            .finish()
    }
}
