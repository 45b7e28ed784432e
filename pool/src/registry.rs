//! Kind-keyed collection of pools with kind-agnostic release.

use std::collections::{btree_map::Entry, BTreeMap};

use arena_waves_core::{EntityHandle, KindId};
use tracing::{debug, warn};

use crate::{
    EntityPool, Lifecycle, Placeable, Placement, PoolCapacity, PoolError, PoolStats,
    ReleaseOutcome,
};

/// When the pool for a registered template is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Registration {
    /// Build the pool the first time the kind is spawned.
    Lazy,
    /// Build the pool immediately and prewarm its initial capacity.
    Eager,
}

/// Recipe the registry turns into a pool.
#[derive(Debug)]
pub struct PoolTemplate<T> {
    lifecycle: Lifecycle<T>,
    capacity: PoolCapacity,
}

impl<T> PoolTemplate<T> {
    /// Creates a template from a lifecycle and capacity.
    #[must_use]
    pub fn new(lifecycle: Lifecycle<T>, capacity: PoolCapacity) -> Self {
        Self {
            lifecycle,
            capacity,
        }
    }

    fn into_pool(self, kind: KindId) -> EntityPool<T> {
        EntityPool::new(kind, self.lifecycle, self.capacity)
    }
}

/// Owns one pool per kind and tracks which pool each live handle came from.
#[derive(Debug)]
pub struct PoolRegistry<T> {
    templates: BTreeMap<KindId, PoolTemplate<T>>,
    pools: BTreeMap<KindId, EntityPool<T>>,
    live: BTreeMap<EntityHandle, KindId>,
}

impl<T> Default for PoolRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PoolRegistry<T> {
    /// Creates a registry with no templates.
    #[must_use]
    pub fn new() -> Self {
        Self {
            templates: BTreeMap::new(),
            pools: BTreeMap::new(),
            live: BTreeMap::new(),
        }
    }

    /// Registers the template for `kind`.
    ///
    /// Fails only when `kind` already has a template or pool.
    pub fn register(
        &mut self,
        kind: KindId,
        template: PoolTemplate<T>,
        registration: Registration,
    ) -> Result<(), PoolError> {
        if self.is_registered(kind) {
            return Err(PoolError::DuplicateKind { kind });
        }

        match registration {
            Registration::Lazy => {
                let _ = self.templates.insert(kind, template);
            }
            Registration::Eager => {
                let initial = template.capacity.initial();
                let mut pool = template.into_pool(kind);
                match pool.prewarm(initial) {
                    Ok(built) => debug!(kind = kind.get(), built, "built pool eagerly"),
                    Err(error) => warn!(
                        kind = kind.get(),
                        %error,
                        "prewarm failed; pool will create instances on demand"
                    ),
                }
                let _ = self.pools.insert(kind, pool);
            }
        }
        Ok(())
    }

    /// Whether a template or pool exists for `kind`.
    #[must_use]
    pub fn is_registered(&self, kind: KindId) -> bool {
        self.templates.contains_key(&kind) || self.pools.contains_key(&kind)
    }

    /// Pool serving `kind`, if it has been built.
    #[must_use]
    pub fn pool(&self, kind: KindId) -> Option<&EntityPool<T>> {
        self.pools.get(&kind)
    }

    /// Counters for the pool serving `kind`, if it has been built.
    #[must_use]
    pub fn stats(&self, kind: KindId) -> Option<PoolStats> {
        self.pools.get(&kind).map(EntityPool::stats)
    }

    /// Number of instances currently handed out across every pool.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Live handles in ascending handle order.
    pub fn live_handles(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.live.keys().copied()
    }

    /// Whether `handle` names an instance currently handed out.
    #[must_use]
    pub fn is_live(&self, handle: EntityHandle) -> bool {
        self.live.contains_key(&handle)
    }

    /// Borrows a live instance.
    #[must_use]
    pub fn get(&self, handle: EntityHandle) -> Option<&T> {
        let kind = self.live.get(&handle)?;
        self.pools.get(kind)?.get(handle)
    }

    /// Mutably borrows a live instance.
    #[must_use]
    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut T> {
        let kind = self.live.get(&handle)?;
        self.pools.get_mut(kind)?.get_mut(handle)
    }

    /// Returns a live instance to the pool it came from.
    ///
    /// A handle the registry does not track is never pushed into a pool. If
    /// it names an instance sitting in its pool's free list the call is a
    /// [`PoolError::DoubleRelease`]; otherwise it is reported as
    /// [`PoolError::LostProvenance`] and any live instance it names is
    /// destroyed outright.
    pub fn release(&mut self, handle: EntityHandle) -> Result<ReleaseOutcome, PoolError> {
        if let Some(kind) = self.live.remove(&handle) {
            return match self.pools.get_mut(&kind) {
                Some(pool) => pool.release(handle),
                None => {
                    warn!(?handle, "live instance has no pool; dropping record");
                    Err(PoolError::LostProvenance {
                        handle,
                        destroyed: false,
                    })
                }
            };
        }

        let destroyed = match self.pools.get_mut(&handle.kind()) {
            Some(pool) if pool.is_retained(handle) => {
                warn!(?handle, "release of an instance that is already pooled; ignoring");
                return Err(PoolError::DoubleRelease { handle });
            }
            Some(pool) => pool.evict(handle),
            None => false,
        };
        warn!(
            ?handle,
            destroyed, "release of an untracked instance; pool origin was lost"
        );
        Err(PoolError::LostProvenance { handle, destroyed })
    }

    /// Destroys every instance of every pool. Returns how many were destroyed.
    pub fn drain(&mut self) -> usize {
        self.live.clear();
        self.pools.values_mut().map(EntityPool::drain).sum()
    }

    fn resolve_pool(&mut self, kind: KindId) -> Option<&mut EntityPool<T>> {
        match self.pools.entry(kind) {
            Entry::Occupied(entry) => Some(entry.into_mut()),
            Entry::Vacant(entry) => {
                let template = self.templates.remove(&kind)?;
                debug!(kind = kind.get(), "built pool on first spawn");
                Some(entry.insert(template.into_pool(kind)))
            }
        }
    }
}

impl<T: Placeable> PoolRegistry<T> {
    /// Hands out an instance of `kind` moved to `placement`.
    ///
    /// The pool for `kind` is built on demand from its template.
    pub fn spawn(&mut self, kind: KindId, placement: Placement) -> Result<EntityHandle, PoolError> {
        let Some(pool) = self.resolve_pool(kind) else {
            warn!(kind = kind.get(), "spawn requested for unregistered kind; skipping");
            return Err(PoolError::UnknownKind { kind });
        };

        let handle = pool.acquire()?;
        if let Some(instance) = pool.get_mut(handle) {
            instance.place(placement);
        }
        let _ = self.live.insert(handle, kind);
        Ok(handle)
    }
}
