//! Single-kind reuse store.

use std::fmt;

use arena_waves_core::{EntityHandle, KindId};
use tracing::{trace, warn};

use crate::{CreateError, PoolError};

type Factory<T> = Box<dyn FnMut(KindId) -> Result<T, CreateError>>;
type Hook<T> = Box<dyn FnMut(&mut T)>;
type Teardown<T> = Box<dyn FnMut(T)>;

/// Creation routine plus the optional callbacks a pool invokes around reuse.
///
/// Every hook is optional; an absent hook is simply skipped. The pool calls
/// them uniformly for every instance of its kind.
pub struct Lifecycle<T> {
    create: Factory<T>,
    on_acquire: Option<Hook<T>>,
    on_release: Option<Hook<T>>,
    on_destroy: Option<Teardown<T>>,
}

impl<T> Lifecycle<T> {
    /// Creates a lifecycle that builds instances with the provided factory.
    #[must_use]
    pub fn new<F>(create: F) -> Self
    where
        F: FnMut(KindId) -> Result<T, CreateError> + 'static,
    {
        Self {
            create: Box::new(create),
            on_acquire: None,
            on_release: None,
            on_destroy: None,
        }
    }

    /// Installs the callback that readies an instance before it is handed out.
    #[must_use]
    pub fn on_acquire<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut T) + 'static,
    {
        self.on_acquire = Some(Box::new(hook));
        self
    }

    /// Installs the callback that detaches an instance when it is returned.
    #[must_use]
    pub fn on_release<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut T) + 'static,
    {
        self.on_release = Some(Box::new(hook));
        self
    }

    /// Installs the callback that tears an instance down for good.
    #[must_use]
    pub fn on_destroy<F>(mut self, hook: F) -> Self
    where
        F: FnMut(T) + 'static,
    {
        self.on_destroy = Some(Box::new(hook));
        self
    }
}

impl<T> fmt::Debug for Lifecycle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("on_acquire", &self.on_acquire.is_some())
            .field("on_release", &self.on_release.is_some())
            .field("on_destroy", &self.on_destroy.is_some())
            .finish_non_exhaustive()
    }
}

/// Sizing of a pool's free list.
///
/// `max` bounds how many released instances are retained. It does not bound
/// how many instances may be live at once: acquiring from an empty free list
/// always creates a new instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolCapacity {
    initial: usize,
    max: usize,
}

impl PoolCapacity {
    /// Creates a capacity description. `initial` is clamped to `max`.
    #[must_use]
    pub fn new(initial: usize, max: usize) -> Self {
        Self {
            initial: initial.min(max),
            max,
        }
    }

    /// Free-list slots reserved up front.
    #[must_use]
    pub const fn initial(&self) -> usize {
        self.initial
    }

    /// Maximum number of released instances retained.
    #[must_use]
    pub const fn max(&self) -> usize {
        self.max
    }
}

/// What happened to an instance returned to its pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReleaseOutcome {
    /// The instance went to the free list for reuse.
    Retained,
    /// The free list was full, so the instance was destroyed.
    Destroyed,
}

/// Counters describing a pool's current population and history.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Instances built by the factory over the pool's lifetime.
    pub created: u64,
    /// Instances torn down over the pool's lifetime.
    pub destroyed: u64,
    /// Instances currently waiting in the free list.
    pub free: usize,
    /// Instances currently handed out.
    pub active: usize,
}

#[derive(Debug)]
struct Slot<T> {
    instance: Option<T>,
    generation: u32,
    active: bool,
}

/// Reuse store for instances of one kind.
pub struct EntityPool<T> {
    kind: KindId,
    lifecycle: Lifecycle<T>,
    capacity: PoolCapacity,
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    vacant: Vec<u32>,
    active: usize,
    created: u64,
    destroyed: u64,
}

impl<T> fmt::Debug for EntityPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityPool")
            .field("kind", &self.kind)
            .field("capacity", &self.capacity)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl<T> EntityPool<T> {
    /// Creates an empty pool for `kind`.
    #[must_use]
    pub fn new(kind: KindId, lifecycle: Lifecycle<T>, capacity: PoolCapacity) -> Self {
        Self {
            kind,
            lifecycle,
            capacity,
            slots: Vec::with_capacity(capacity.initial()),
            free: Vec::with_capacity(capacity.initial()),
            vacant: Vec::new(),
            active: 0,
            created: 0,
            destroyed: 0,
        }
    }

    /// Current counters for the pool.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            created: self.created,
            destroyed: self.destroyed,
            free: self.free.len(),
            active: self.active,
        }
    }

    /// Builds up to `count` inert instances straight into the free list.
    ///
    /// Stops early once the free list holds `max` instances. Returns the
    /// number of instances created.
    pub fn prewarm(&mut self, count: usize) -> Result<usize, PoolError> {
        let mut built = 0;
        while built < count && self.free.len() < self.capacity.max() {
            let index = self.create_instance()?;
            self.free.push(index);
            built += 1;
        }
        Ok(built)
    }

    /// Hands out a ready instance, reusing a free one when available.
    pub fn acquire(&mut self) -> Result<EntityHandle, PoolError> {
        let index = match self.free.pop() {
            Some(index) => index,
            None => self.create_instance()?,
        };

        let slot = &mut self.slots[index as usize];
        slot.active = true;
        if let (Some(hook), Some(instance)) =
            (self.lifecycle.on_acquire.as_mut(), slot.instance.as_mut())
        {
            hook(instance);
        }
        self.active += 1;

        Ok(EntityHandle::new(self.kind, index, slot.generation))
    }

    /// Returns an instance to the pool, destroying it if the free list is full.
    ///
    /// Releasing an instance that is already in the free list is rejected
    /// with [`PoolError::DoubleRelease`] and leaves the pool untouched.
    pub fn release(&mut self, handle: EntityHandle) -> Result<ReleaseOutcome, PoolError> {
        let index = self.resolve(handle)?;
        let slot = &mut self.slots[index as usize];
        if !slot.active {
            warn!(?handle, "release of an instance that is already pooled; ignoring");
            return Err(PoolError::DoubleRelease { handle });
        }

        slot.active = false;
        self.active -= 1;
        if let (Some(hook), Some(instance)) =
            (self.lifecycle.on_release.as_mut(), slot.instance.as_mut())
        {
            hook(instance);
        }

        if self.free.len() < self.capacity.max() {
            self.free.push(index);
            Ok(ReleaseOutcome::Retained)
        } else {
            self.destroy_slot(index);
            Ok(ReleaseOutcome::Destroyed)
        }
    }

    /// Destroys a live instance without returning it to the free list.
    ///
    /// Returns `false` when the handle does not name a live instance; pooled
    /// instances are left alone.
    pub fn evict(&mut self, handle: EntityHandle) -> bool {
        let Ok(index) = self.resolve(handle) else {
            return false;
        };
        let slot = &mut self.slots[index as usize];
        if !slot.active {
            return false;
        }

        slot.active = false;
        self.active -= 1;
        if let (Some(hook), Some(instance)) =
            (self.lifecycle.on_release.as_mut(), slot.instance.as_mut())
        {
            hook(instance);
        }
        self.destroy_slot(index);
        true
    }

    /// Destroys every instance, live or pooled. Returns how many were destroyed.
    pub fn drain(&mut self) -> usize {
        let before = self.destroyed;
        self.free.clear();
        for index in 0..self.slots.len() {
            if self.slots[index].instance.is_some() {
                self.slots[index].active = false;
                self.destroy_slot(index as u32);
            }
        }
        self.active = 0;
        (self.destroyed - before) as usize
    }

    /// Whether the handle names an instance that is currently handed out.
    #[must_use]
    pub fn is_active(&self, handle: EntityHandle) -> bool {
        self.resolve(handle)
            .map(|index| self.slots[index as usize].active)
            .unwrap_or(false)
    }

    /// Whether the handle names an instance currently waiting in the free list.
    #[must_use]
    pub fn is_retained(&self, handle: EntityHandle) -> bool {
        self.resolve(handle)
            .map(|index| !self.slots[index as usize].active)
            .unwrap_or(false)
    }

    /// Borrows a live instance.
    #[must_use]
    pub fn get(&self, handle: EntityHandle) -> Option<&T> {
        let index = self.resolve(handle).ok()?;
        let slot = &self.slots[index as usize];
        if slot.active {
            slot.instance.as_ref()
        } else {
            None
        }
    }

    /// Mutably borrows a live instance.
    #[must_use]
    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut T> {
        let index = self.resolve(handle).ok()?;
        let slot = &mut self.slots[index as usize];
        if slot.active {
            slot.instance.as_mut()
        } else {
            None
        }
    }

    fn resolve(&self, handle: EntityHandle) -> Result<u32, PoolError> {
        if handle.kind() != self.kind {
            return Err(PoolError::ForeignHandle {
                handle,
                pool: self.kind,
            });
        }

        match self.slots.get(handle.slot() as usize) {
            Some(slot) if slot.generation == handle.generation() && slot.instance.is_some() => {
                Ok(handle.slot())
            }
            _ => Err(PoolError::StaleHandle { handle }),
        }
    }

    fn create_instance(&mut self) -> Result<u32, PoolError> {
        let instance = (self.lifecycle.create)(self.kind).map_err(|source| PoolError::Creation {
            kind: self.kind,
            source,
        })?;
        self.created += 1;

        let index = match self.vacant.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.generation = slot.generation.wrapping_add(1);
                slot.instance = Some(instance);
                slot.active = false;
                index
            }
            None => {
                self.slots.push(Slot {
                    instance: Some(instance),
                    generation: 0,
                    active: false,
                });
                (self.slots.len() - 1) as u32
            }
        };
        trace!(kind = self.kind.get(), slot = index, "created pooled instance");
        Ok(index)
    }

    fn destroy_slot(&mut self, index: u32) {
        let slot = &mut self.slots[index as usize];
        if let Some(instance) = slot.instance.take() {
            if let Some(hook) = self.lifecycle.on_destroy.as_mut() {
                hook(instance);
            }
            self.destroyed += 1;
            self.vacant.push(index);
            trace!(kind = self.kind.get(), slot = index, "destroyed pooled instance");
        }
    }
}
