#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Reuse stores for transient arena entities.
//!
//! An [`EntityPool`] keeps instances of a single kind alive between uses so
//! steady-state spawning never touches the factory. A [`PoolRegistry`] owns
//! one pool per kind, creates pools from registered templates, and remembers
//! which pool every live handle came from so callers can release instances
//! without naming their kind.

mod pool;
mod registry;

use arena_waves_core::{EntityHandle, KindId};
use glam::{Quat, Vec3};
use thiserror::Error;

pub use pool::{EntityPool, Lifecycle, PoolCapacity, PoolStats, ReleaseOutcome};
pub use registry::{PoolRegistry, PoolTemplate, Registration};

/// Pose applied to an instance when it is spawned.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// World-space position.
    pub position: Vec3,
    /// World-space orientation.
    pub orientation: Quat,
}

impl Placement {
    /// Creates a placement from a position and orientation.
    #[must_use]
    pub const fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }
}

/// Instances that accept a pose when the registry spawns them.
pub trait Placeable {
    /// Moves the instance to the provided pose.
    fn place(&mut self, placement: Placement);
}

/// Failure reported by a template factory.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct CreateError {
    reason: String,
}

impl CreateError {
    /// Creates an error carrying a human readable reason.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Reason reported by the factory.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Errors produced by pools and the registry.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum PoolError {
    /// No template or pool exists for the requested kind.
    #[error("no template registered for kind {}", kind.get())]
    UnknownKind {
        /// Requested kind.
        kind: KindId,
    },
    /// A template was registered twice for the same kind.
    #[error("kind {} already has a template", kind.get())]
    DuplicateKind {
        /// Repeated kind.
        kind: KindId,
    },
    /// The template factory failed to build an instance.
    #[error("failed to create instance of kind {}: {source}", kind.get())]
    Creation {
        /// Kind whose factory failed.
        kind: KindId,
        /// Error reported by the factory.
        source: CreateError,
    },
    /// The handle was released again without being acquired in between.
    #[error("instance {handle:?} was already released")]
    DoubleRelease {
        /// Handle named by the repeated release.
        handle: EntityHandle,
    },
    /// The registry does not know which pool the handle belongs to.
    #[error("pool origin of {handle:?} was lost")]
    LostProvenance {
        /// Handle named by the release.
        handle: EntityHandle,
        /// Whether a live instance was found and destroyed.
        destroyed: bool,
    },
    /// The handle names a different kind than the pool it was given to.
    #[error("instance {handle:?} does not belong to the pool for kind {}", pool.get())]
    ForeignHandle {
        /// Handle named by the call.
        handle: EntityHandle,
        /// Kind of the pool that received it.
        pool: KindId,
    },
    /// The handle's instance has been destroyed or its slot refilled.
    #[error("instance {handle:?} no longer exists")]
    StaleHandle {
        /// Handle named by the call.
        handle: EntityHandle,
    },
}
