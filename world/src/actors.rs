//! Pooled arena actors and the templates that build them.

use std::time::Duration;

use arena_waves_core::{
    is_positive_finite, seconds_to_duration, ConfigError, EntityCategory, KindConfig, KindId,
};
use arena_waves_pool::{Lifecycle, Placeable, Placement, PoolCapacity, PoolTemplate};
use glam::{Quat, Vec3};

/// Current and maximum health of an actor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Health {
    current: f32,
    max: f32,
}

impl Health {
    /// Creates full health with the provided maximum.
    #[must_use]
    pub const fn full(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Remaining health.
    #[must_use]
    pub const fn current(&self) -> f32 {
        self.current
    }

    /// Health restored on every spawn.
    #[must_use]
    pub const fn max(&self) -> f32 {
        self.max
    }

    fn restore(&mut self) {
        self.current = self.max;
    }

    fn take(&mut self, amount: f32) -> bool {
        self.current -= amount;
        self.current <= 0.0
    }
}

/// Instance stored in the arena's pools.
#[derive(Clone, Debug, PartialEq)]
pub struct Actor {
    kind: KindId,
    category: EntityCategory,
    position: Vec3,
    orientation: Quat,
    health: Option<Health>,
    lifetime: Option<Duration>,
    remaining: Option<Duration>,
    damage: f32,
    spent: bool,
}

impl Actor {
    fn inert(config: &KindConfig) -> Self {
        Self {
            kind: config.id,
            category: config.category,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            health: config.max_health.map(Health::full),
            lifetime: config.lifetime_secs.map(seconds_to_duration),
            remaining: None,
            damage: config.damage.unwrap_or(0.0),
            spent: false,
        }
    }

    /// Kind the actor was created from.
    #[must_use]
    pub const fn kind(&self) -> KindId {
        self.kind
    }

    /// Family of the actor's kind.
    #[must_use]
    pub const fn category(&self) -> EntityCategory {
        self.category
    }

    /// Position assigned at spawn.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Orientation assigned at spawn.
    #[must_use]
    pub const fn orientation(&self) -> Quat {
        self.orientation
    }

    /// Health, for kinds that can be hurt.
    #[must_use]
    pub const fn health(&self) -> Option<Health> {
        self.health
    }

    /// Time left before the actor releases itself, for kinds that expire.
    #[must_use]
    pub const fn remaining(&self) -> Option<Duration> {
        self.remaining
    }

    /// Base damage dealt by a projectile hit.
    #[must_use]
    pub const fn damage(&self) -> f32 {
        self.damage
    }

    /// Whether a projectile has already dealt its damage.
    #[must_use]
    pub const fn is_spent(&self) -> bool {
        self.spent
    }

    fn revive(&mut self) {
        if let Some(health) = self.health.as_mut() {
            health.restore();
        }
        self.remaining = self.lifetime;
        self.spent = false;
    }

    fn retire(&mut self) {
        self.remaining = None;
    }

    /// Counts the lifetime down by `dt`. Returns `true` once it runs out.
    pub(crate) fn advance_lifetime(&mut self, dt: Duration) -> bool {
        match self.remaining.as_mut() {
            Some(remaining) => {
                *remaining = remaining.saturating_sub(dt);
                remaining.is_zero()
            }
            None => false,
        }
    }

    /// Removes health. Returns `true` when the actor has none left.
    pub(crate) fn take_damage(&mut self, amount: f32) -> Option<bool> {
        self.health.as_mut().map(|health| health.take(amount))
    }

    /// Marks a projectile as having dealt its damage. Returns the damage to
    /// deal, or `None` if it was not a projectile or had already hit.
    pub(crate) fn spend(&mut self) -> Option<f32> {
        if self.category != EntityCategory::Projectile || self.spent {
            return None;
        }
        self.spent = true;
        Some(self.damage)
    }
}

impl Placeable for Actor {
    fn place(&mut self, placement: Placement) {
        self.position = placement.position;
        self.orientation = placement.orientation;
    }
}

/// Checks a kind's numeric fields.
pub(crate) fn validate_kind(config: &KindConfig) -> Result<(), ConfigError> {
    if let Some(health) = config.max_health {
        if !is_positive_finite(health) {
            return Err(ConfigError::NonPositiveHealth {
                kind: config.id,
                health,
            });
        }
    }

    if let Some(lifetime) = config.lifetime_secs {
        if seconds_to_duration(lifetime).is_zero() {
            return Err(ConfigError::NonPositiveLifetime {
                kind: config.id,
                lifetime,
            });
        }
    }

    Ok(())
}

/// Builds the pool template for a kind.
pub(crate) fn template_for(config: &KindConfig) -> PoolTemplate<Actor> {
    let prototype = Actor::inert(config);
    let lifecycle = Lifecycle::new(move |_| Ok(prototype.clone()))
        .on_acquire(Actor::revive)
        .on_release(Actor::retire);
    PoolTemplate::new(
        lifecycle,
        PoolCapacity::new(config.initial_capacity, config.max_capacity),
    )
}
