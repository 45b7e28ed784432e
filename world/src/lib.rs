#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative arena state management for Arena Waves.

mod actors;

use std::{collections::BTreeMap, time::Duration};

use arena_waves_core::{
    Command, ConfigError, EntityCategory, EntityHandle, Event, KindConfig, KindId, ReleaseCause,
    SpawnFailure,
};
use arena_waves_pool::{Placement, PoolError, PoolRegistry, Registration, ReleaseOutcome};
use tracing::{debug, warn};

pub use actors::{Actor, Health};
pub use arena_waves_pool::PoolStats;

/// Represents the authoritative arena state.
///
/// Every transient instance lives in the world's pool registry; nothing else
/// holds instance data.
#[derive(Debug, Default)]
pub struct World {
    registry: PoolRegistry<Actor>,
    categories: BTreeMap<KindId, EntityCategory>,
    tick_index: u64,
    elapsed: Duration,
}

impl World {
    /// Creates an arena with no registered kinds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an arena with every kind in `kinds` registered.
    pub fn with_kinds(kinds: &[KindConfig]) -> Result<Self, ConfigError> {
        let mut world = Self::new();
        for kind in kinds {
            world.register_kind(kind)?;
        }
        Ok(world)
    }

    /// Registers the template for one kind.
    ///
    /// Eager kinds get their pool built and prewarmed immediately; the rest
    /// are built on first spawn.
    pub fn register_kind(&mut self, config: &KindConfig) -> Result<(), ConfigError> {
        actors::validate_kind(config)?;
        if self.categories.contains_key(&config.id) {
            return Err(ConfigError::DuplicateKind { kind: config.id });
        }

        let registration = if config.eager {
            Registration::Eager
        } else {
            Registration::Lazy
        };
        self.registry
            .register(config.id, actors::template_for(config), registration)
            .map_err(|_| ConfigError::DuplicateKind { kind: config.id })?;
        let _ = self.categories.insert(config.id, config.category);
        debug!(kind = config.id.get(), name = %config.name, "registered kind");
        Ok(())
    }

    /// Destroys every pooled instance. Returns how many were destroyed.
    pub fn shutdown(&mut self) -> usize {
        self.registry.drain()
    }

    fn release(&mut self, handle: EntityHandle, cause: ReleaseCause, out_events: &mut Vec<Event>) {
        match self.registry.release(handle) {
            Ok(outcome) => out_events.push(Event::EntityReleased {
                handle,
                cause,
                retained: outcome == ReleaseOutcome::Retained,
            }),
            Err(PoolError::DoubleRelease { handle }) => {
                out_events.push(Event::ReleaseRejected { handle });
            }
            Err(PoolError::LostProvenance { handle, destroyed }) => {
                out_events.push(Event::ProvenanceLost { handle, destroyed });
            }
            Err(error) => warn!(?handle, %error, "release failed"),
        }
    }

    fn damage(&mut self, target: EntityHandle, amount: f32, out_events: &mut Vec<Event>) {
        if !(amount.is_finite() && amount > 0.0) {
            return;
        }

        let Some(actor) = self.registry.get_mut(target) else {
            return;
        };
        let Some(killed) = actor.take_damage(amount) else {
            return;
        };
        out_events.push(Event::DamageDealt {
            target,
            amount,
            position: actor.position(),
        });

        if killed {
            self.release(target, ReleaseCause::Killed, out_events);
        }
    }

    fn expire(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let handles: Vec<EntityHandle> = self.registry.live_handles().collect();
        let expired: Vec<EntityHandle> = handles
            .into_iter()
            .filter(|handle| {
                self.registry
                    .get_mut(*handle)
                    .map(|actor| actor.advance_lifetime(dt))
                    .unwrap_or(false)
            })
            .collect();

        for handle in expired {
            self.release(handle, ReleaseCause::Expired, out_events);
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            world.elapsed = world.elapsed.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
            world.expire(dt, out_events);
        }
        Command::Spawn {
            kind,
            position,
            orientation,
        } => match world
            .registry
            .spawn(kind, Placement::new(position, orientation))
        {
            Ok(handle) => out_events.push(Event::EntitySpawned { handle, position }),
            Err(PoolError::UnknownKind { kind }) => out_events.push(Event::SpawnSkipped {
                kind,
                reason: SpawnFailure::UnknownKind,
            }),
            Err(error) => {
                warn!(kind = kind.get(), %error, "spawn failed; skipping");
                out_events.push(Event::SpawnSkipped {
                    kind,
                    reason: SpawnFailure::CreationFailed,
                });
            }
        },
        Command::Release { handle } => world.release(handle, ReleaseCause::Requested, out_events),
        Command::ApplyDamage { target, amount } => world.damage(target, amount, out_events),
        Command::ProjectileHit {
            projectile,
            target,
            multiplier,
        } => {
            let Some(damage) = world
                .registry
                .get_mut(projectile)
                .and_then(|actor| actor.spend())
            else {
                return;
            };
            world.damage(target, damage * multiplier, out_events);
            world.release(projectile, ReleaseCause::Spent, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use arena_waves_core::{EntityCategory, EntityHandle, KindId};

    use super::{Actor, PoolStats, World};

    /// Number of ticks the world has processed.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Total simulated time the world has processed.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Number of live instances across every kind.
    #[must_use]
    pub fn live_count(world: &World) -> usize {
        world.registry.live_count()
    }

    /// Live handles in deterministic order.
    #[must_use]
    pub fn live_handles(world: &World) -> Vec<EntityHandle> {
        world.registry.live_handles().collect()
    }

    /// Live handles whose kind belongs to `category`, in deterministic order.
    #[must_use]
    pub fn live_in_category(world: &World, category: EntityCategory) -> Vec<EntityHandle> {
        world
            .registry
            .live_handles()
            .filter(|handle| world.categories.get(&handle.kind()) == Some(&category))
            .collect()
    }

    /// Borrows a live actor.
    #[must_use]
    pub fn actor(world: &World, handle: EntityHandle) -> Option<&Actor> {
        world.registry.get(handle)
    }

    /// Family of a registered kind.
    #[must_use]
    pub fn category(world: &World, kind: KindId) -> Option<EntityCategory> {
        world.categories.get(&kind).copied()
    }

    /// Registered kinds in ascending order.
    #[must_use]
    pub fn kinds(world: &World) -> Vec<KindId> {
        world.categories.keys().copied().collect()
    }

    /// Counters of the pool serving `kind`, once it has been built.
    #[must_use]
    pub fn pool_stats(world: &World, kind: KindId) -> Option<PoolStats> {
        world.registry.stats(kind)
    }
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};

    use super::*;

    fn kind(id: u32, category: EntityCategory) -> KindConfig {
        KindConfig {
            id: KindId::new(id),
            name: format!("kind-{id}"),
            category,
            initial_capacity: 2,
            max_capacity: 4,
            eager: false,
            max_health: None,
            lifetime_secs: None,
            damage: None,
        }
    }

    fn spawn(world: &mut World, id: u32) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::Spawn {
                kind: KindId::new(id),
                position: Vec3::new(1.0, 0.0, 2.0),
                orientation: Quat::IDENTITY,
            },
            &mut events,
        );
        events
    }

    #[test]
    fn duplicate_kinds_are_refused() {
        let config = kind(1, EntityCategory::Enemy);
        assert_eq!(
            World::with_kinds(&[config.clone(), config]).map(|_| ()),
            Err(ConfigError::DuplicateKind {
                kind: KindId::new(1)
            })
        );
    }

    #[test]
    fn spawn_places_actor_and_reports_handle() {
        let mut world = World::with_kinds(&[kind(1, EntityCategory::Enemy)]).expect("world");
        let events = spawn(&mut world, 1);

        let [Event::EntitySpawned { handle, position }] = events.as_slice() else {
            panic!("expected a single spawn event, got {events:?}");
        };
        let actor = query::actor(&world, *handle).expect("live actor");
        assert_eq!(actor.position(), *position);
        assert_eq!(query::live_count(&world), 1);
    }

    #[test]
    fn unknown_kind_spawn_is_skipped() {
        let mut world = World::new();
        let events = spawn(&mut world, 99);
        assert_eq!(
            events,
            vec![Event::SpawnSkipped {
                kind: KindId::new(99),
                reason: SpawnFailure::UnknownKind,
            }]
        );
        assert_eq!(query::live_count(&world), 0);
    }

    #[test]
    fn tick_reports_time_before_expiry() {
        let mut config = kind(5, EntityCategory::Effect);
        config.lifetime_secs = Some(0.5);
        let mut world = World::with_kinds(&[config]).expect("world");
        let _ = spawn(&mut world, 5);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
            &mut events,
        );

        assert!(matches!(events[0], Event::TimeAdvanced { .. }));
        assert!(matches!(
            events[1],
            Event::EntityReleased {
                cause: ReleaseCause::Expired,
                retained: true,
                ..
            }
        ));
        assert_eq!(query::tick_index(&world), 1);
        assert_eq!(query::elapsed(&world), Duration::from_secs(1));
    }

    #[test]
    fn eager_kind_has_pool_before_first_spawn() {
        let mut config = kind(2, EntityCategory::Projectile);
        config.eager = true;
        let world = World::with_kinds(&[config]).expect("world");

        let stats = query::pool_stats(&world, KindId::new(2)).expect("eager pool");
        assert_eq!(stats.free, 2);
        assert_eq!(stats.active, 0);
    }
}
