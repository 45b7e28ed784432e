#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Simulation root that owns the arena and pumps its systems every tick.

use std::time::Duration;

use arena_waves_core::{
    ArenaConfig, Command, ConfigError, EntityHandle, Event, KindId, ReleaseCause, SpawnFailure,
};
use arena_waves_system_wave_reset::{ResetDirective, ResetSequence};
use arena_waves_system_wave_schedule::{Config, SpawnAnchor, WaveSchedule};
use arena_waves_world::{self as world, query, World};
use glam::{Quat, Vec3};
use tracing::error;

/// Receiver for gameplay notifications raised while the simulation runs.
///
/// Every method defaults to doing nothing, so hosts only override what they
/// present.
pub trait NotificationSink {
    /// Damage landed on a live instance at `position`.
    fn damage_dealt(&mut self, _target: EntityHandle, _amount: f32, _position: Vec3) {}

    /// An instance was taken from its pool and placed.
    fn entity_spawned(&mut self, _handle: EntityHandle, _position: Vec3) {}

    /// An instance left play.
    fn entity_released(&mut self, _handle: EntityHandle, _cause: ReleaseCause) {}
}

/// Sink that ignores every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {}

/// Arena world plus the systems that drive it.
#[derive(Debug)]
pub struct Simulation<S = NullSink> {
    world: World,
    schedule: WaveSchedule,
    reset: ResetSequence,
    anchor: SpawnAnchor,
    sink: S,
}

impl Simulation<NullSink> {
    /// Builds a simulation that discards notifications.
    pub fn new(config: &ArenaConfig) -> Result<Self, ConfigError> {
        Self::with_sink(config, NullSink)
    }
}

impl<S: NotificationSink> Simulation<S> {
    /// Validates `config`, registers every kind and starts the first wave.
    ///
    /// Any configuration error refuses the whole arena.
    pub fn with_sink(config: &ArenaConfig, sink: S) -> Result<Self, ConfigError> {
        let build = || -> Result<(World, WaveSchedule, SpawnAnchor), ConfigError> {
            let anchor = SpawnAnchor::from_config(&config.anchor)?;
            let world = World::with_kinds(&config.kinds)?;
            let schedule_config = Config::new(config.seed, config.loop_waves);
            let schedule = WaveSchedule::from_config(&config.waves, schedule_config)?;
            Ok((world, schedule, anchor))
        };

        let (world, mut schedule, anchor) = build().map_err(|err| {
            error!(%err, "arena configuration rejected");
            err
        })?;
        schedule.start();

        Ok(Self {
            world,
            schedule,
            reset: ResetSequence::new(),
            anchor,
            sink,
        })
    }

    /// Advances the arena by `dt`.
    ///
    /// Order within a tick: world time and expiry, then the schedule's spawns
    /// and the commands those spawns produced. A tick that carries a pending
    /// restart only rewinds the schedule, leaving wave 1 at elapsed zero.
    pub fn tick(&mut self, dt: Duration) {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Tick { dt }, &mut events);

        if self.reset.handle(&events) == ResetDirective::RestartSchedule {
            self.schedule.reset();
            self.publish(&events);
            return;
        }

        let mut commands = Vec::new();
        self.schedule.handle(&events, &self.anchor, &mut commands);
        self.publish(&events);
        let _ = self.execute(commands);
    }

    /// Spawns one instance of `kind` outside the wave schedule.
    pub fn spawn(
        &mut self,
        kind: KindId,
        position: Vec3,
        orientation: Quat,
    ) -> Result<EntityHandle, SpawnFailure> {
        let events = self.execute(vec![Command::Spawn {
            kind,
            position,
            orientation,
        }]);

        events
            .iter()
            .find_map(|event| match event {
                Event::EntitySpawned { handle, .. } => Some(Ok(*handle)),
                Event::SpawnSkipped { reason, .. } => Some(Err(*reason)),
                _ => None,
            })
            .unwrap_or(Err(SpawnFailure::CreationFailed))
    }

    /// Returns an instance to its pool. Returns `true` when the handle was
    /// live; stale or foreign handles are rejected or destroyed and yield
    /// `false`.
    pub fn release(&mut self, handle: EntityHandle) -> bool {
        let events = self.execute(vec![Command::Release { handle }]);
        events
            .iter()
            .any(|event| matches!(event, Event::EntityReleased { .. }))
    }

    /// Deals `amount` damage to a live instance.
    pub fn apply_damage(&mut self, target: EntityHandle, amount: f32) {
        let _ = self.execute(vec![Command::ApplyDamage { target, amount }]);
    }

    /// Resolves a projectile striking `target`.
    pub fn projectile_hit(
        &mut self,
        projectile: EntityHandle,
        target: EntityHandle,
        multiplier: f32,
    ) {
        let _ = self.execute(vec![Command::ProjectileHit {
            projectile,
            target,
            multiplier,
        }]);
    }

    /// Clears the arena now and restarts the first wave on the next tick.
    pub fn reset_waves(&mut self) {
        let mut commands = Vec::new();
        self.reset.request(&query::live_handles(&self.world), &mut commands);
        let _ = self.execute(commands);
    }

    /// Whether a requested wave restart is waiting for the next tick.
    #[must_use]
    pub const fn is_reset_pending(&self) -> bool {
        self.reset.is_pending()
    }

    /// One-based wave number for display.
    #[must_use]
    pub fn wave_display(&self) -> usize {
        self.schedule.wave_display()
    }

    /// Time spent in the current wave.
    #[must_use]
    pub const fn wave_elapsed(&self) -> Duration {
        self.schedule.elapsed()
    }

    /// Read-only view of the arena.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Read-only view of the wave schedule.
    #[must_use]
    pub const fn schedule(&self) -> &WaveSchedule {
        &self.schedule
    }

    /// Anchor spawns are placed around.
    #[must_use]
    pub const fn anchor(&self) -> &SpawnAnchor {
        &self.anchor
    }

    /// Borrows the notification sink.
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Tears the arena down, destroying every pooled instance.
    ///
    /// Returns the sink along with the number of instances destroyed.
    pub fn shutdown(mut self) -> (S, usize) {
        let destroyed = self.world.shutdown();
        (self.sink, destroyed)
    }

    fn execute(&mut self, commands: Vec<Command>) -> Vec<Event> {
        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }
        self.publish(&events);
        events
    }

    fn publish(&mut self, events: &[Event]) {
        for event in events {
            match *event {
                Event::EntitySpawned { handle, position } => {
                    self.sink.entity_spawned(handle, position);
                }
                Event::EntityReleased { handle, cause, .. } => {
                    self.sink.entity_released(handle, cause);
                }
                Event::DamageDealt {
                    target,
                    amount,
                    position,
                } => self.sink.damage_dealt(target, amount, position),
                _ => {}
            }
        }
    }
}
