#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Arena Waves engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative arena world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Configuration records consumed
//! at startup also live here so every crate agrees on their shape.

use std::time::Duration;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests a pooled instance of the given kind at the provided pose.
    Spawn {
        /// Template the instance is drawn from.
        kind: KindId,
        /// World-space position assigned to the instance.
        position: Vec3,
        /// World-space orientation assigned to the instance.
        orientation: Quat,
    },
    /// Returns a live instance to the pool it was drawn from.
    Release {
        /// Handle of the instance being returned.
        handle: EntityHandle,
    },
    /// Subtracts health from a live instance that tracks health.
    ApplyDamage {
        /// Instance receiving the damage.
        target: EntityHandle,
        /// Amount of health removed.
        amount: f32,
    },
    /// Resolves a projectile striking a target, spending the projectile.
    ProjectileHit {
        /// Projectile that made contact.
        projectile: EntityHandle,
        /// Instance that was struck.
        target: EntityHandle,
        /// Scale applied to the projectile's base damage by the part that was hit.
        multiplier: f32,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a pooled instance became live.
    EntitySpawned {
        /// Handle assigned to the live instance.
        handle: EntityHandle,
        /// Position the instance was placed at.
        position: Vec3,
    },
    /// Reports that a spawn request produced no instance.
    SpawnSkipped {
        /// Kind named by the request.
        kind: KindId,
        /// Why the request was skipped.
        reason: SpawnFailure,
    },
    /// Confirms that a live instance left the simulation.
    EntityReleased {
        /// Handle of the released instance.
        handle: EntityHandle,
        /// What triggered the release.
        cause: ReleaseCause,
        /// Whether the instance was kept for reuse rather than destroyed.
        retained: bool,
    },
    /// Reports a release of an instance that was already back in its pool.
    ReleaseRejected {
        /// Handle named by the rejected release.
        handle: EntityHandle,
    },
    /// Reports a release of a handle whose owning pool could not be resolved.
    ProvenanceLost {
        /// Handle named by the release.
        handle: EntityHandle,
        /// Whether a live instance was found and destroyed.
        destroyed: bool,
    },
    /// Fire-and-forget notification that health was removed from an instance.
    DamageDealt {
        /// Instance that took damage.
        target: EntityHandle,
        /// Amount of health removed.
        amount: f32,
        /// Position of the instance when it was hit.
        position: Vec3,
    },
}

/// Reasons a spawn request may produce no instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpawnFailure {
    /// No template was registered for the requested kind.
    UnknownKind,
    /// The template's factory failed to build an instance.
    CreationFailed,
}

/// Triggers that move a live instance back out of the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReleaseCause {
    /// A collaborator asked for the release explicitly.
    Requested,
    /// The instance's lifetime ran out.
    Expired,
    /// The instance's health dropped to zero.
    Killed,
    /// A projectile was used up by a hit.
    Spent,
}

/// Identity of a template that pooled instances are created from.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct KindId(u32);

impl KindId {
    /// Creates a new kind identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Broad family a kind belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    /// Hostile units driven by the wave schedule.
    Enemy,
    /// Short-lived shots fired by the player.
    Projectile,
    /// Purely visual transients such as damage numbers.
    Effect,
}

/// Opaque identity of one pooled instance.
///
/// The slot locates the instance within the pool for its kind. The
/// generation changes whenever a slot is refilled with a freshly created
/// instance, so a handle that outlives its instance never aliases the
/// replacement. Reusing an instance from the free list keeps its handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle {
    kind: KindId,
    slot: u32,
    generation: u32,
}

impl EntityHandle {
    /// Creates a handle from its raw parts.
    #[must_use]
    pub const fn new(kind: KindId, slot: u32, generation: u32) -> Self {
        Self {
            kind,
            slot,
            generation,
        }
    }

    /// Kind the instance was created from.
    #[must_use]
    pub const fn kind(&self) -> KindId {
        self.kind
    }

    /// Slot index within the owning pool.
    #[must_use]
    pub const fn slot(&self) -> u32 {
        self.slot
    }

    /// Generation of the slot when the instance was created.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

/// Complete description of an arena supplied by the host at startup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Seed for every random draw the schedule makes.
    #[serde(default)]
    pub seed: u64,
    /// Whether the schedule wraps to the first wave after the last one.
    #[serde(default = "default_loop_waves")]
    pub loop_waves: bool,
    /// Point and distance that spawn placement is measured from.
    pub anchor: AnchorConfig,
    /// Templates available to the pool registry.
    #[serde(default)]
    pub kinds: Vec<KindConfig>,
    /// Waves in play order.
    #[serde(default)]
    pub waves: Vec<WaveConfig>,
}

fn default_loop_waves() -> bool {
    true
}

/// World-space anchor around which spawns are placed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnchorConfig {
    /// Centre of the spawn circle.
    pub center: Vec3,
    /// Distance from the centre at which instances appear.
    pub radius: f32,
}

/// Template describing how instances of one kind are pooled and behave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KindConfig {
    /// Identifier impulses and spawn requests refer to.
    pub id: KindId,
    /// Human readable label used in logs.
    pub name: String,
    /// Family the kind belongs to.
    pub category: EntityCategory,
    /// Number of free-list slots reserved up front.
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,
    /// Maximum number of released instances retained for reuse.
    #[serde(default = "default_max_capacity")]
    pub max_capacity: usize,
    /// Whether the pool is built at startup instead of on first spawn.
    #[serde(default)]
    pub eager: bool,
    /// Health restored on every spawn; absent for kinds that cannot be hurt.
    #[serde(default)]
    pub max_health: Option<f32>,
    /// Seconds an instance stays live before releasing itself.
    #[serde(default)]
    pub lifetime_secs: Option<f32>,
    /// Base damage dealt when a projectile of this kind hits.
    #[serde(default)]
    pub damage: Option<f32>,
}

fn default_initial_capacity() -> usize {
    10
}

fn default_max_capacity() -> usize {
    50
}

/// Timed phase of the match containing concurrent impulses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveConfig {
    /// Length of the wave in seconds.
    pub duration_secs: f32,
    /// Emitters active during the wave, evaluated in declaration order.
    #[serde(default)]
    pub impulses: Vec<ImpulseConfig>,
}

/// One spawn emitter within a wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImpulseConfig {
    /// Kind spawned by the emitter.
    pub kind: KindId,
    /// Instances spawned per batch.
    #[serde(default = "default_amount")]
    pub amount: u32,
    /// Seconds after the wave start at which the emitter activates.
    #[serde(default)]
    pub start_secs: f32,
    /// Seconds the emitter stays active.
    pub duration_secs: f32,
    /// Seconds between consecutive batches.
    pub interval_secs: f32,
    /// Rule choosing the angle each instance appears at.
    #[serde(default)]
    pub strategy: PlacementStrategy,
}

fn default_amount() -> u32 {
    1
}

/// Rule choosing the angle around the anchor at which an instance appears.
///
/// Angles are expressed in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlacementStrategy {
    /// Uniform over the full circle.
    #[default]
    Random,
    /// Uniform within `[angle_start, angle_end]`.
    Section {
        /// Lower bound of the arc.
        angle_start: f32,
        /// Upper bound of the arc.
        angle_end: f32,
    },
    /// Always the same angle.
    Point {
        /// Fixed angle.
        angle: f32,
    },
}

/// Reasons an arena configuration is refused at load time.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A wave has a zero, negative, or non-finite duration.
    #[error("wave {wave} has non-positive duration {duration}")]
    NonPositiveWaveDuration {
        /// Zero-based wave index.
        wave: usize,
        /// Offending duration in seconds.
        duration: f32,
    },
    /// An impulse spawns zero instances per batch.
    #[error("impulse {impulse} in wave {wave} spawns zero instances per batch")]
    ZeroBatchSize {
        /// Zero-based wave index.
        wave: usize,
        /// Zero-based impulse index within the wave.
        impulse: usize,
    },
    /// An impulse starts before its wave.
    #[error("impulse {impulse} in wave {wave} starts at negative time {start}")]
    NegativeStartTime {
        /// Zero-based wave index.
        wave: usize,
        /// Zero-based impulse index within the wave.
        impulse: usize,
        /// Offending start time in seconds.
        start: f32,
    },
    /// An impulse is active for a zero, negative, or non-finite span.
    #[error("impulse {impulse} in wave {wave} has non-positive duration {duration}")]
    NonPositiveImpulseDuration {
        /// Zero-based wave index.
        wave: usize,
        /// Zero-based impulse index within the wave.
        impulse: usize,
        /// Offending duration in seconds.
        duration: f32,
    },
    /// An impulse's activation window ends after its wave.
    #[error("impulse {impulse} in wave {wave} ends at {end}s, past the wave duration {wave_duration}s")]
    ImpulseExceedsWave {
        /// Zero-based wave index.
        wave: usize,
        /// Zero-based impulse index within the wave.
        impulse: usize,
        /// End of the activation window in seconds.
        end: f32,
        /// Duration of the enclosing wave in seconds.
        wave_duration: f32,
    },
    /// An impulse fires with a zero, negative, or non-finite interval.
    #[error("impulse {impulse} in wave {wave} has non-positive spawn interval {interval}")]
    NonPositiveInterval {
        /// Zero-based wave index.
        wave: usize,
        /// Zero-based impulse index within the wave.
        impulse: usize,
        /// Offending interval in seconds.
        interval: f32,
    },
    /// Two templates share the same kind identifier.
    #[error("kind {} is declared more than once", kind.get())]
    DuplicateKind {
        /// Repeated identifier.
        kind: KindId,
    },
    /// A template restores zero, negative, or non-finite health.
    #[error("kind {} has non-positive max health {health}", kind.get())]
    NonPositiveHealth {
        /// Offending kind.
        kind: KindId,
        /// Configured health.
        health: f32,
    },
    /// A template expires after a zero, negative, or non-finite span.
    #[error("kind {} has non-positive lifetime {lifetime}", kind.get())]
    NonPositiveLifetime {
        /// Offending kind.
        kind: KindId,
        /// Configured lifetime in seconds.
        lifetime: f32,
    },
    /// The spawn anchor's radius is negative or non-finite.
    #[error("spawn radius {radius} must be finite and non-negative")]
    InvalidRadius {
        /// Configured radius.
        radius: f32,
    },
}

/// Returns whether a configured quantity is finite and strictly positive.
#[must_use]
pub fn is_positive_finite(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

/// Converts configured seconds into a duration with microsecond resolution.
///
/// Negative and non-finite inputs collapse to zero; callers validate before
/// converting.
#[must_use]
pub fn seconds_to_duration(seconds: f32) -> Duration {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_micros((f64::from(seconds) * 1_000_000.0).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::{ArenaConfig, EntityCategory, KindId, PlacementStrategy};
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn kind_id_round_trips_through_bincode() {
        assert_round_trip(&KindId::new(42));
    }

    #[test]
    fn entity_category_round_trips_through_bincode() {
        assert_round_trip(&EntityCategory::Projectile);
    }

    #[test]
    fn arena_config_parses_from_toml_with_defaults() {
        let source = r#"
            [anchor]
            center = [1.0, 2.0, 3.0]
            radius = 20.0

            [[kinds]]
            id = 1
            name = "grunt"
            category = "enemy"
            max_health = 100.0

            [[waves]]
            duration_secs = 10.0

            [[waves.impulses]]
            kind = 1
            amount = 3
            start_secs = 2.0
            duration_secs = 4.0
            interval_secs = 1.0
            strategy = { type = "section", angle_start = 0.0, angle_end = 90.0 }

            [[waves.impulses]]
            kind = 1
            duration_secs = 1.0
            interval_secs = 0.5
        "#;

        let config: ArenaConfig = toml::from_str(source).expect("parse arena config");
        assert_eq!(config.seed, 0);
        assert!(config.loop_waves);
        assert_eq!(config.anchor.center.y, 2.0);

        let kind = &config.kinds[0];
        assert_eq!(kind.id, KindId::new(1));
        assert_eq!(kind.category, EntityCategory::Enemy);
        assert_eq!(kind.initial_capacity, 10);
        assert_eq!(kind.max_capacity, 50);
        assert!(!kind.eager);
        assert_eq!(kind.lifetime_secs, None);

        let impulses = &config.waves[0].impulses;
        assert_eq!(
            impulses[0].strategy,
            PlacementStrategy::Section {
                angle_start: 0.0,
                angle_end: 90.0,
            }
        );
        assert_eq!(impulses[1].amount, 1);
        assert_eq!(impulses[1].start_secs, 0.0);
        assert_eq!(impulses[1].strategy, PlacementStrategy::Random);
    }

    #[test]
    fn positive_finite_rejects_nan_and_infinity() {
        assert!(super::is_positive_finite(0.5));
        assert!(!super::is_positive_finite(0.0));
        assert!(!super::is_positive_finite(f32::NAN));
        assert!(!super::is_positive_finite(f32::INFINITY));
    }

    #[test]
    fn seconds_convert_to_whole_microseconds() {
        use std::time::Duration;

        assert_eq!(super::seconds_to_duration(0.1), Duration::from_millis(100));
        assert_eq!(super::seconds_to_duration(2.0), Duration::from_secs(2));
        assert_eq!(super::seconds_to_duration(-1.0), Duration::ZERO);
        assert_eq!(super::seconds_to_duration(f32::NAN), Duration::ZERO);
    }
}
