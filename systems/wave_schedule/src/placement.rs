//! Spawn placement around the arena anchor.

use arena_waves_core::{is_positive_finite, AnchorConfig, ConfigError, PlacementStrategy};
use glam::{Quat, Vec3};
use rand::Rng;

const FULL_CIRCLE_DEGREES: f32 = 360.0;

/// Circle on the ground plane along which instances are placed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnAnchor {
    center: Vec3,
    radius: f32,
}

impl SpawnAnchor {
    /// Creates an anchor, refusing negative or non-finite radii.
    pub fn new(center: Vec3, radius: f32) -> Result<Self, ConfigError> {
        if !(radius == 0.0 || is_positive_finite(radius)) {
            return Err(ConfigError::InvalidRadius { radius });
        }
        Ok(Self { center, radius })
    }

    /// Builds an anchor from its configuration block.
    pub fn from_config(config: &AnchorConfig) -> Result<Self, ConfigError> {
        Self::new(config.center, config.radius)
    }

    /// Centre of the circle.
    #[must_use]
    pub const fn center(&self) -> Vec3 {
        self.center
    }

    /// Distance from the centre at which instances appear.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Point on the circle at `degrees`, measured from +X towards +Z.
    #[must_use]
    pub fn position_at(&self, degrees: f32) -> Vec3 {
        let radians = degrees.to_radians();
        self.center + Vec3::new(radians.cos(), 0.0, radians.sin()) * self.radius
    }
}

/// Draws the placement angle, in degrees, for one instance.
pub(crate) fn sample_angle<R: Rng>(strategy: PlacementStrategy, rng: &mut R) -> f32 {
    match strategy {
        PlacementStrategy::Random => rng.gen::<f32>() * FULL_CIRCLE_DEGREES,
        PlacementStrategy::Section {
            angle_start,
            angle_end,
        } => angle_start + rng.gen::<f32>() * (angle_end - angle_start),
        PlacementStrategy::Point { angle } => angle,
    }
}

/// Orientation given to every spawned instance.
pub(crate) const SPAWN_ORIENTATION: Quat = Quat::IDENTITY;
