use arena_waves_core::{ArenaConfig, EntityCategory, KindId};
use arena_waves_simulation::{NotificationSink, Simulation};
use arena_waves_world::query;
use glam::Quat;
use tracing::{debug, warn};

/// Fixed turret at the arena anchor that periodically shoots the oldest
/// live enemy.
#[derive(Debug)]
pub(crate) struct Turret {
    projectile: KindId,
    effect: Option<KindId>,
    every: u32,
    countdown: u32,
    multiplier: f32,
}

impl Turret {
    /// Arms a turret that fires every `every` ticks with the arena's first
    /// projectile kind. Returns `None` when the arena has no projectiles.
    pub(crate) fn from_arena(arena: &ArenaConfig, every: u32, multiplier: f32) -> Option<Self> {
        let first_of = |category: EntityCategory| {
            arena
                .kinds
                .iter()
                .find(|kind| kind.category == category)
                .map(|kind| kind.id)
        };

        let every = every.max(1);
        Some(Self {
            projectile: first_of(EntityCategory::Projectile)?,
            effect: first_of(EntityCategory::Effect),
            every,
            countdown: every,
            multiplier,
        })
    }

    /// Counts down one tick and fires when due. Returns `true` when a shot
    /// landed.
    pub(crate) fn update<S: NotificationSink>(&mut self, simulation: &mut Simulation<S>) -> bool {
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown > 0 {
            return false;
        }
        self.countdown = self.every;

        let world = simulation.world();
        let Some(target) = query::live_in_category(world, EntityCategory::Enemy)
            .first()
            .copied()
        else {
            return false;
        };
        let Some(impact) = query::actor(world, target).map(|actor| actor.position()) else {
            return false;
        };

        let origin = simulation.anchor().center();
        let bolt = match simulation.spawn(self.projectile, origin, Quat::IDENTITY) {
            Ok(bolt) => bolt,
            Err(reason) => {
                warn!(?reason, "turret could not load a projectile");
                return false;
            }
        };
        simulation.projectile_hit(bolt, target, self.multiplier);

        if let Some(effect) = self.effect {
            if let Err(reason) = simulation.spawn(effect, impact, Quat::IDENTITY) {
                debug!(?reason, "impact effect skipped");
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::arena_file::load_arena;

    #[test]
    fn turret_damages_first_enemy() {
        let arena = load_arena(None).expect("bundled arena");
        let mut simulation = Simulation::new(&arena).expect("valid arena");
        let mut turret = Turret::from_arena(&arena, 2, 1.0).expect("projectile kind");

        for _ in 0..21 {
            simulation.tick(Duration::from_millis(100));
        }
        let target = query::live_in_category(simulation.world(), EntityCategory::Enemy)[0];

        assert!(!turret.update(&mut simulation));
        assert!(turret.update(&mut simulation));

        let health = query::actor(simulation.world(), target)
            .and_then(|actor| actor.health())
            .map(|health| health.current());
        assert_eq!(health, Some(30.0));
        assert_eq!(
            query::live_in_category(simulation.world(), EntityCategory::Effect).len(),
            1
        );
    }

    #[test]
    fn arena_without_projectiles_has_no_turret() {
        let mut arena = load_arena(None).expect("bundled arena");
        arena
            .kinds
            .retain(|kind| kind.category != EntityCategory::Projectile);
        assert!(Turret::from_arena(&arena, 5, 1.0).is_none());
    }
}
