use std::{fmt, time::Duration};

use arena_waves_core::{EntityHandle, ReleaseCause};
use arena_waves_simulation::NotificationSink;
use glam::Vec3;

/// Running totals of everything the simulation reported.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct CountingSink {
    spawned: u64,
    requested: u64,
    expired: u64,
    killed: u64,
    spent: u64,
    hits: u64,
    damage: f32,
}

impl CountingSink {
    /// Instances released for any reason.
    pub(crate) fn released(&self) -> u64 {
        self.requested + self.expired + self.killed + self.spent
    }
}

impl NotificationSink for CountingSink {
    fn damage_dealt(&mut self, _target: EntityHandle, amount: f32, _position: Vec3) {
        self.hits += 1;
        self.damage += amount;
    }

    fn entity_spawned(&mut self, _handle: EntityHandle, _position: Vec3) {
        self.spawned += 1;
    }

    fn entity_released(&mut self, _handle: EntityHandle, cause: ReleaseCause) {
        let counter = match cause {
            ReleaseCause::Requested => &mut self.requested,
            ReleaseCause::Expired => &mut self.expired,
            ReleaseCause::Killed => &mut self.killed,
            ReleaseCause::Spent => &mut self.spent,
        };
        *counter += 1;
    }
}

impl fmt::Display for CountingSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "spawned: {}", self.spawned)?;
        writeln!(
            f,
            "released: {} (requested {}, expired {}, killed {}, spent {})",
            self.released(),
            self.requested,
            self.expired,
            self.killed,
            self.spent
        )?;
        write!(f, "hits: {} for {:.1} damage", self.hits, self.damage)
    }
}

/// Display scalars shown to the player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct WaveReadout {
    pub(crate) elapsed: Duration,
    pub(crate) wave: usize,
    pub(crate) length: Option<Duration>,
}

impl WaveReadout {
    /// Share of the current wave already played, while a wave is running.
    pub(crate) fn progress(&self) -> Option<f32> {
        self.length
            .filter(|length| !length.is_zero())
            .map(|length| (self.elapsed.as_secs_f32() / length.as_secs_f32()).min(1.0))
    }
}

impl fmt::Display for WaveReadout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Timer: {:.2}  Wave: {}",
            self.elapsed.as_secs_f32(),
            self.wave
        )
    }
}
