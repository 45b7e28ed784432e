//! Validated wave definitions and per-impulse runner state.

use std::{num::NonZeroU32, time::Duration};

use arena_waves_core::{
    seconds_to_duration, ConfigError, ImpulseConfig, KindId, PlacementStrategy, WaveConfig,
};

/// Spawn emitter whose timing has been validated against its wave.
#[derive(Clone, Debug, PartialEq)]
pub struct Impulse {
    kind: KindId,
    amount: NonZeroU32,
    start: Duration,
    duration: Duration,
    interval: Duration,
    strategy: PlacementStrategy,
}

impl Impulse {
    /// Validates an impulse of wave `wave` at position `index`.
    pub fn from_config(
        wave: usize,
        index: usize,
        config: &ImpulseConfig,
        wave_duration: Duration,
    ) -> Result<Self, ConfigError> {
        let amount = NonZeroU32::new(config.amount).ok_or(ConfigError::ZeroBatchSize {
            wave,
            impulse: index,
        })?;

        // Timings are checked after rounding to whole microseconds.
        let interval = seconds_to_duration(config.interval_secs);
        if interval.is_zero() {
            return Err(ConfigError::NonPositiveInterval {
                wave,
                impulse: index,
                interval: config.interval_secs,
            });
        }

        if !(config.start_secs.is_finite() && config.start_secs >= 0.0) {
            return Err(ConfigError::NegativeStartTime {
                wave,
                impulse: index,
                start: config.start_secs,
            });
        }

        let duration = seconds_to_duration(config.duration_secs);
        if duration.is_zero() {
            return Err(ConfigError::NonPositiveImpulseDuration {
                wave,
                impulse: index,
                duration: config.duration_secs,
            });
        }

        let start = seconds_to_duration(config.start_secs);
        let end = start.saturating_add(duration);
        if end > wave_duration {
            return Err(ConfigError::ImpulseExceedsWave {
                wave,
                impulse: index,
                end: end.as_secs_f32(),
                wave_duration: wave_duration.as_secs_f32(),
            });
        }

        Ok(Self {
            kind: config.kind,
            amount,
            start,
            duration,
            interval,
            strategy: config.strategy,
        })
    }

    /// Kind spawned by the impulse.
    #[must_use]
    pub const fn kind(&self) -> KindId {
        self.kind
    }

    /// Instances spawned per batch.
    #[must_use]
    pub const fn amount(&self) -> NonZeroU32 {
        self.amount
    }

    /// Offset from the wave start at which the impulse activates.
    #[must_use]
    pub const fn start(&self) -> Duration {
        self.start
    }

    /// Length of the activation window.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Time between consecutive batches.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Placement rule for spawned instances.
    #[must_use]
    pub const fn strategy(&self) -> PlacementStrategy {
        self.strategy
    }
}

/// Timed phase whose impulses all fit within its duration.
#[derive(Clone, Debug, PartialEq)]
pub struct Wave {
    duration: Duration,
    impulses: Vec<Impulse>,
}

impl Wave {
    /// Validates the wave at position `index` and every impulse inside it.
    pub fn from_config(index: usize, config: &WaveConfig) -> Result<Self, ConfigError> {
        let duration = seconds_to_duration(config.duration_secs);
        if duration.is_zero() {
            return Err(ConfigError::NonPositiveWaveDuration {
                wave: index,
                duration: config.duration_secs,
            });
        }

        let impulses = config
            .impulses
            .iter()
            .enumerate()
            .map(|(impulse, impulse_config)| {
                Impulse::from_config(index, impulse, impulse_config, duration)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { duration, impulses })
    }

    /// Length of the wave.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Impulses in declaration order.
    #[must_use]
    pub fn impulses(&self) -> &[Impulse] {
        &self.impulses
    }
}

/// Live firing state of one impulse within the running wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImpulseRunner {
    impulse: usize,
    next_spawn_offset: Duration,
}

impl ImpulseRunner {
    /// Creates a runner for the impulse at `impulse` that fires on activation.
    #[must_use]
    pub const fn new(impulse: usize) -> Self {
        Self {
            impulse,
            next_spawn_offset: Duration::ZERO,
        }
    }

    /// Index of the impulse within its wave.
    #[must_use]
    pub const fn impulse(&self) -> usize {
        self.impulse
    }

    /// Offset from activation at which the next batch fires.
    #[must_use]
    pub const fn next_spawn_offset(&self) -> Duration {
        self.next_spawn_offset
    }

    /// Decides whether a batch fires at wave time `elapsed`.
    ///
    /// At most one batch fires per call. The offset always advances by one
    /// interval, so batches missed by a long tick are caught up on later
    /// ticks rather than skipped.
    pub fn poll(&mut self, elapsed: Duration, impulse: &Impulse) -> bool {
        let Some(local) = elapsed.checked_sub(impulse.start) else {
            return false;
        };
        if local >= impulse.duration || local < self.next_spawn_offset {
            return false;
        }

        self.next_spawn_offset = self.next_spawn_offset.saturating_add(impulse.interval);
        true
    }
}
