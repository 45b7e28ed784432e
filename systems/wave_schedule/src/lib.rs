#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave schedule responsible for emitting timed spawn commands.

mod placement;
mod wave;

use std::time::Duration;

use arena_waves_core::{Command, ConfigError, Event, WaveConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

pub use placement::SpawnAnchor;
pub use wave::{Impulse, ImpulseRunner, Wave};

const PLACEMENT_STREAM_LABEL: &str = "placement";

/// Configuration parameters required to construct the wave schedule.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
    loop_waves: bool,
}

impl Config {
    /// Creates a new configuration using the provided seed and looping rule.
    #[must_use]
    pub const fn new(rng_seed: u64, loop_waves: bool) -> Self {
        Self {
            rng_seed,
            loop_waves,
        }
    }
}

/// Pure system that advances through timed waves and emits spawn commands.
#[derive(Debug)]
pub struct WaveSchedule {
    waves: Vec<Wave>,
    loop_waves: bool,
    seed: u64,
    active: bool,
    current: Option<usize>,
    elapsed: Duration,
    runners: Vec<ImpulseRunner>,
    cycle: u64,
    rng: ChaCha8Rng,
}

impl WaveSchedule {
    /// Validates every wave and builds an idle schedule.
    pub fn from_config(waves: &[WaveConfig], config: Config) -> Result<Self, ConfigError> {
        let waves = waves
            .iter()
            .enumerate()
            .map(|(index, wave)| Wave::from_config(index, wave))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            waves,
            loop_waves: config.loop_waves,
            seed: config.rng_seed,
            active: false,
            current: None,
            elapsed: Duration::ZERO,
            runners: Vec::new(),
            cycle: 0,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        })
    }

    /// Starts the next wave: the first one on a fresh schedule, otherwise the
    /// one after the current, wrapping when looping is enabled.
    ///
    /// A non-looping schedule that has played its last wave becomes idle.
    pub fn start(&mut self) {
        if self.waves.is_empty() {
            self.go_idle();
            return;
        }

        let next = match self.current {
            None => 0,
            Some(index) if index + 1 < self.waves.len() => index + 1,
            Some(_) if self.loop_waves => {
                self.cycle = self.cycle.saturating_add(1);
                0
            }
            Some(_) => {
                info!(cycle = self.cycle, "final wave complete; schedule idle");
                self.go_idle();
                return;
            }
        };

        self.current = Some(next);
        self.elapsed = Duration::ZERO;
        self.active = true;
        self.runners = (0..self.waves[next].impulses().len())
            .map(ImpulseRunner::new)
            .collect();
        self.rng = ChaCha8Rng::seed_from_u64(derive_wave_seed(self.seed, self.cycle, next));
        info!(
            wave = next + 1,
            cycle = self.cycle,
            impulses = self.runners.len(),
            "wave started"
        );
    }

    /// Forces the schedule idle and restarts it at the first wave.
    pub fn reset(&mut self) {
        self.go_idle();
        self.current = None;
        self.cycle = 0;
        self.start();
    }

    /// Advances the running wave by `dt`, emitting spawn commands for every
    /// batch that fires.
    pub fn tick(&mut self, dt: Duration, anchor: &SpawnAnchor, out: &mut Vec<Command>) {
        if !self.active {
            return;
        }
        let Some(index) = self.current else {
            return;
        };

        self.elapsed = self.elapsed.saturating_add(dt);
        let wave = &self.waves[index];
        if self.elapsed >= wave.duration() {
            debug!(wave = index + 1, "wave duration reached");
            self.start();
            return;
        }

        for runner in &mut self.runners {
            let impulse = &wave.impulses()[runner.impulse()];
            if !runner.poll(self.elapsed, impulse) {
                continue;
            }

            debug!(
                wave = index + 1,
                impulse = runner.impulse(),
                kind = impulse.kind().get(),
                amount = impulse.amount().get(),
                "impulse fired"
            );
            for _ in 0..impulse.amount().get() {
                let angle = placement::sample_angle(impulse.strategy(), &mut self.rng);
                out.push(Command::Spawn {
                    kind: impulse.kind(),
                    position: anchor.position_at(angle),
                    orientation: placement::SPAWN_ORIENTATION,
                });
            }
        }
    }

    /// Consumes world events, ticking once for every reported time step.
    pub fn handle(&mut self, events: &[Event], anchor: &SpawnAnchor, out: &mut Vec<Command>) {
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                self.tick(*dt, anchor, out);
            }
        }
    }

    /// Time spent in the current wave.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Zero-based index of the current wave, if one has started.
    #[must_use]
    pub const fn wave_index(&self) -> Option<usize> {
        self.current
    }

    /// One-based wave number for display; zero before the first wave.
    #[must_use]
    pub fn wave_display(&self) -> usize {
        self.current.map_or(0, |index| index + 1)
    }

    /// Whether a wave is currently running.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Number of runners attached to the current wave.
    #[must_use]
    pub fn runner_count(&self) -> usize {
        self.runners.len()
    }

    /// Runners of the current wave in declaration order.
    #[must_use]
    pub fn runners(&self) -> &[ImpulseRunner] {
        &self.runners
    }

    /// Number of configured waves.
    #[must_use]
    pub fn wave_count(&self) -> usize {
        self.waves.len()
    }

    /// Completed passes through the wave list.
    #[must_use]
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Duration of the current wave, if one has started.
    #[must_use]
    pub fn current_wave_duration(&self) -> Option<Duration> {
        self.current.map(|index| self.waves[index].duration())
    }

    fn go_idle(&mut self) {
        self.active = false;
        self.elapsed = Duration::ZERO;
        self.runners.clear();
    }
}

fn derive_wave_seed(global_seed: u64, cycle: u64, wave: usize) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(global_seed.to_le_bytes());
    hasher.update(cycle.to_le_bytes());
    hasher.update((wave as u64).to_le_bytes());
    hasher.update(PLACEMENT_STREAM_LABEL.as_bytes());
    finalize_seed(hasher)
}

fn finalize_seed(hasher: Sha256) -> u64 {
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use arena_waves_core::{ImpulseConfig, KindId, PlacementStrategy};
    use glam::Vec3;

    use super::*;

    fn wave(duration: f32, impulses: Vec<ImpulseConfig>) -> WaveConfig {
        WaveConfig {
            duration_secs: duration,
            impulses,
        }
    }

    fn impulse(start: f32, duration: f32, interval: f32, amount: u32) -> ImpulseConfig {
        ImpulseConfig {
            kind: KindId::new(1),
            amount,
            start_secs: start,
            duration_secs: duration,
            interval_secs: interval,
            strategy: PlacementStrategy::Random,
        }
    }

    fn anchor() -> SpawnAnchor {
        SpawnAnchor::new(Vec3::ZERO, 5.0).expect("anchor")
    }

    #[test]
    fn schedule_is_idle_until_started() {
        let mut schedule = WaveSchedule::from_config(
            &[wave(5.0, vec![impulse(0.0, 5.0, 1.0, 1)])],
            Config::new(0, true),
        )
        .expect("schedule");
        let mut out = Vec::new();
        schedule.tick(Duration::from_secs(1), &anchor(), &mut out);

        assert!(out.is_empty());
        assert!(!schedule.is_active());
        assert_eq!(schedule.wave_display(), 0);
    }

    #[test]
    fn transition_tick_fires_nothing() {
        let mut schedule = WaveSchedule::from_config(
            &[
                wave(2.0, vec![impulse(0.0, 2.0, 1.0, 1)]),
                wave(2.0, vec![impulse(0.0, 2.0, 1.0, 1)]),
            ],
            Config::new(0, true),
        )
        .expect("schedule");
        schedule.start();

        let mut out = Vec::new();
        schedule.tick(Duration::from_millis(2_500), &anchor(), &mut out);

        assert!(out.is_empty());
        assert_eq!(schedule.wave_index(), Some(1));
        assert_eq!(schedule.elapsed(), Duration::ZERO);
    }

    #[test]
    fn non_looping_schedule_goes_idle() {
        let mut schedule =
            WaveSchedule::from_config(&[wave(1.0, Vec::new())], Config::new(0, false))
                .expect("schedule");
        schedule.start();

        let mut out = Vec::new();
        schedule.tick(Duration::from_secs(1), &anchor(), &mut out);
        assert!(!schedule.is_active());

        schedule.reset();
        assert!(schedule.is_active());
        assert_eq!(schedule.wave_index(), Some(0));
    }

    #[test]
    fn empty_schedule_never_activates() {
        let mut schedule = WaveSchedule::from_config(&[], Config::new(0, true)).expect("schedule");
        schedule.start();
        assert!(!schedule.is_active());
        assert_eq!(schedule.wave_display(), 0);
    }

    #[test]
    fn wave_seeds_differ_per_cycle_and_wave() {
        let base = derive_wave_seed(7, 0, 0);
        assert_eq!(base, derive_wave_seed(7, 0, 0));
        assert_ne!(base, derive_wave_seed(7, 1, 0));
        assert_ne!(base, derive_wave_seed(7, 0, 1));
        assert_ne!(base, derive_wave_seed(8, 0, 0));
    }

    #[test]
    fn placement_stream_is_pinned() {
        assert_eq!(derive_wave_seed(7, 0, 0), 0x710a_b880_853a_10d2);
        assert_eq!(derive_wave_seed(7, 1, 0), 0x7b3b_bc57_c486_76d0);
        assert_eq!(derive_wave_seed(7, 0, 1), 0x6e59_9f8c_d947_72e4);

        let mut rng = ChaCha8Rng::seed_from_u64(derive_wave_seed(7, 0, 0));
        let random: Vec<u32> = (0..4)
            .map(|_| placement::sample_angle(PlacementStrategy::Random, &mut rng).to_bits())
            .collect();
        assert_eq!(random, vec![0x4294_dd6e, 0x42c9_965b, 0x4361_44d9, 0x42f9_e364]);

        let section = PlacementStrategy::Section {
            angle_start: 90.0,
            angle_end: 180.0,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(derive_wave_seed(7, 0, 1));
        let section: Vec<u32> = (0..4)
            .map(|_| placement::sample_angle(section, &mut rng).to_bits())
            .collect();
        assert_eq!(section, vec![0x42fa_a334, 0x42de_dcb3, 0x432f_f740, 0x4330_0e70]);
    }

    #[test]
    fn wave_lengths_follow_the_running_wave() {
        let mut schedule = WaveSchedule::from_config(
            &[wave(2.0, Vec::new()), wave(3.5, Vec::new())],
            Config::new(0, true),
        )
        .expect("schedule");
        assert_eq!(schedule.wave_count(), 2);
        assert_eq!(schedule.current_wave_duration(), None);

        schedule.start();
        assert_eq!(schedule.current_wave_duration(), Some(Duration::from_secs(2)));

        let mut out = Vec::new();
        schedule.tick(Duration::from_secs(2), &anchor(), &mut out);
        assert_eq!(
            schedule.current_wave_duration(),
            Some(Duration::from_millis(3_500))
        );
    }
}
