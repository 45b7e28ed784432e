#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that sequences the clear-then-restart of the wave schedule.
//!
//! A reset runs in two phases. The request releases every live instance
//! immediately; the schedule restart waits for the next reported time step so
//! that the release settles before wave 0 begins spawning again.

use arena_waves_core::{Command, EntityHandle, Event};
use tracing::info;

/// Instruction returned to the simulation after inspecting a tick's events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetDirective {
    /// Keep ticking the schedule as-is.
    Continue,
    /// Restart the schedule at wave 0 instead of ticking it this step.
    RestartSchedule,
}

/// Two-phase reset request tracker.
#[derive(Debug, Default)]
pub struct ResetSequence {
    pending: bool,
    released: usize,
}

impl ResetSequence {
    /// Creates a tracker with no reset in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the first phase: emits a release for every live handle and arms
    /// the schedule restart.
    ///
    /// Requesting again while a reset is pending releases whatever is live now
    /// and still restarts only once.
    pub fn request(&mut self, live: &[EntityHandle], out: &mut Vec<Command>) {
        out.extend(live.iter().map(|&handle| Command::Release { handle }));
        self.released = self.released.saturating_add(live.len());
        self.pending = true;
        info!(released = live.len(), "wave reset requested");
    }

    /// Runs the second phase once a time step has passed since the request.
    pub fn handle(&mut self, events: &[Event]) -> ResetDirective {
        if !self.pending {
            return ResetDirective::Continue;
        }

        let time_advanced = events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }));
        if !time_advanced {
            return ResetDirective::Continue;
        }

        info!(released = self.released, "wave schedule restarting");
        self.pending = false;
        self.released = 0;
        ResetDirective::RestartSchedule
    }

    /// Whether a restart is waiting for the next time step.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use arena_waves_core::KindId;

    use super::*;

    #[test]
    fn idle_sequence_never_restarts() {
        let mut reset = ResetSequence::new();
        let directive = reset.handle(&[Event::TimeAdvanced {
            dt: Duration::from_millis(16),
        }]);
        assert_eq!(directive, ResetDirective::Continue);
    }

    #[test]
    fn repeated_requests_restart_once() {
        let mut reset = ResetSequence::new();
        let mut commands = Vec::new();
        let handle = EntityHandle::new(KindId::new(1), 0, 0);
        reset.request(&[handle], &mut commands);
        reset.request(&[], &mut commands);

        assert_eq!(commands, vec![Command::Release { handle }]);
        let tick = [Event::TimeAdvanced {
            dt: Duration::from_millis(16),
        }];
        assert_eq!(reset.handle(&tick), ResetDirective::RestartSchedule);
        assert_eq!(reset.handle(&tick), ResetDirective::Continue);
    }
}
