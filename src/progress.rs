//! Cosmetic loading progress
//!
//! Engines report no byte-level progress, so the spinner shows a ramp that
//! climbs in fixed steps and stalls short of completion until the load ends.
//! Nothing in the session's state machine reads this value.

use std::time::Duration;

/// How often a host should call [`ProgressEstimator::advance`]
pub const PROGRESS_TICK: Duration = Duration::from_millis(100);

/// Fake progress ramp for a loading spinner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEstimator {
    progress: f32,
    step: f32,
    ceiling: f32,
}

impl Default for ProgressEstimator {
    fn default() -> Self {
        Self {
            progress: 0.0,
            step: 0.1,
            ceiling: 0.9,
        }
    }
}

impl ProgressEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart the ramp from zero
    pub fn start(&mut self) {
        self.progress = 0.0;
    }

    /// Move one step forward, never past the ceiling
    pub fn advance(&mut self) -> f32 {
        self.progress = (self.progress + self.step).min(self.ceiling);
        self.progress
    }

    pub fn finish(&mut self) {
        self.progress = 1.0;
    }

    pub fn reset(&mut self) {
        self.progress = 0.0;
    }

    /// Current progress in `0.0..=1.0`
    pub fn progress(&self) -> f32 {
        self.progress
    }
}
