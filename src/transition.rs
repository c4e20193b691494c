//! The shared transition clock and raised-cosine easing.
//!
//! One clock governs every channel: each channel eases from its own `value`
//! to its own `target`, but all of them share the start time and duration.

use core::f32::consts::PI;

/// Outcome of a single interpolation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransitionStatus {
    /// No transition active. Nothing was written.
    Idle,

    /// Transition in progress. Intermediate intensities were written.
    InProgress,

    /// Transition finished on this tick. Final intensities were written.
    Completed,
}

/// Start time and duration of the active transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransitionClock {
    start_ms: u64,
    duration_ms: u32,
    reached: bool,
}

impl TransitionClock {
    /// A clock with no active transition.
    pub const fn idle() -> Self {
        Self {
            start_ms: 0,
            duration_ms: 0,
            reached: true,
        }
    }

    /// Starts a new transition, discarding any in flight.
    pub fn restart(&mut self, now_ms: u64, duration_ms: u32) {
        self.start_ms = now_ms;
        self.duration_ms = duration_ms;
        self.reached = false;
    }

    /// Fraction of the transition elapsed at `now_ms`, in `0.0..1.0`.
    ///
    /// Returns `None` once the full duration has passed, which includes every
    /// zero-length transition.
    pub fn progress(&self, now_ms: u64) -> Option<f32> {
        let elapsed = now_ms.saturating_sub(self.start_ms);
        if elapsed < self.duration_ms as u64 {
            Some(elapsed as f32 / self.duration_ms as f32)
        } else {
            None
        }
    }

    pub(crate) fn finish(&mut self) {
        self.reached = true;
    }

    pub fn start_ms(&self) -> u64 {
        self.start_ms
    }

    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }

    /// True when the last transition has completed.
    pub fn reached(&self) -> bool {
        self.reached
    }
}

impl Default for TransitionClock {
    fn default() -> Self {
        Self::idle()
    }
}

/// Raised-cosine ease: `0.5·cos(π·t + π) + 0.5`.
///
/// Zero at `t = 0`, one at `t = 1`, with zero slope at both ends.
#[inline]
pub fn ease(progress: f32) -> f32 {
    let progress = progress.clamp(0.0, 1.0);
    (0.5 * libm::cosf(PI * progress + PI) + 0.5).clamp(0.0, 1.0)
}

/// Moves `factor` of the way from `from` to `to`, truncating.
#[inline]
pub fn interpolate(from: u16, to: u16, factor: f32) -> u16 {
    let from = from as f32;
    (from + factor * (to as f32 - from)) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ease_endpoints() {
        assert!(ease(0.0).abs() < 1e-6);
        assert!((ease(1.0) - 1.0).abs() < 1e-6);
        assert!((ease(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn ease_is_monotonic() {
        let mut previous = ease(0.0);
        for step in 1..=1000 {
            let current = ease(step as f32 / 1000.0);
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn ease_is_flat_at_both_ends() {
        // Slope near the ends is far below the linear slope of 1
        assert!(ease(0.01) < 0.001);
        assert!(1.0 - ease(0.99) < 0.001);
    }

    #[test]
    fn interpolate_handles_both_directions() {
        assert_eq!(interpolate(1000, 3000, 0.0), 1000);
        assert_eq!(interpolate(1000, 3000, 0.5), 2000);
        assert_eq!(interpolate(3000, 1000, 0.5), 2000);
        assert_eq!(interpolate(0, 65535, 1.0), 65535);
    }

    #[test]
    fn progress_runs_until_duration() {
        let mut clock = TransitionClock::idle();
        clock.restart(1000, 400);
        assert_eq!(clock.progress(1000), Some(0.0));
        assert_eq!(clock.progress(1100), Some(0.25));
        assert_eq!(clock.progress(1400), None);
        assert!(!clock.reached());
    }

    #[test]
    fn zero_duration_completes_immediately() {
        let mut clock = TransitionClock::idle();
        clock.restart(50, 0);
        assert_eq!(clock.progress(50), None);
    }
}
