//! Time utilities for the battle simulation

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Frame cadence the simulation is tuned for
pub const TARGET_FPS: u32 = 60;

/// Upper bound on a single tick's delta time, in seconds. Frame gaps longer
/// than this are clamped so a stall never turns into a simulation jump.
pub const MAX_TICK_DELTA: f32 = 1.0 / TARGET_FPS as f32;

/// Delta time between two frame timestamps, clamped to [`MAX_TICK_DELTA`]
pub fn clamp_frame_delta(last: f64, now: f64) -> f32 {
    let dt = (now - last).max(0.0) as f32;
    dt.min(MAX_TICK_DELTA)
}

/// Monotonic seconds source for driving the frame callback from a real clock
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Seconds elapsed since the clock was created
    pub fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_delta_clamped_after_stall() {
        assert_eq!(clamp_frame_delta(0.0, 2.0), MAX_TICK_DELTA);
    }

    #[test]
    fn test_frame_delta_passes_short_gaps() {
        let dt = clamp_frame_delta(1.0, 1.005);
        assert!((dt - 0.005).abs() < 1e-6);
    }

    #[test]
    fn test_frame_delta_never_negative() {
        assert_eq!(clamp_frame_delta(5.0, 4.0), 0.0);
    }
}
