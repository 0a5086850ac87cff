//! Monotonic frame timer.
//!
//! Read once per frame by the scene; the simulation sees elapsed and delta
//! seconds, the panel sees the frame rate.

use std::time::{Duration, Instant};

/// Weight of the newest frame in the frame-rate average.
const FPS_SMOOTHING: f32 = 0.1;

/// Longest step handed to the simulation.
const MAX_DELTA: Duration = Duration::from_millis(100);

/// Frame clock with a capped delta and a smoothed frame rate.
#[derive(Debug, Clone)]
pub struct Time {
    started: Instant,
    previous: Instant,
    delta: Duration,
    fps: f32,
}

impl Time {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(now: Instant) -> Self {
        Self {
            started: now,
            previous: now,
            delta: Duration::ZERO,
            fps: 0.0,
        }
    }

    /// Advances one frame and returns `(elapsed, delta)` in seconds.
    pub fn update(&mut self) -> (f32, f32) {
        self.tick(Instant::now())
    }

    fn tick(&mut self, now: Instant) -> (f32, f32) {
        let raw = now.saturating_duration_since(self.previous);
        self.previous = now;
        self.delta = raw.min(MAX_DELTA);

        let seconds = raw.as_secs_f32();
        if seconds > 0.0 {
            let instant_fps = 1.0 / seconds;
            self.fps = if self.fps == 0.0 {
                instant_fps
            } else {
                self.fps + (instant_fps - self.fps) * FPS_SMOOTHING
            };
        }

        (self.elapsed(), self.delta())
    }

    /// Seconds since the clock started. Not capped.
    pub fn elapsed(&self) -> f32 {
        self.previous.duration_since(self.started).as_secs_f32()
    }

    /// Seconds covered by the last frame, at most the cap.
    pub fn delta(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}
