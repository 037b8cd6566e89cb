//! Wall-clock timing for the host frame loop.
//!
//! [`FrameClock`] supplies the millisecond timestamps the
//! [`AnimationLoop`](crate::animation::AnimationLoop) turns into `dt`, and a
//! smoothed FPS figure for the window title. The per-frame FPS readout drawn
//! on the canvas is computed from `dt` directly and does not use this.
//!
//! # Example
//!
//! ```ignore
//! use glowfall::time::FrameClock;
//!
//! let mut clock = FrameClock::new();
//!
//! // In your frame callback:
//! let now = clock.now_ms();
//! if clock.tick() {
//!     println!("FPS: {:.1}", clock.fps());
//! }
//! ```

use std::time::{Duration, Instant};

/// Monotonic frame timing with periodic FPS averaging.
#[derive(Debug)]
pub struct FrameClock {
    /// When the clock was created.
    start: Instant,
    /// Total frames ticked.
    frame_count: u64,
    /// Averaged FPS (updated periodically).
    fps: f32,
    /// Frame count at last FPS update.
    fps_frame_count: u64,
    /// Time of last FPS calculation.
    fps_update_time: Instant,
    /// How often to update FPS calculation.
    fps_update_interval: Duration,
}

impl FrameClock {
    /// Create a clock starting from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
        }
    }

    /// Change how often the averaged FPS is recomputed.
    pub fn with_fps_interval(mut self, interval: Duration) -> Self {
        self.fps_update_interval = interval;
        self
    }

    /// Milliseconds since the clock was created.
    #[inline]
    pub fn now_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Record a rendered frame.
    ///
    /// Returns `true` when the averaged FPS was just recomputed.
    pub fn tick(&mut self) -> bool {
        self.frame_count += 1;

        let now = Instant::now();
        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed < self.fps_update_interval {
            return false;
        }
        let frames_since = self.frame_count - self.fps_frame_count;
        self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
        self.fps_frame_count = self.frame_count;
        self.fps_update_time = now;
        true
    }

    /// Averaged frames per second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Total frames ticked.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
