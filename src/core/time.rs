//! Frame timing for the demo loop

use std::time::{Duration, Instant};

/// Tracks frame delta and a once-per-second FPS figure
pub struct FrameTimer {
    last_frame: Instant,
    delta: Duration,
    frame_count: u64,
    fps_timer: Instant,
    fps_frame_count: u32,
    fps: f32,
}

impl FrameTimer {
    /// Create a new frame timer
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(now: Instant) -> Self {
        Self {
            last_frame: now,
            delta: Duration::ZERO,
            frame_count: 0,
            fps_timer: now,
            fps_frame_count: 0,
            fps: 0.0,
        }
    }

    /// Call once per frame
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    fn tick_at(&mut self, now: Instant) {
        self.delta = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        self.frame_count += 1;
        self.fps_frame_count += 1;

        let fps_elapsed = now.saturating_duration_since(self.fps_timer);
        if fps_elapsed >= Duration::from_secs(1) {
            self.fps = self.fps_frame_count as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = 0;
            self.fps_timer = now;
        }
    }

    /// Delta time in seconds, clamped to 250 ms
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32().min(0.25)
    }

    /// FPS, refreshed every second
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Total frames ticked
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_after_one_second() {
        let start = Instant::now();
        let mut timer = FrameTimer::starting_at(start);
        for i in 1..=60u64 {
            timer.tick_at(start + Duration::from_micros(i * 1_000_000 / 60));
        }
        assert_eq!(timer.frame_count(), 60);
        assert!((timer.fps() - 60.0).abs() < 0.5);
    }

    #[test]
    fn test_delta_is_clamped() {
        let start = Instant::now();
        let mut timer = FrameTimer::starting_at(start);
        timer.tick_at(start + Duration::from_secs(3));
        assert_eq!(timer.delta_secs(), 0.25);
    }
}
