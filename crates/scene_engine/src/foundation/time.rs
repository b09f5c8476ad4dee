//! Time management utilities

use std::time::{Duration, Instant};

/// High-precision timer for frame timing
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Seconds elapsed since the last accepted frame, without consuming them
    pub fn pending_delta(&self) -> f32 {
        self.last_frame.elapsed().as_secs_f32()
    }

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);
        self.advance(elapsed.as_secs_f32());
        self.last_frame = now;
    }

    /// Advance the timer by an explicit delta
    pub fn advance(&mut self, delta_time: f32) {
        self.delta_time = delta_time;
        self.total_time += delta_time;
        self.frame_count += 1;
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the current FPS (based on last frame time)
    pub fn current_fps(&self) -> f32 {
        if self.delta_time > 0.0 {
            1.0 / self.delta_time
        } else {
            0.0
        }
    }
}

/// Simple stopwatch for measuring elapsed time
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time {
            self.elapsed += start.elapsed();
            self.start_time = None;
        }
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        let current_elapsed = self.start_time.map_or(Duration::ZERO, |start| start.elapsed());
        self.elapsed + current_elapsed
    }

    /// Get the elapsed time in milliseconds
    pub fn elapsed_millis(&self) -> f32 {
        self.elapsed().as_secs_f32() * 1000.0
    }
}

/// Frame statistics averaged over roughly one second windows
#[derive(Debug, Clone)]
pub struct FrameStats {
    acc_time: f32,
    acc_logic_ms: f32,
    acc_render_ms: f32,
    frame_count: u32,
    curr_min_delta: f32,
    curr_max_delta: f32,

    /// Frames per second of the last completed window
    pub avg_fps: f32,
    /// Average frame time in milliseconds
    pub avg_ms: f32,
    /// Shortest frame of the last window in milliseconds
    pub min_ms: f32,
    /// Longest frame of the last window in milliseconds
    pub max_ms: f32,
    /// Average scene update time in milliseconds
    pub avg_logic_ms: f32,
    /// Average render submission time in milliseconds
    pub avg_render_ms: f32,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameStats {
    /// Create empty statistics
    pub fn new() -> Self {
        Self {
            acc_time: 0.0,
            acc_logic_ms: 0.0,
            acc_render_ms: 0.0,
            frame_count: 0,
            curr_min_delta: f32::MAX,
            curr_max_delta: 0.0,
            avg_fps: 0.0,
            avg_ms: 0.0,
            min_ms: 0.0,
            max_ms: 0.0,
            avg_logic_ms: 0.0,
            avg_render_ms: 0.0,
        }
    }

    /// Record one frame; returns true when a one second window completed
    pub fn record(&mut self, delta: f32, logic_ms: f32, render_ms: f32) -> bool {
        self.acc_time += delta;
        self.acc_logic_ms += logic_ms;
        self.acc_render_ms += render_ms;
        self.frame_count += 1;
        self.curr_min_delta = self.curr_min_delta.min(delta);
        self.curr_max_delta = self.curr_max_delta.max(delta);

        if self.acc_time <= 1.0 {
            return false;
        }

        #[allow(clippy::cast_precision_loss)]
        let frames = self.frame_count as f32;
        self.avg_ms = self.acc_time / frames * 1000.0;
        self.avg_fps = 1000.0 / self.avg_ms;
        self.min_ms = self.curr_min_delta * 1000.0;
        self.max_ms = self.curr_max_delta * 1000.0;
        self.avg_logic_ms = self.acc_logic_ms / frames;
        self.avg_render_ms = self.acc_render_ms / frames;

        self.acc_time = 0.0;
        self.acc_logic_ms = 0.0;
        self.acc_render_ms = 0.0;
        self.frame_count = 0;
        self.curr_min_delta = f32::MAX;
        self.curr_max_delta = 0.0;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_timer_advance() {
        let mut timer = Timer::new();
        timer.advance(0.5);
        timer.advance(0.25);
        assert_eq!(timer.frame_count(), 2);
        assert_relative_eq!(timer.total_time(), 0.75);
        assert_relative_eq!(timer.current_fps(), 4.0);
    }

    #[test]
    fn test_frame_stats_window() {
        let mut stats = FrameStats::new();
        let mut completed = false;
        for _ in 0..4 {
            assert!(!stats.record(0.25, 2.0, 4.0));
        }
        completed |= stats.record(0.25, 2.0, 4.0);
        assert!(completed);
        assert_relative_eq!(stats.avg_ms, 250.0, epsilon = 1e-3);
        assert_relative_eq!(stats.avg_fps, 4.0, epsilon = 1e-3);
        assert_relative_eq!(stats.avg_logic_ms, 2.0, epsilon = 1e-4);
        assert_relative_eq!(stats.max_ms, 250.0, epsilon = 1e-3);
    }
}
