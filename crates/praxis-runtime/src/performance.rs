// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Rolling tick-duration monitor used for adaptive pacing.

use std::time::{Duration, Instant};

/// Number of recent tick durations kept
pub const FRAME_WINDOW: usize = 60;

/// Fixed ring buffer of the most recent tick durations
///
/// Owned by the loop thread; callers read derived values, never the buffer.
#[derive(Debug, Clone)]
pub struct PerformanceMonitor {
    samples_ms: [f64; FRAME_WINDOW],
    cursor: usize,
    filled: usize,
    last_frame: Instant,
    /// False until a tick boundary is known; the first call only marks it
    primed: bool,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Monitor whose first sample is measured from `origin`
    pub fn starting_at(origin: Instant) -> Self {
        Self {
            samples_ms: [0.0; FRAME_WINDOW],
            cursor: 0,
            filled: 0,
            last_frame: origin,
            primed: true,
        }
    }

    /// Record the time since the previous call (or since construction)
    pub fn frame_start(&mut self) {
        self.frame_start_at(Instant::now());
    }

    pub fn frame_start_at(&mut self, now: Instant) {
        if !self.primed {
            self.last_frame = now;
            self.primed = true;
            return;
        }
        let elapsed = now.saturating_duration_since(self.last_frame);
        self.samples_ms[self.cursor] = duration_ms(elapsed);
        self.cursor = (self.cursor + 1) % FRAME_WINDOW;
        self.filled = (self.filled + 1).min(FRAME_WINDOW);
        self.last_frame = now;
    }

    /// Mean of recorded samples in milliseconds, 0 when nothing is recorded
    pub fn average_frame_time(&self) -> f64 {
        if self.filled == 0 {
            return 0.0;
        }
        let total: f64 = self.samples_ms[..self.filled].iter().sum();
        total / self.filled as f64
    }

    /// Ticks per second from the mean; 0 means "insufficient data", not "stalled"
    pub fn fps(&self) -> f64 {
        let average = self.average_frame_time();
        if average > 0.0 {
            1000.0 / average
        } else {
            0.0
        }
    }

    pub fn sample_count(&self) -> usize {
        self.filled
    }

    /// Forget all samples; the next one is measured from `origin`
    pub fn reset_at(&mut self, origin: Instant) {
        *self = Self::starting_at(origin);
    }

    /// Forget all samples; the next `frame_start` records nothing and only
    /// marks the tick boundary the following sample is measured from
    pub fn reset(&mut self) {
        *self = Self::starting_at(Instant::now());
        self.primed = false;
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

fn duration_ms(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(monitor: &mut PerformanceMonitor, origin: Instant, steps_ms: &[u64]) -> Instant {
        let mut now = origin;
        for step in steps_ms {
            now += Duration::from_millis(*step);
            monitor.frame_start_at(now);
        }
        now
    }

    #[test]
    fn test_no_samples_means_zero_fps() {
        let monitor = PerformanceMonitor::new();
        assert_eq!(monitor.average_frame_time(), 0.0);
        assert_eq!(monitor.fps(), 0.0);
    }

    #[test]
    fn test_steady_ten_ms_ticks() {
        let origin = Instant::now();
        let mut monitor = PerformanceMonitor::starting_at(origin);
        feed(&mut monitor, origin, &[10, 10, 10, 10]);

        assert_eq!(monitor.sample_count(), 4);
        assert_eq!(monitor.average_frame_time(), 10.0);
        assert_eq!(monitor.fps(), 100.0);
    }

    #[test]
    fn test_window_overwrites_oldest() {
        let origin = Instant::now();
        let mut monitor = PerformanceMonitor::starting_at(origin);
        let now = feed(&mut monitor, origin, &[100; FRAME_WINDOW]);
        assert_eq!(monitor.average_frame_time(), 100.0);

        feed(&mut monitor, now, &[40; FRAME_WINDOW]);
        assert_eq!(monitor.sample_count(), FRAME_WINDOW);
        assert_eq!(monitor.average_frame_time(), 40.0);
        assert_eq!(monitor.fps(), 25.0);
    }

    #[test]
    fn test_zero_duration_ticks_report_zero_fps() {
        let origin = Instant::now();
        let mut monitor = PerformanceMonitor::starting_at(origin);
        monitor.frame_start_at(origin);
        assert_eq!(monitor.sample_count(), 1);
        assert_eq!(monitor.fps(), 0.0);
    }

    #[test]
    fn test_reset_forgets_samples() {
        let origin = Instant::now();
        let mut monitor = PerformanceMonitor::starting_at(origin);
        let now = feed(&mut monitor, origin, &[5, 5]);
        monitor.reset_at(now);
        assert_eq!(monitor.sample_count(), 0);
    }

    #[test]
    fn test_first_tick_after_reset_records_nothing() {
        let origin = Instant::now();
        let mut monitor = PerformanceMonitor::starting_at(origin);
        feed(&mut monitor, origin, &[5, 5]);
        monitor.reset();

        // Setup time before the first tick must not count as a sample
        let first = Instant::now() + Duration::from_micros(1);
        monitor.frame_start_at(first);
        assert_eq!(monitor.sample_count(), 0);
        assert_eq!(monitor.fps(), 0.0);

        feed(&mut monitor, first, &[20, 20, 20]);
        assert_eq!(monitor.sample_count(), 3);
        assert_eq!(monitor.average_frame_time(), 20.0);
        assert_eq!(monitor.fps(), 50.0);
    }
}
