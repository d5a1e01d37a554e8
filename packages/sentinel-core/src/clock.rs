//! clock.rs — Scenario clock and time sources
//!
//! The clock never reads wall time itself. Each frame hands it a timestamp
//! (milliseconds, monotonically increasing) and the first frame after
//! `start()` becomes elapsed = 0. Tests drive it with a `ManualTimeSource`;
//! the runner uses `MonotonicTimeSource`.

use std::cell::Cell;
use std::time::Instant;

/// Anything that can stamp a frame, like a display-refresh callback would.
pub trait TimeSource {
    fn now_ms(&self) -> f64;
}

/// Instant-backed source, origin at construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicTimeSource {
    origin: Instant,
}

impl MonotonicTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTimeSource {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Synthetic timestamps for deterministic runs.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    now: Cell<f64>,
}

impl ManualTimeSource {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

// ── Scenario clock ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockSample {
    /// Not running; nothing sampled
    Stopped,
    /// Still below the stop threshold
    Advanced(f64),
    /// Reached the stop threshold this frame; value is the clamped threshold
    Reached(f64),
}

#[derive(Debug, Clone)]
pub struct ScenarioClock {
    running: bool,
    anchor_ms: Option<f64>,
    elapsed_sec: f64,
    stop_threshold_sec: f64,
}

impl ScenarioClock {
    pub fn new(stop_threshold_sec: f64) -> Self {
        Self {
            running: false,
            anchor_ms: None,
            elapsed_sec: 0.0,
            stop_threshold_sec,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed_sec(&self) -> f64 {
        self.elapsed_sec
    }

    pub fn stop_threshold_sec(&self) -> f64 {
        self.stop_threshold_sec
    }

    /// Begin producing samples. The next frame re-anchors elapsed = 0.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.anchor_ms = None;
    }

    /// Freeze at the last value.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn reset(&mut self, stop_threshold_sec: f64) {
        *self = Self::new(stop_threshold_sec);
    }

    pub fn sample(&mut self, now_ms: f64) -> ClockSample {
        if !self.running {
            return ClockSample::Stopped;
        }
        let anchor = *self.anchor_ms.get_or_insert(now_ms);
        // A timestamp older than the last sample never rewinds the clock
        let elapsed = ((now_ms - anchor) / 1000.0).max(self.elapsed_sec);

        if elapsed >= self.stop_threshold_sec {
            self.elapsed_sec = self.stop_threshold_sec;
            self.stop();
            ClockSample::Reached(self.elapsed_sec)
        } else {
            self.elapsed_sec = elapsed;
            ClockSample::Advanced(elapsed)
        }
    }
}
