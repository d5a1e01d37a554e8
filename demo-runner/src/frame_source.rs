//! frame_source.rs — Synthetic display-refresh timestamps
//!
//! Turns a monotonic base clock into the timestamps a browser would hand to
//! a frame callback: scaled by the playback speed, optionally jittered, and
//! with every Nth frame dropped to rehearse the gate catch-up path. Output
//! never goes backwards.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::config::PlaybackConfig;

pub struct FrameSchedule {
    speed: f64,
    jitter: Option<Normal<f64>>,
    drop_every: u32,
    rng: StdRng,
    frame: u64,
    last_ms: f64,
}

impl FrameSchedule {
    pub fn new(playback: &PlaybackConfig, seed: Option<u64>) -> Self {
        let jitter = if playback.jitter_ms > 0.0 {
            Normal::new(0.0, playback.jitter_ms).ok()
        } else {
            None
        };
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            speed: playback.speed,
            jitter,
            drop_every: playback.drop_every,
            rng,
            frame: 0,
            last_ms: 0.0,
        }
    }

    /// Frames delivered or dropped so far.
    pub fn frames(&self) -> u64 {
        self.frame
    }

    /// Timestamp for the next frame, or `None` when this frame is dropped.
    pub fn next(&mut self, base_ms: f64) -> Option<f64> {
        self.frame += 1;
        if self.drop_every > 0 && self.frame % u64::from(self.drop_every) == 0 {
            return None;
        }
        let noise = match &self.jitter {
            Some(dist) => dist.sample(&mut self.rng),
            None => 0.0,
        };
        let stamped = (base_ms * self.speed + noise).max(self.last_ms);
        self.last_ms = stamped;
        Some(stamped)
    }
}
