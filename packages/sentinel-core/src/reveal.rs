//! reveal.rs — Hold timer for the post-detection reveal
//!
//! Once the clock holds on the detection frame the scenario time is frozen,
//! but the decision checklist keeps animating. This timer measures frame
//! time since the hold and is torn down with everything else on reset.

use crate::timing::RevealSchedule;

#[derive(Debug, Clone, Default)]
pub struct HoldTimer {
    anchor_ms: Option<f64>,
    since_ms: f64,
}

impl HoldTimer {
    pub fn arm(&mut self, now_ms: f64) {
        self.anchor_ms = Some(now_ms);
        self.since_ms = 0.0;
    }

    /// Milliseconds since the hold, or `None` before it.
    pub fn since_ms(&self) -> Option<f64> {
        self.anchor_ms.map(|_| self.since_ms)
    }

    pub fn sample(&mut self, now_ms: f64) -> f64 {
        if let Some(anchor) = self.anchor_ms {
            self.since_ms = (now_ms - anchor).max(self.since_ms);
        }
        self.since_ms
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl RevealSchedule {
    /// Spinner still up at `since_ms` after the hold.
    pub fn is_deciding(&self, since_ms: f64) -> bool {
        since_ms < self.deciding_until_ms as f64
    }

    /// Every step has been appended.
    pub fn is_complete(&self, revealed: usize) -> bool {
        revealed >= self.steps.len()
    }
}
