//! risk.rs — Risk evaluator
//!
//! Pure mapping from (mode, elapsed time, table) to a risk level and a
//! countdown. Recomputed from scratch every frame; nothing accumulates here.

use sentinel_types::{RiskLevel, ScenarioMode};

use crate::timing::{RiskModel, TimingConfig};

/// The impact banner opens this long before the collision instant...
pub const COLLISION_LEAD_SEC: f64 = 0.5;
/// ...and stays up this long after it.
pub const COLLISION_TAIL_SEC: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    /// Non-null exactly when the level is CRITICAL (countdown) or COLLISION (0)
    pub time_to_hazard: Option<f64>,
}

impl RiskAssessment {
    pub const SAFE: Self = Self {
        level: RiskLevel::Safe,
        time_to_hazard: None,
    };

    fn critical(remaining: f64) -> Self {
        Self {
            level: RiskLevel::Critical,
            time_to_hazard: Some(remaining),
        }
    }

    fn collision() -> Self {
        Self {
            level: RiskLevel::Collision,
            time_to_hazard: Some(0.0),
        }
    }
}

/// `prior` is only consulted by the bounded-window model, which keeps the
/// previous assessment while impact is still outside the window.
pub fn evaluate(
    mode: ScenarioMode,
    elapsed_sec: f64,
    config: &TimingConfig,
    prior: RiskAssessment,
) -> RiskAssessment {
    let video_time = config.video_time(mode, elapsed_sec);
    let remaining = config.predicted_collision_time_sec - video_time;

    match mode {
        ScenarioMode::Passive => passive_window(remaining),
        ScenarioMode::Active => match config.risk_model {
            RiskModel::DetectionGated => {
                detection_gated(video_time, config.cues.detect_at_sec, remaining)
            }
            RiskModel::BoundedWindow { window_sec } => bounded_window(remaining, window_sec, prior),
        },
    }
}

/// COLLISION while `-2.0 < remaining <= 0.5`.
pub fn passive_window(remaining: f64) -> RiskAssessment {
    if remaining <= COLLISION_LEAD_SEC && remaining > -COLLISION_TAIL_SEC {
        RiskAssessment::collision()
    } else {
        RiskAssessment::SAFE
    }
}

pub fn detection_gated(video_time: f64, detect_at_sec: f64, remaining: f64) -> RiskAssessment {
    if video_time >= detect_at_sec && remaining > 0.0 {
        RiskAssessment::critical(remaining)
    } else {
        RiskAssessment::SAFE
    }
}

pub fn bounded_window(remaining: f64, window_sec: f64, prior: RiskAssessment) -> RiskAssessment {
    if remaining > 0.0 && remaining < window_sec {
        RiskAssessment::critical(remaining)
    } else if remaining <= 0.0 {
        RiskAssessment::SAFE
    } else {
        prior
    }
}
