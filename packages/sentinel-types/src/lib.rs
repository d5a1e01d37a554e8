//! # sentinel-types
//!
//! Shared vocabulary for the Sentinel demo timeline.
//!
//! These types are used by:
//! - `sentinel-core`: produced every frame by the scenario controller
//! - `demo-runner`: serialized as JSON lines for the rendering consumers
//!
//! ## Time Conventions
//!
//! - **Scenario elapsed time**: seconds since the first frame observed after `run()`
//! - **Video time**: scenario elapsed time minus the feed-acquisition delay, never negative
//!
//! Every snapshot is built from a single sampled elapsed time, so the risk level,
//! the action list and the overlay flags of one snapshot always agree.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── Scenario Mode ─────────────────────────────────────────────────────────────

/// Which side of the demo is playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScenarioMode {
    /// "Without Sentinel": the clip free-runs into the incident
    #[default]
    Passive,
    /// "With Sentinel": feed acquisition, detection and mitigation decisions
    Active,
}

impl ScenarioMode {
    /// Operator-facing label used by the mode switcher.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Passive => "Without Sentinel",
            Self::Active => "With Sentinel",
        }
    }
}

impl fmt::Display for ScenarioMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passive => write!(f, "PASSIVE"),
            Self::Active => write!(f, "ACTIVE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scenario mode `{0}` (expected passive or active)")]
pub struct ParseModeError(pub String);

impl FromStr for ScenarioMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "passive" | "unprotected" | "without" => Ok(Self::Passive),
            "active" | "protected" | "sentinel" | "with" => Ok(Self::Active),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

// ── Risk ──────────────────────────────────────────────────────────────────────

/// Coarse hazard classification consumed by rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    #[default]
    Safe,
    /// Hazard predicted, countdown running (ACTIVE only)
    Critical,
    /// Impact window around the uncontrolled collision (PASSIVE only)
    Collision,
}

// ── Mitigation Actions ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    WorldModelForecast,
    HazardDetected,
    KillSwitch,
    NotifySupervisor,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::WorldModelForecast => "WORLD_MODEL_FORECAST",
            Self::HazardDetected => "HAZARD_DETECTED",
            Self::KillSwitch => "KILL_SWITCH",
            Self::NotifySupervisor => "NOTIFY_SUPERVISOR",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionStatus {
    #[default]
    Executed,
}

/// A decision taken by the simulated agent. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MitigationAction {
    pub id: String,
    /// Video time at which the decision fired
    pub timestamp_sec: f64,
    #[serde(rename = "action")]
    pub kind: ActionKind,
    pub target_id: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub status: ActionStatus,
}

// ── Scenario Phase ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScenarioPhase {
    /// Not running, every output at its default
    #[default]
    Idle,
    /// Clock advancing, evaluator and sequencer active each frame
    Running,
    /// Clock reached its stop threshold; outputs frozen except the reveal
    Held,
}

// ── Overlay Flags ─────────────────────────────────────────────────────────────

/// Observe → Predict → Detect → Mitigate chips on the detection card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PipelineProgress {
    pub observe: bool,
    pub predict: bool,
    pub detect: bool,
    pub mitigate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayFlags {
    /// "Acquiring feed…" veil while the start delay runs
    pub acquiring_feed: bool,
    /// "Sentinel AI observing…" pill
    pub observing: bool,
    /// Red tint + detection headline
    pub hazard_detected: bool,
    /// Arrow pointing at the actions panel
    pub mitigating: bool,
    /// Bounding boxes and projected paths
    pub ar_layer: bool,
    /// "Mitigation Agent deciding" spinner
    pub deciding: bool,
    /// "IMPACT DETECTED" banner
    pub impact_banner: bool,
    /// Post-incident VLM narration
    pub narration: bool,
    /// Media surface failed; render the placeholder
    pub signal_lost: bool,
    pub pipeline: PipelineProgress,
}

// ── Snapshot (published every frame) ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSnapshot {
    pub mode: ScenarioMode,
    pub phase: ScenarioPhase,
    pub elapsed_sec: f64,
    pub video_time_sec: f64,
    /// Timeline strip fill, 0.0..=1.0
    pub progress: f64,
    pub risk_level: RiskLevel,
    pub time_to_hazard: Option<f64>,
    pub actions: Vec<MitigationAction>,
    pub overlays: OverlayFlags,
}

impl ScenarioSnapshot {
    /// Defaults shown before `run()` and after every reset.
    pub fn idle(mode: ScenarioMode, signal_lost: bool) -> Self {
        Self {
            mode,
            phase: ScenarioPhase::Idle,
            elapsed_sec: 0.0,
            video_time_sec: 0.0,
            progress: 0.0,
            risk_level: RiskLevel::Safe,
            time_to_hazard: None,
            actions: Vec::new(),
            overlays: OverlayFlags {
                signal_lost,
                ..Default::default()
            },
        }
    }

    /// Ordered action ids, the identity used to detect list changes.
    pub fn action_ids(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.id.as_str()).collect()
    }

    /// True when anything a renderer switches on differs (times excluded).
    pub fn differs_discretely(&self, other: &Self) -> bool {
        self.mode != other.mode
            || self.phase != other.phase
            || self.risk_level != other.risk_level
            || self.time_to_hazard.is_some() != other.time_to_hazard.is_some()
            || self.action_ids() != other.action_ids()
            || self.overlays != other.overlays
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_aliases() {
        assert_eq!("PASSIVE".parse::<ScenarioMode>(), Ok(ScenarioMode::Passive));
        assert_eq!(" protected ".parse::<ScenarioMode>(), Ok(ScenarioMode::Active));
        assert!("warning".parse::<ScenarioMode>().is_err());
    }

    #[test]
    fn action_serializes_with_wire_names() {
        let action = MitigationAction {
            id: "d1".into(),
            timestamp_sec: 4.5,
            kind: ActionKind::KillSwitch,
            target_id: "F-12".into(),
            rationale: String::new(),
            status: ActionStatus::Executed,
        };
        let v = serde_json::to_value(&action).unwrap();
        assert_eq!(v["action"], "KILL_SWITCH");
        assert_eq!(v["targetId"], "F-12");
        assert_eq!(v["status"], "EXECUTED");
        assert_eq!(v["timestampSec"], 4.5);
    }

    #[test]
    fn idle_snapshot_is_all_defaults() {
        let snap = ScenarioSnapshot::idle(ScenarioMode::Active, false);
        assert_eq!(snap.risk_level, RiskLevel::Safe);
        assert!(snap.time_to_hazard.is_none());
        assert!(snap.actions.is_empty());
        assert_eq!(snap.overlays, OverlayFlags::default());

        let v = serde_json::to_value(&snap).unwrap();
        assert_eq!(v["mode"], "ACTIVE");
        assert_eq!(v["phase"], "IDLE");
        assert!(v["timeToHazard"].is_null());
    }

    #[test]
    fn discrete_diff_ignores_clock_progress() {
        let a = ScenarioSnapshot::idle(ScenarioMode::Passive, false);
        let mut b = a.clone();
        b.elapsed_sec = 1.25;
        b.progress = 0.1;
        assert!(!a.differs_discretely(&b));
        b.risk_level = RiskLevel::Collision;
        assert!(a.differs_discretely(&b));
    }
}
