//! timing.rs — Per-mode timing tables
//!
//! Every instant in the demo is a compiled-in timestamp. A table holds the
//! scenario length, the feed-acquisition delay, the predicted collision
//! instant, the story cues that gate the overlays, and one action trigger
//! strategy. Tables can be overridden from TOML; the presets below are the
//! timings the demo ships with.

use std::collections::HashSet;

use sentinel_types::{ActionKind, ActionStatus, MitigationAction, ScenarioMode};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ── Shipped constants ─────────────────────────────────────────────────────────

pub const PASSIVE_SCENARIO_DURATION_SEC: f64 = 14.0;
pub const PASSIVE_COLLISION_TIME_SEC: f64 = 3.2;
pub const CLIP_DURATION_SEC: f64 = 14.0;

pub const ACTIVE_SCENARIO_DURATION_SEC: f64 = 6.0;
pub const SENTINEL_VIDEO_START_DELAY_SEC: f64 = 0.75;
pub const ACTIVE_COLLISION_TIME_SEC: f64 = 7.0;
pub const SENTINEL_OBSERVE_OVERLAY_AT_SEC: f64 = 3.0;
pub const SENTINEL_PREDICT_LEAD_SEC: f64 = 0.3;
pub const SENTINEL_DETECT_AT_SEC: f64 = 3.6;
pub const SENTINEL_KILL_SWITCH_AT_SEC: f64 = 4.5;
pub const SENTINEL_NOTIFY_SUPERVISOR_AT_SEC: f64 = 4.9;

pub const REVEAL_DECIDING_UNTIL_MS: u64 = 700;
pub const REVEAL_KILL_SWITCH_AFTER_MS: u64 = 900;
pub const REVEAL_NOTIFY_SUPERVISOR_AFTER_MS: u64 = 1250;

pub const SEQUENTIAL_FORECAST_AT_SEC: f64 = 0.8;
pub const SEQUENTIAL_HAZARD_AT_SEC: f64 = 1.6;
pub const SENTINEL_HOLD_AT_SEC: f64 = 2.4;
pub const SEQUENTIAL_COLLISION_TIME_SEC: f64 = 7.5;
pub const BOUNDED_RISK_WINDOW_SEC: f64 = 6.0;

const FORKLIFT_ID: &str = "F-12";
const SHIFT_LEAD_ID: &str = "SHIFT-LEAD";
const BAY_ID: &str = "BAY-B";

// ── Table types ───────────────────────────────────────────────────────────────

/// How the ACTIVE branch of the risk evaluator decides when to count down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RiskModel {
    /// CRITICAL once video time reaches `cues.detect_at_sec` and impact is ahead
    #[default]
    DetectionGated,
    /// CRITICAL while impact is less than `window_sec` away; silent before that
    BoundedWindow { window_sec: f64 },
}

/// Story beats, in video time, that light up the overlays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryCues {
    pub observe_at_sec: f64,
    pub predict_lead_sec: f64,
    pub detect_at_sec: f64,
}

impl Default for StoryCues {
    fn default() -> Self {
        Self {
            observe_at_sec: SENTINEL_OBSERVE_OVERLAY_AT_SEC,
            predict_lead_sec: SENTINEL_PREDICT_LEAD_SEC,
            detect_at_sec: SENTINEL_DETECT_AT_SEC,
        }
    }
}

/// One decision fired when video time crosses `at_sec`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionTrigger {
    pub at_sec: f64,
    pub id: String,
    pub action: ActionKind,
    pub target_id: String,
    #[serde(default)]
    pub rationale: String,
}

/// A decision without its own timing, used by gates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionTemplate {
    pub id: String,
    pub action: ActionKind,
    pub target_id: String,
    #[serde(default)]
    pub rationale: String,
}

/// A time threshold that appends all of its actions together, and only once
/// every earlier gate has been emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionGate {
    pub at_sec: f64,
    pub actions: Vec<ActionTemplate>,
}

/// One step of the post-hold reveal, timed from the hold instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevealStep {
    pub after_hold_ms: u64,
    pub id: String,
    pub action: ActionKind,
    pub target_id: String,
    #[serde(default)]
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevealSchedule {
    /// The "deciding" spinner shows until this many ms after the hold
    pub deciding_until_ms: u64,
    pub steps: Vec<RevealStep>,
}

/// Where mitigation actions come from for a mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionTriggerStrategy {
    /// Recompute the list from declared thresholds every frame
    ThresholdList { triggers: Vec<ActionTrigger> },
    /// Append gate by gate, each gated on the count already emitted; the
    /// clock holds at `hold_at_sec`
    SequentialGate {
        gates: Vec<ActionGate>,
        hold_at_sec: f64,
    },
    /// Freeze the clock at `analysis_pause_at_sec`, then reveal decisions on
    /// a hold timer
    PauseAndReveal {
        analysis_pause_at_sec: f64,
        reveal: RevealSchedule,
    },
}

impl ActionTriggerStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ThresholdList { .. } => "threshold_list",
            Self::SequentialGate { .. } => "sequential_gate",
            Self::PauseAndReveal { .. } => "pause_and_reveal",
        }
    }

    pub fn action_count(&self) -> usize {
        match self {
            Self::ThresholdList { triggers } => triggers.len(),
            Self::SequentialGate { gates, .. } => gates.iter().map(|g| g.actions.len()).sum(),
            Self::PauseAndReveal { reveal, .. } => reveal.steps.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    pub scenario_duration_sec: f64,
    #[serde(default)]
    pub video_start_delay_sec: f64,
    pub predicted_collision_time_sec: f64,
    #[serde(default = "default_clip_duration")]
    pub clip_duration_sec: f64,
    #[serde(default)]
    pub risk_model: RiskModel,
    #[serde(default)]
    pub cues: StoryCues,
    pub strategy: ActionTriggerStrategy,
}

fn default_clip_duration() -> f64 {
    CLIP_DURATION_SEC
}

pub(crate) fn executed(
    id: &str,
    timestamp_sec: f64,
    kind: ActionKind,
    target_id: &str,
    rationale: &str,
) -> MitigationAction {
    MitigationAction {
        id: id.to_string(),
        timestamp_sec,
        kind,
        target_id: target_id.to_string(),
        rationale: rationale.to_string(),
        status: ActionStatus::Executed,
    }
}

impl ActionTrigger {
    pub fn to_action(&self) -> MitigationAction {
        executed(&self.id, self.at_sec, self.action, &self.target_id, &self.rationale)
    }
}

impl ActionTemplate {
    pub fn to_action(&self, timestamp_sec: f64) -> MitigationAction {
        executed(&self.id, timestamp_sec, self.action, &self.target_id, &self.rationale)
    }
}

impl RevealStep {
    pub fn to_action(&self, hold_video_time_sec: f64) -> MitigationAction {
        let ts = hold_video_time_sec + self.after_hold_ms as f64 / 1000.0;
        executed(&self.id, ts, self.action, &self.target_id, &self.rationale)
    }
}

impl TimingConfig {
    /// Elapsed time as the clip sees it. PASSIVE plays immediately.
    pub fn video_time(&self, mode: ScenarioMode, elapsed_sec: f64) -> f64 {
        match mode {
            ScenarioMode::Passive => elapsed_sec,
            ScenarioMode::Active if elapsed_sec >= self.stop_threshold() => self.held_video_time(),
            ScenarioMode::Active => (elapsed_sec - self.video_start_delay_sec).max(0.0),
        }
    }

    /// Clip position on the held frame, exact rather than `threshold - delay`.
    pub fn held_video_time(&self) -> f64 {
        match &self.strategy {
            ActionTriggerStrategy::ThresholdList { .. } => {
                (self.scenario_duration_sec - self.video_start_delay_sec).max(0.0)
            }
            ActionTriggerStrategy::SequentialGate { hold_at_sec, .. } => *hold_at_sec,
            ActionTriggerStrategy::PauseAndReveal {
                analysis_pause_at_sec,
                ..
            } => *analysis_pause_at_sec,
        }
    }

    /// Scenario elapsed time at which the clock clamps and stops.
    pub fn stop_threshold(&self) -> f64 {
        match &self.strategy {
            ActionTriggerStrategy::ThresholdList { .. } => self.scenario_duration_sec,
            ActionTriggerStrategy::SequentialGate { hold_at_sec, .. } => {
                self.video_start_delay_sec + hold_at_sec
            }
            ActionTriggerStrategy::PauseAndReveal {
                analysis_pause_at_sec,
                ..
            } => self.video_start_delay_sec + analysis_pause_at_sec,
        }
    }

    /// Whether reaching the stop threshold starts a reveal sub-sequence.
    pub fn reveal(&self) -> Option<&RevealSchedule> {
        match &self.strategy {
            ActionTriggerStrategy::PauseAndReveal { reveal, .. } => Some(reveal),
            _ => None,
        }
    }

    pub fn validate(&self, mode: ScenarioMode) -> Result<(), ConfigError> {
        let m = mode_name(mode);
        positive(m, "scenario_duration_sec", self.scenario_duration_sec)?;
        positive(m, "clip_duration_sec", self.clip_duration_sec)?;
        seconds(m, "video_start_delay_sec", self.video_start_delay_sec)?;
        seconds(m, "predicted_collision_time_sec", self.predicted_collision_time_sec)?;
        seconds(m, "cues.observe_at_sec", self.cues.observe_at_sec)?;
        seconds(m, "cues.predict_lead_sec", self.cues.predict_lead_sec)?;
        seconds(m, "cues.detect_at_sec", self.cues.detect_at_sec)?;
        if let RiskModel::BoundedWindow { window_sec } = self.risk_model {
            positive(m, "risk_model.window_sec", window_sec)?;
        }

        let takes_no_decisions = matches!(
            &self.strategy,
            ActionTriggerStrategy::ThresholdList { triggers } if triggers.is_empty()
        );
        if mode == ScenarioMode::Passive && !takes_no_decisions {
            return Err(ConfigError::PassiveActions {
                strategy: self.strategy.name(),
                actions: self.strategy.action_count(),
            });
        }

        let mut ids = HashSet::new();
        let mut unique = |id: &str| -> Result<(), ConfigError> {
            if ids.insert(id.to_string()) {
                Ok(())
            } else {
                Err(ConfigError::DuplicateActionId {
                    mode: m,
                    id: id.to_string(),
                })
            }
        };

        match &self.strategy {
            ActionTriggerStrategy::ThresholdList { triggers } => {
                let mut previous = 0.0;
                for t in triggers {
                    seconds(m, "triggers.at_sec", t.at_sec)?;
                    if t.at_sec < previous {
                        return Err(ConfigError::UnsortedTriggers {
                            mode: m,
                            id: t.id.clone(),
                            at_sec: t.at_sec,
                            previous_sec: previous,
                        });
                    }
                    previous = t.at_sec;
                    unique(&t.id)?;
                }
            }
            ActionTriggerStrategy::SequentialGate { gates, hold_at_sec } => {
                seconds(m, "hold_at_sec", *hold_at_sec)?;
                let mut previous = 0.0;
                for (index, gate) in gates.iter().enumerate() {
                    seconds(m, "gates.at_sec", gate.at_sec)?;
                    let first = gate.actions.first().ok_or(ConfigError::EmptyGate { mode: m, index })?;
                    if gate.at_sec < previous {
                        return Err(ConfigError::UnsortedTriggers {
                            mode: m,
                            id: first.id.clone(),
                            at_sec: gate.at_sec,
                            previous_sec: previous,
                        });
                    }
                    if gate.at_sec > *hold_at_sec {
                        return Err(ConfigError::GateAfterHold {
                            mode: m,
                            id: first.id.clone(),
                            at_sec: gate.at_sec,
                            hold_at_sec: *hold_at_sec,
                        });
                    }
                    previous = gate.at_sec;
                    for a in &gate.actions {
                        unique(&a.id)?;
                    }
                }
            }
            ActionTriggerStrategy::PauseAndReveal {
                analysis_pause_at_sec,
                reveal,
            } => {
                seconds(m, "analysis_pause_at_sec", *analysis_pause_at_sec)?;
                let mut previous = reveal.deciding_until_ms;
                for step in &reveal.steps {
                    if step.after_hold_ms < previous {
                        return Err(ConfigError::RevealOutOfOrder {
                            mode: m,
                            id: step.id.clone(),
                            after_hold_ms: step.after_hold_ms,
                        });
                    }
                    previous = step.after_hold_ms;
                    unique(&step.id)?;
                }
            }
        }
        Ok(())
    }

    // ── Presets ───────────────────────────────────────────────────────────────

    /// "Without Sentinel": the full clip, collision at 3.2 s, no decisions.
    pub fn passive() -> Self {
        Self {
            scenario_duration_sec: PASSIVE_SCENARIO_DURATION_SEC,
            video_start_delay_sec: 0.0,
            predicted_collision_time_sec: PASSIVE_COLLISION_TIME_SEC,
            clip_duration_sec: CLIP_DURATION_SEC,
            risk_model: RiskModel::DetectionGated,
            cues: StoryCues::default(),
            strategy: ActionTriggerStrategy::ThresholdList { triggers: vec![] },
        }
    }

    /// "With Sentinel", event-driven: a tight 6 s window, two decisions.
    pub fn active_threshold_list() -> Self {
        Self {
            scenario_duration_sec: ACTIVE_SCENARIO_DURATION_SEC,
            video_start_delay_sec: SENTINEL_VIDEO_START_DELAY_SEC,
            predicted_collision_time_sec: ACTIVE_COLLISION_TIME_SEC,
            clip_duration_sec: CLIP_DURATION_SEC,
            risk_model: RiskModel::DetectionGated,
            cues: StoryCues::default(),
            strategy: ActionTriggerStrategy::ThresholdList {
                triggers: vec![
                    ActionTrigger {
                        at_sec: SENTINEL_KILL_SWITCH_AT_SEC,
                        id: "d1".into(),
                        action: ActionKind::KillSwitch,
                        target_id: FORKLIFT_ID.into(),
                        rationale: "Trigger Kill Switch MCP".into(),
                    },
                    ActionTrigger {
                        at_sec: SENTINEL_NOTIFY_SUPERVISOR_AT_SEC,
                        id: "d2".into(),
                        action: ActionKind::NotifySupervisor,
                        target_id: SHIFT_LEAD_ID.into(),
                        rationale: "Notify Shift Lead".into(),
                    },
                ],
            },
        }
    }

    /// "With Sentinel", pause-and-reveal: hold on the detection frame, then
    /// check the decisions off on a hold timer.
    pub fn active_pause_and_reveal() -> Self {
        Self {
            strategy: ActionTriggerStrategy::PauseAndReveal {
                analysis_pause_at_sec: SENTINEL_DETECT_AT_SEC,
                reveal: RevealSchedule {
                    deciding_until_ms: REVEAL_DECIDING_UNTIL_MS,
                    steps: vec![
                        RevealStep {
                            after_hold_ms: REVEAL_KILL_SWITCH_AFTER_MS,
                            id: "d1".into(),
                            action: ActionKind::KillSwitch,
                            target_id: FORKLIFT_ID.into(),
                            rationale: "Trigger Kill Switch MCP".into(),
                        },
                        RevealStep {
                            after_hold_ms: REVEAL_NOTIFY_SUPERVISOR_AFTER_MS,
                            id: "d2".into(),
                            action: ActionKind::NotifySupervisor,
                            target_id: SHIFT_LEAD_ID.into(),
                            rationale: "Notify Shift Lead".into(),
                        },
                    ],
                },
            },
            ..Self::active_threshold_list()
        }
    }

    /// "With Sentinel", sequential gate: forecast, detection, then the kill
    /// switch and supervisor page as a pair at the hold instant.
    pub fn active_sequential_gate() -> Self {
        let template = |id: &str, action, target: &str, rationale: &str| ActionTemplate {
            id: id.into(),
            action,
            target_id: target.into(),
            rationale: rationale.into(),
        };
        Self {
            scenario_duration_sec: ACTIVE_SCENARIO_DURATION_SEC,
            video_start_delay_sec: 0.0,
            predicted_collision_time_sec: SEQUENTIAL_COLLISION_TIME_SEC,
            clip_duration_sec: CLIP_DURATION_SEC,
            risk_model: RiskModel::BoundedWindow {
                window_sec: BOUNDED_RISK_WINDOW_SEC,
            },
            cues: StoryCues {
                observe_at_sec: SEQUENTIAL_FORECAST_AT_SEC,
                predict_lead_sec: SENTINEL_PREDICT_LEAD_SEC,
                detect_at_sec: SEQUENTIAL_HAZARD_AT_SEC,
            },
            strategy: ActionTriggerStrategy::SequentialGate {
                gates: vec![
                    ActionGate {
                        at_sec: SEQUENTIAL_FORECAST_AT_SEC,
                        actions: vec![template(
                            "a1",
                            ActionKind::WorldModelForecast,
                            BAY_ID,
                            "World model rolled the scene forward 5s",
                        )],
                    },
                    ActionGate {
                        at_sec: SEQUENTIAL_HAZARD_AT_SEC,
                        actions: vec![template(
                            "a2",
                            ActionKind::HazardDetected,
                            FORKLIFT_ID,
                            "Forklift path intersects the rack aisle",
                        )],
                    },
                    ActionGate {
                        at_sec: SENTINEL_HOLD_AT_SEC,
                        actions: vec![
                            template(
                                "a3",
                                ActionKind::KillSwitch,
                                FORKLIFT_ID,
                                "Trigger Kill Switch MCP",
                            ),
                            template(
                                "a4",
                                ActionKind::NotifySupervisor,
                                SHIFT_LEAD_ID,
                                "Notify Shift Lead",
                            ),
                        ],
                    },
                ],
                hold_at_sec: SENTINEL_HOLD_AT_SEC,
            },
        }
    }
}

fn mode_name(mode: ScenarioMode) -> &'static str {
    match mode {
        ScenarioMode::Passive => "passive",
        ScenarioMode::Active => "active",
    }
}

fn seconds(mode: &'static str, field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidTime { mode, field, value })
    }
}

fn positive(mode: &'static str, field: &'static str, value: f64) -> Result<(), ConfigError> {
    seconds(mode, field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { mode, field, value })
    }
}

// ── Mode table ────────────────────────────────────────────────────────────────

/// One table per mode; exactly one is live at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeTable {
    pub passive: TimingConfig,
    pub active: TimingConfig,
}

impl Default for ModeTable {
    fn default() -> Self {
        Self {
            passive: TimingConfig::passive(),
            active: TimingConfig::active_threshold_list(),
        }
    }
}

impl ModeTable {
    pub fn get(&self, mode: ScenarioMode) -> &TimingConfig {
        match mode {
            ScenarioMode::Passive => &self.passive,
            ScenarioMode::Active => &self.active,
        }
    }

    pub fn with_active(mut self, active: TimingConfig) -> Self {
        self.active = active;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.passive.validate(ScenarioMode::Passive)?;
        self.active.validate(ScenarioMode::Active)
    }

    /// Parse and validate a `[passive]` / `[active]` TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let table: Self = toml::from_str(raw)?;
        table.validate()?;
        Ok(table)
    }
}
