//! overlay.rs — Overlay visibility flags
//!
//! Derived from the same sampled time as the risk level and the action list,
//! so one snapshot can never show the detection card without its tint.

use sentinel_types::{OverlayFlags, PipelineProgress, RiskLevel, ScenarioMode, ScenarioPhase};

use crate::timing::TimingConfig;

#[derive(Debug, Clone, Copy)]
pub struct OverlayInputs<'a> {
    pub mode: ScenarioMode,
    pub config: &'a TimingConfig,
    pub phase: ScenarioPhase,
    pub elapsed_sec: f64,
    pub video_time_sec: f64,
    pub risk: RiskLevel,
    pub actions_len: usize,
    pub hold_since_ms: Option<f64>,
    pub signal_lost: bool,
}

pub fn derive(inputs: &OverlayInputs<'_>) -> OverlayFlags {
    let cfg = inputs.config;
    let started = inputs.phase != ScenarioPhase::Idle;
    let active = started && inputs.mode == ScenarioMode::Active;
    let video = inputs.video_time_sec;

    let video_ended = started && video >= cfg.clip_duration_sec;
    let acquiring_feed = active && inputs.elapsed_sec < cfg.video_start_delay_sec;
    let hazard_detected = active && video >= cfg.cues.detect_at_sec;

    let deciding = active
        && match cfg.reveal() {
            Some(reveal) => {
                hazard_detected && inputs.hold_since_ms.map_or(true, |ms| reveal.is_deciding(ms))
            }
            None => inputs.actions_len == 0,
        };

    let pipeline = if active {
        PipelineProgress {
            observe: video >= cfg.cues.observe_at_sec,
            predict: video >= cfg.cues.observe_at_sec + cfg.cues.predict_lead_sec,
            detect: hazard_detected,
            mitigate: hazard_detected,
        }
    } else {
        PipelineProgress::default()
    };

    OverlayFlags {
        acquiring_feed,
        observing: active && !video_ended,
        hazard_detected,
        mitigating: hazard_detected,
        ar_layer: hazard_detected && !acquiring_feed,
        deciding,
        impact_banner: started && inputs.risk == RiskLevel::Collision,
        narration: started && inputs.mode == ScenarioMode::Passive && video_ended,
        signal_lost: inputs.signal_lost,
        pipeline,
    }
}

/// Timeline strip fill.
pub fn progress(elapsed_sec: f64, stop_threshold_sec: f64) -> f64 {
    if stop_threshold_sec <= 0.0 {
        return 1.0;
    }
    (elapsed_sec / stop_threshold_sec).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs<'a>(mode: ScenarioMode, cfg: &'a TimingConfig, elapsed: f64) -> OverlayInputs<'a> {
        OverlayInputs {
            mode,
            config: cfg,
            phase: ScenarioPhase::Running,
            elapsed_sec: elapsed,
            video_time_sec: cfg.video_time(mode, elapsed),
            risk: RiskLevel::Safe,
            actions_len: 0,
            hold_since_ms: None,
            signal_lost: false,
        }
    }

    #[test]
    fn idle_shows_nothing() {
        let cfg = TimingConfig::active_threshold_list();
        let mut i = inputs(ScenarioMode::Active, &cfg, 5.0);
        i.phase = ScenarioPhase::Idle;
        assert_eq!(derive(&i), OverlayFlags::default());
    }

    #[test]
    fn acquiring_then_observing() {
        let cfg = TimingConfig::active_threshold_list();
        let early = derive(&inputs(ScenarioMode::Active, &cfg, 0.5));
        assert!(early.acquiring_feed);
        assert!(early.observing);
        assert!(!early.ar_layer);

        let later = derive(&inputs(ScenarioMode::Active, &cfg, 1.0));
        assert!(!later.acquiring_feed);
    }

    #[test]
    fn pipeline_chips_light_in_order() {
        let cfg = TimingConfig::active_threshold_list();
        // video time 3.1: observe only
        let f = derive(&inputs(ScenarioMode::Active, &cfg, 3.85));
        assert_eq!(
            f.pipeline,
            PipelineProgress { observe: true, predict: false, detect: false, mitigate: false }
        );
        // video time 3.4: observe + predict
        let f = derive(&inputs(ScenarioMode::Active, &cfg, 4.15));
        assert!(f.pipeline.predict && !f.pipeline.detect);
        // video time 3.75: everything, plus the detection card
        let f = derive(&inputs(ScenarioMode::Active, &cfg, 4.5));
        assert!(f.pipeline.detect && f.pipeline.mitigate);
        assert!(f.hazard_detected && f.ar_layer && f.mitigating);
    }

    #[test]
    fn deciding_until_first_action_for_threshold_list() {
        let cfg = TimingConfig::active_threshold_list();
        let mut i = inputs(ScenarioMode::Active, &cfg, 4.0);
        assert!(derive(&i).deciding);
        i.actions_len = 1;
        assert!(!derive(&i).deciding);
    }

    #[test]
    fn deciding_follows_hold_timer_for_reveal() {
        let cfg = TimingConfig::active_pause_and_reveal();
        let mut i = inputs(ScenarioMode::Active, &cfg, 4.35);
        i.video_time_sec = 3.6;
        i.phase = ScenarioPhase::Held;
        i.hold_since_ms = Some(500.0);
        assert!(derive(&i).deciding);
        i.hold_since_ms = Some(700.0);
        assert!(!derive(&i).deciding);
    }

    #[test]
    fn passive_impact_and_narration() {
        let cfg = TimingConfig::passive();
        let mut i = inputs(ScenarioMode::Passive, &cfg, 3.2);
        i.risk = RiskLevel::Collision;
        let f = derive(&i);
        assert!(f.impact_banner);
        assert!(!f.observing && !f.narration);

        let mut end = inputs(ScenarioMode::Passive, &cfg, 14.0);
        end.phase = ScenarioPhase::Held;
        assert!(derive(&end).narration);
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(progress(3.0, 6.0), 0.5);
        assert_eq!(progress(9.0, 6.0), 1.0);
        assert_eq!(progress(1.0, 0.0), 1.0);
    }
}
