//! End-to-end timelines driven through the controller with synthetic
//! frame timestamps.

use sentinel_core::risk;
use sentinel_core::{
    FrameTicket, ManualTimeSource, MediaError, ModeTable, ScenarioController, TickResult,
    TimingConfig,
};
use sentinel_types::{ActionKind, RiskLevel, ScenarioMode, ScenarioPhase, ScenarioSnapshot};

struct Harness {
    ctl: ScenarioController,
    src: ManualTimeSource,
    ticket: FrameTicket,
}

impl Harness {
    /// Run and anchor the clock on a first frame at t = 0.
    fn start(tables: ModeTable, mode: ScenarioMode) -> Self {
        let mut ctl = ScenarioController::new(tables, mode);
        let src = ManualTimeSource::new(0.0);
        let ticket = ctl.run().expect("idle controller must start");
        ctl.tick_from(ticket, &src);
        Self { ctl, src, ticket }
    }

    fn at_ms(&mut self, ms: f64) -> ScenarioSnapshot {
        self.src.set(ms);
        match self.ctl.tick_from(self.ticket, &self.src) {
            TickResult::Update(s) | TickResult::Complete(s) => s,
            TickResult::Idle => self.ctl.snapshot(),
        }
    }

    fn restart(&mut self) {
        self.ctl.reset();
        self.src.set(0.0);
        self.ticket = self.ctl.run().expect("reset controller must start");
        self.ctl.tick_from(self.ticket, &self.src);
    }
}

fn sequential_tables() -> ModeTable {
    ModeTable::default().with_active(TimingConfig::active_sequential_gate())
}

#[test]
fn passive_run_only_ever_reaches_collision_around_impact() {
    let mut h = Harness::start(ModeTable::default(), ScenarioMode::Passive);
    let mut saw_collision = false;

    for step in 0..=140u32 {
        let snap = h.at_ms(f64::from(step) * 100.0);
        let t = snap.elapsed_sec;
        assert_ne!(snap.risk_level, RiskLevel::Critical, "CRITICAL at {t}");

        match snap.risk_level {
            RiskLevel::Collision => {
                saw_collision = true;
                assert!(t > 2.6 && t < 5.3, "COLLISION outside window at {t}");
                assert_eq!(snap.time_to_hazard, Some(0.0));
                assert!(snap.overlays.impact_banner);
            }
            _ => {
                assert!(t < 2.75 || t > 5.15, "expected COLLISION at {t}");
                assert_eq!(snap.time_to_hazard, None);
            }
        }
        assert!(snap.actions.is_empty());
    }

    assert!(saw_collision);
    let end = h.ctl.snapshot();
    assert_eq!(end.phase, ScenarioPhase::Held);
    assert_eq!(end.elapsed_sec, 14.0);
    assert!(end.overlays.narration);
}

#[test]
fn passive_window_edges() {
    let cfg = TimingConfig::passive();
    let level = |t: f64| {
        risk::evaluate(ScenarioMode::Passive, t, &cfg, risk::RiskAssessment::SAFE).level
    };
    assert_eq!(level(2.69), RiskLevel::Safe);
    assert_eq!(level(2.71), RiskLevel::Collision);
    assert_eq!(level(5.19), RiskLevel::Collision);
    assert_eq!(level(5.2), RiskLevel::Safe);
}

#[test]
fn active_detection_gates_critical() {
    let mut h = Harness::start(ModeTable::default(), ScenarioMode::Active);

    let before = h.at_ms(4_000.0);
    assert_eq!(before.risk_level, RiskLevel::Safe);
    assert_eq!(before.time_to_hazard, None);
    assert!(!before.overlays.hazard_detected);

    let after = h.at_ms(4_500.0);
    assert_eq!(after.risk_level, RiskLevel::Critical);
    let tth = after.time_to_hazard.unwrap();
    assert!((tth - 3.25).abs() < 1e-9, "{tth}");
    assert!(after.overlays.hazard_detected && after.overlays.ar_layer);
}

#[test]
fn replay_after_reset_is_identical() {
    let mut h = Harness::start(ModeTable::default(), ScenarioMode::Active);
    let play = |h: &mut Harness| {
        for s in 0..=6u32 {
            h.at_ms(f64::from(s) * 1000.0);
        }
        (h.ctl.snapshot().actions, h.ctl.ledger().head_hash().to_string())
    };

    let (first, first_head) = play(&mut h);
    h.restart();
    let (second, second_head) = play(&mut h);

    assert_eq!(
        first.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(),
        ["d1", "d2"]
    );
    assert_eq!(first, second);
    assert_eq!(first_head, second_head);
    assert!(h.ctl.ledger().verify_chain());
}

#[test]
fn run_while_running_does_not_reanchor_or_duplicate() {
    let mut h = Harness::start(ModeTable::default(), ScenarioMode::Active);
    h.at_ms(5_300.0);
    assert!(h.ctl.run().is_none());
    assert!(h.ctl.run().is_none());

    let snap = h.at_ms(5_800.0);
    assert_eq!(snap.elapsed_sec, 5.8);
    assert_eq!(snap.action_ids(), ["d1", "d2"]);
}

#[test]
fn reset_restores_defaults_from_any_phase() {
    let mut h = Harness::start(ModeTable::default(), ScenarioMode::Active);
    h.at_ms(7_000.0);
    assert_eq!(h.ctl.phase(), ScenarioPhase::Held);

    h.ctl.reset();
    let snap = h.ctl.snapshot();
    assert_eq!(snap, ScenarioSnapshot::idle(ScenarioMode::Active, false));
    assert!(h.ctl.ledger().blocks().is_empty());

    // a frame callback scheduled before the reset lands on nothing
    assert!(matches!(h.ctl.tick(h.ticket, 9_000.0), TickResult::Idle));
}

#[test]
fn mode_switch_mid_run_clears_actions() {
    let mut h = Harness::start(ModeTable::default(), ScenarioMode::Active);
    assert_eq!(h.at_ms(5_800.0).actions.len(), 2);

    h.ctl.set_mode(ScenarioMode::Passive);
    assert_eq!(h.ctl.mode(), ScenarioMode::Passive);
    assert_eq!(h.ctl.phase(), ScenarioPhase::Idle);
    assert!(h.ctl.snapshot().actions.is_empty());
    assert!(matches!(h.ctl.tick(h.ticket, 6_000.0), TickResult::Idle));
}

#[test]
fn sequential_gate_emits_in_order() {
    let mut h = Harness::start(sequential_tables(), ScenarioMode::Active);

    let one = h.at_ms(800.0);
    assert_eq!(one.actions.len(), 1);
    assert_eq!(one.actions[0].kind, ActionKind::WorldModelForecast);

    assert_eq!(h.at_ms(1_600.0).actions.len(), 2);

    let held = h.at_ms(2_400.0);
    assert_eq!(held.phase, ScenarioPhase::Held);
    assert_eq!(held.actions.len(), 4);
    let (kill, notify) = (&held.actions[2], &held.actions[3]);
    assert_eq!(kill.kind, ActionKind::KillSwitch);
    assert_eq!(notify.kind, ActionKind::NotifySupervisor);
    assert_eq!(kill.timestamp_sec, notify.timestamp_sec);
    assert_ne!(kill.id, notify.id);
}

#[test]
fn sequential_gate_catches_up_after_dropped_frames() {
    let mut h = Harness::start(sequential_tables(), ScenarioMode::Active);
    let snap = h.at_ms(2_600.0);
    assert_eq!(snap.action_ids(), ["a1", "a2", "a3", "a4"]);
    assert_eq!(snap.elapsed_sec, 2.4);
}

#[test]
fn pause_and_reveal_holds_on_detection_then_reveals() {
    let tables = ModeTable::default().with_active(TimingConfig::active_pause_and_reveal());
    let mut h = Harness::start(tables, ScenarioMode::Active);

    let held = h.at_ms(4_400.0);
    assert_eq!(held.phase, ScenarioPhase::Held);
    assert_eq!(held.video_time_sec, 3.6);
    assert_eq!(held.risk_level, RiskLevel::Critical);
    assert!(held.overlays.deciding);
    assert!(held.actions.is_empty());

    assert!(h.at_ms(5_000.0).overlays.deciding);
    assert!(h.at_ms(5_200.0).actions.is_empty());
    assert_eq!(h.at_ms(5_300.0).action_ids(), ["d1"]);

    expect_complete(&mut h, 5_650.0);
    let done = h.ctl.snapshot();
    assert_eq!(done.action_ids(), ["d1", "d2"]);
    assert_eq!(done.elapsed_sec, held.elapsed_sec);
    assert!(!h.ctl.wants_frames());
}

fn expect_complete(h: &mut Harness, ms: f64) {
    h.src.set(ms);
    assert!(matches!(
        h.ctl.tick_from(h.ticket, &h.src),
        TickResult::Complete(_)
    ));
}

#[test]
fn reveal_timer_does_not_leak_into_next_run() {
    let tables = ModeTable::default().with_active(TimingConfig::active_pause_and_reveal());
    let mut h = Harness::start(tables, ScenarioMode::Active);
    h.at_ms(4_400.0);
    h.restart();

    // long after the old hold would have revealed everything
    let snap = h.at_ms(3_000.0);
    assert_eq!(snap.phase, ScenarioPhase::Running);
    assert!(snap.actions.is_empty());
}

#[test]
fn media_failure_degrades_without_stopping_the_clock() {
    let mut h = Harness::start(ModeTable::default(), ScenarioMode::Active);
    h.ctl.report_media_error(&MediaError::Load("MEDIA_ERR_DECODE".into()));

    let snap = h.at_ms(5_300.0);
    assert!(snap.overlays.signal_lost);
    assert_eq!(snap.phase, ScenarioPhase::Running);
    assert_eq!(snap.action_ids(), ["d1"]);
}

#[test]
fn snapshot_wire_shape() {
    let mut h = Harness::start(ModeTable::default(), ScenarioMode::Active);
    let snap = h.at_ms(5_300.0);
    let v = serde_json::to_value(&snap).unwrap();

    assert_eq!(v["mode"], "ACTIVE");
    assert_eq!(v["phase"], "RUNNING");
    assert_eq!(v["riskLevel"], "CRITICAL");
    assert!(v["timeToHazard"].is_number());
    assert_eq!(v["actions"][0]["action"], "KILL_SWITCH");
    assert_eq!(v["actions"][0]["targetId"], "F-12");
    assert_eq!(v["actions"][0]["status"], "EXECUTED");
    assert_eq!(v["overlays"]["hazardDetected"], true);
    assert_eq!(v["overlays"]["pipeline"]["mitigate"], true);
}
