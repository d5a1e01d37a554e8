//! controller.rs — Scenario controller
//!
//! Owns the run/reset/mode commands and the per-frame tick. Each tick
//! samples one timestamp, advances the clock, re-evaluates risk, applies the
//! mode's action strategy and publishes a snapshot. Frame callbacks carry a
//! `FrameTicket`; reset bumps the generation so late callbacks fall through.

use sentinel_types::{ScenarioMode, ScenarioPhase, ScenarioSnapshot};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::clock::{ClockSample, ScenarioClock, TimeSource};
use crate::decision_log::{DecisionLedger, LedgerEventType};
use crate::error::{ConfigError, MediaError};
use crate::overlay::{self, OverlayInputs};
use crate::reveal::HoldTimer;
use crate::risk::{self, RiskAssessment};
use crate::sequencer::ActionSequencer;
use crate::timing::{ActionTriggerStrategy, ModeTable, TimingConfig};

/// Handed out by `run()`; a frame callback presents it back on every tick.
/// Reset and mode changes invalidate all outstanding tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTicket {
    generation: u64,
}

#[derive(Debug)]
pub enum TickResult {
    /// Nothing to publish: idle, stale ticket, or already complete
    Idle,
    /// Published; keep requesting frames
    Update(ScenarioSnapshot),
    /// Published; the clock is held and nothing else will change
    Complete(ScenarioSnapshot),
}

/// Frame-driven scenario state machine: Idle → Running → Held.
pub struct ScenarioController {
    tables: ModeTable,
    mode: ScenarioMode,
    phase: ScenarioPhase,
    clock: ScenarioClock,
    hold: HoldTimer,
    risk: RiskAssessment,
    video_time_sec: f64,
    sequencer: ActionSequencer,
    ledger: DecisionLedger,
    generation: u64,
    signal_lost: bool,
}

impl ScenarioController {
    pub fn new(tables: ModeTable, mode: ScenarioMode) -> Self {
        let clock = ScenarioClock::new(tables.get(mode).stop_threshold());
        Self {
            tables,
            mode,
            phase: ScenarioPhase::Idle,
            clock,
            hold: HoldTimer::default(),
            risk: RiskAssessment::SAFE,
            video_time_sec: 0.0,
            sequencer: ActionSequencer::new(),
            ledger: DecisionLedger::new(),
            generation: 0,
            signal_lost: false,
        }
    }

    pub fn try_new(tables: ModeTable, mode: ScenarioMode) -> Result<Self, ConfigError> {
        tables.validate()?;
        Ok(Self::new(tables, mode))
    }

    pub fn mode(&self) -> ScenarioMode {
        self.mode
    }

    pub fn phase(&self) -> ScenarioPhase {
        self.phase
    }

    pub fn config(&self) -> &TimingConfig {
        self.tables.get(self.mode)
    }

    pub fn ledger(&self) -> &DecisionLedger {
        &self.ledger
    }

    /// Whether the host should keep scheduling frame callbacks.
    pub fn wants_frames(&self) -> bool {
        match self.phase {
            ScenarioPhase::Idle => false,
            ScenarioPhase::Running => true,
            ScenarioPhase::Held => !self.reveal_complete(),
        }
    }

    fn reveal_complete(&self) -> bool {
        self.config()
            .reveal()
            .map_or(true, |r| r.is_complete(self.sequencer.len()))
    }

    // ── Commands ──────────────────────────────────────────────────────────────

    /// Idle → Running. A no-op in any other phase.
    pub fn run(&mut self) -> Option<FrameTicket> {
        if self.phase != ScenarioPhase::Idle {
            debug!("run() ignored: scenario already {:?}", self.phase);
            return None;
        }
        self.phase = ScenarioPhase::Running;
        self.clock.start();

        let strategy = self.config().strategy.name();
        self.ledger.append(
            LedgerEventType::ScenarioRun,
            0.0,
            json!({ "mode": self.mode, "strategy": strategy }),
        );
        info!(
            "Scenario running: {} ({}), stops at {:.2}s",
            self.mode.label(),
            strategy,
            self.clock.stop_threshold_sec()
        );
        Some(FrameTicket {
            generation: self.generation,
        })
    }

    /// Any phase → Idle. Clears elapsed time, risk, countdown, actions and
    /// the ledger, and invalidates every outstanding frame ticket.
    pub fn reset(&mut self) {
        self.generation += 1;
        let stop = self.config().stop_threshold();
        self.phase = ScenarioPhase::Idle;
        self.clock.reset(stop);
        self.hold.clear();
        self.risk = RiskAssessment::SAFE;
        self.video_time_sec = 0.0;
        self.sequencer.clear();
        self.ledger.clear();
        info!("Scenario reset ({})", self.mode);
    }

    /// Switching modes always tears the run down; the operator must run again.
    pub fn set_mode(&mut self, mode: ScenarioMode) {
        info!("Mode switched: {} → {}", self.mode, mode);
        self.mode = mode;
        self.reset();
    }

    /// Sticky until `clear_media_error`; the scenario keeps running on its own clock.
    pub fn report_media_error(&mut self, err: &MediaError) {
        match err {
            MediaError::PlaybackRejected(reason) => {
                debug!("Autoplay prevented: {reason}");
            }
            MediaError::Load(reason) => {
                warn!("Video signal lost: {reason}");
                self.signal_lost = true;
            }
        }
    }

    pub fn clear_media_error(&mut self) {
        self.signal_lost = false;
    }

    // ── Frame loop ────────────────────────────────────────────────────────────

    pub fn tick_from(&mut self, ticket: FrameTicket, source: &dyn TimeSource) -> TickResult {
        self.tick(ticket, source.now_ms())
    }

    /// One frame. `now_ms` is sampled once by the caller and everything
    /// published in the snapshot derives from it.
    pub fn tick(&mut self, ticket: FrameTicket, now_ms: f64) -> TickResult {
        if ticket.generation != self.generation {
            debug!(
                "Dropping stale frame callback (ticket {}, current {})",
                ticket.generation, self.generation
            );
            return TickResult::Idle;
        }

        match self.phase {
            ScenarioPhase::Idle => TickResult::Idle,
            ScenarioPhase::Running => match self.clock.sample(now_ms) {
                ClockSample::Stopped => TickResult::Idle,
                ClockSample::Advanced(elapsed) => {
                    self.step(elapsed);
                    self.publish()
                }
                ClockSample::Reached(elapsed) => {
                    self.step(elapsed);
                    self.enter_hold(now_ms);
                    self.advance_reveal();
                    self.publish()
                }
            },
            ScenarioPhase::Held => {
                if !self.wants_frames() {
                    return TickResult::Idle;
                }
                self.hold.sample(now_ms);
                self.advance_reveal();
                self.publish()
            }
        }
    }

    fn step(&mut self, elapsed_sec: f64) {
        let cfg = self.tables.get(self.mode);
        let video_time = cfg.video_time(self.mode, elapsed_sec);
        self.video_time_sec = video_time;
        self.risk = risk::evaluate(self.mode, elapsed_sec, cfg, self.risk);

        let appended = match &cfg.strategy {
            ActionTriggerStrategy::ThresholdList { triggers } => {
                self.sequencer.apply_threshold_list(triggers, video_time)
            }
            ActionTriggerStrategy::SequentialGate { gates, .. } => {
                self.sequencer.apply_sequential_gate(gates, video_time)
            }
            ActionTriggerStrategy::PauseAndReveal { .. } => 0,
        };
        self.record_appended(appended, elapsed_sec);
    }

    fn enter_hold(&mut self, now_ms: f64) {
        self.phase = ScenarioPhase::Held;
        if self.config().reveal().is_some() {
            self.hold.arm(now_ms);
        }
        let elapsed = self.clock.elapsed_sec();
        self.ledger.append(
            LedgerEventType::ScenarioHeld,
            elapsed,
            json!({ "videoTimeSec": self.video_time_sec, "risk": self.risk.level }),
        );
        info!(
            "Scenario held at {:.2}s (video {:.2}s, risk {:?})",
            elapsed, self.video_time_sec, self.risk.level
        );
    }

    fn advance_reveal(&mut self) {
        let Some(since_ms) = self.hold.since_ms() else {
            return;
        };
        let cfg = self.tables.get(self.mode);
        let appended = match cfg.reveal() {
            Some(reveal) => self.sequencer.apply_reveal(reveal, self.video_time_sec, since_ms),
            None => 0,
        };
        self.record_appended(appended, self.clock.elapsed_sec());
    }

    fn record_appended(&mut self, count: usize, elapsed_sec: f64) {
        if count == 0 {
            return;
        }
        let actions = self.sequencer.actions();
        for action in &actions[actions.len() - count..] {
            info!("⚡ {} → {} ({})", action.kind, action.target_id, action.id);
            self.ledger.append(
                LedgerEventType::ActionExecuted,
                elapsed_sec,
                json!({
                    "id": action.id,
                    "action": action.kind,
                    "targetId": action.target_id,
                    "timestampSec": action.timestamp_sec,
                }),
            );
        }
    }

    fn publish(&self) -> TickResult {
        let snapshot = self.snapshot();
        if self.wants_frames() {
            TickResult::Update(snapshot)
        } else {
            TickResult::Complete(snapshot)
        }
    }

    /// Read-only view for rendering consumers, rebuilt from current state.
    pub fn snapshot(&self) -> ScenarioSnapshot {
        let cfg = self.config();
        let elapsed = self.clock.elapsed_sec();
        let actions = self.sequencer.actions();
        let overlays = overlay::derive(&OverlayInputs {
            mode: self.mode,
            config: cfg,
            phase: self.phase,
            elapsed_sec: elapsed,
            video_time_sec: self.video_time_sec,
            risk: self.risk.level,
            actions_len: actions.len(),
            hold_since_ms: self.hold.since_ms(),
            signal_lost: self.signal_lost,
        });

        ScenarioSnapshot {
            mode: self.mode,
            phase: self.phase,
            elapsed_sec: elapsed,
            video_time_sec: self.video_time_sec,
            progress: overlay::progress(elapsed, self.clock.stop_threshold_sec()),
            risk_level: self.risk.level,
            time_to_hazard: self.risk.time_to_hazard,
            actions: actions.to_vec(),
            overlays,
        }
    }
}
