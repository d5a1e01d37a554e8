//! sequencer.rs — Action sequencer
//!
//! Append-only accumulator of mitigation actions. Every strategy reads the
//! list as it stands right now (never a copy captured earlier) and only ever
//! pushes onto the end. Reset is the one way to shrink it.

use sentinel_types::MitigationAction;
use tracing::debug;

use crate::timing::{ActionGate, ActionTrigger, RevealSchedule};

#[derive(Debug, Clone, Default)]
pub struct ActionSequencer {
    actions: Vec<MitigationAction>,
}

impl ActionSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> &[MitigationAction] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }

    fn contains(&self, id: &str) -> bool {
        self.actions.iter().any(|a| a.id == id)
    }

    fn push(&mut self, action: MitigationAction) {
        debug!(
            id = %action.id,
            action = %action.kind,
            target = %action.target_id,
            at = action.timestamp_sec,
            "mitigation action appended"
        );
        self.actions.push(action);
    }

    /// Threshold list: rebuild the full list for `video_time` and keep the
    /// current one when the ordered ids already match. Returns how many
    /// actions were appended.
    pub fn apply_threshold_list(&mut self, triggers: &[ActionTrigger], video_time: f64) -> usize {
        let next: Vec<&ActionTrigger> = triggers.iter().filter(|t| t.at_sec <= video_time).collect();

        let unchanged = next.len() == self.actions.len()
            && next.iter().zip(&self.actions).all(|(t, a)| t.id == a.id);
        if unchanged {
            return 0;
        }

        let before = self.actions.len();
        for trigger in next {
            if !self.contains(&trigger.id) {
                self.push(trigger.to_action());
            }
        }
        self.actions.len() - before
    }

    /// Sequential gate: gate N opens only when its time has come AND exactly
    /// the actions of gates 0..N are present. All gates that qualify are
    /// emitted in declaration order, so a dropped frame still yields the
    /// same order. Returns how many actions were appended.
    pub fn apply_sequential_gate(&mut self, gates: &[ActionGate], video_time: f64) -> usize {
        let before = self.actions.len();
        let mut emitted_through = 0;
        for gate in gates {
            let required = emitted_through;
            emitted_through += gate.actions.len();

            if self.actions.len() >= emitted_through {
                continue;
            }
            if self.actions.len() != required || video_time < gate.at_sec {
                break;
            }
            for template in &gate.actions {
                self.push(template.to_action(gate.at_sec));
            }
        }
        self.actions.len() - before
    }

    /// Pause-and-reveal: step N lands once `since_hold_ms` reaches its offset
    /// and exactly N steps are present. Returns how many actions were appended.
    pub fn apply_reveal(
        &mut self,
        reveal: &RevealSchedule,
        hold_video_time: f64,
        since_hold_ms: f64,
    ) -> usize {
        let before = self.actions.len();
        for (index, step) in reveal.steps.iter().enumerate() {
            if self.actions.len() > index {
                continue;
            }
            if self.actions.len() != index || since_hold_ms < step.after_hold_ms as f64 {
                break;
            }
            self.push(step.to_action(hold_video_time));
        }
        self.actions.len() - before
    }
}
