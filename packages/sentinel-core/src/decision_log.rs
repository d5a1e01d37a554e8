//! # decision_log
//!
//! SHA-256 chained ledger of what the simulated agent did during one run.
//!
//! Every control transition (run, hold) and every executed mitigation action
//! is appended as a block that hashes the previous block's hash. Blocks are
//! stamped with scenario time, not wall-clock time, so replaying the same
//! frames reproduces the same head hash. Lives in memory only and is wiped
//! on reset.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ── Ledger Event Types ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerEventType {
    /// Operator pressed Run
    ScenarioRun,
    /// Mitigation action appended to the list
    ActionExecuted,
    /// Clock reached its stop threshold
    ScenarioHeld,
}

impl std::fmt::Display for LedgerEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ScenarioRun => "SCENARIO_RUN",
            Self::ActionExecuted => "ACTION_EXECUTED",
            Self::ScenarioHeld => "SCENARIO_HELD",
        };
        f.write_str(s)
    }
}

// ── Ledger Block ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerBlock {
    /// Monotonically increasing per-run sequence number
    pub block_seq: u64,
    /// Scenario elapsed time in milliseconds
    pub scenario_time_ms: u64,
    /// Genesis block: 64 zeros
    pub prev_hash: String,
    pub event_type: LedgerEventType,
    pub payload_json: String,
    /// SHA-256 of (prev_hash || scenario_time_ms || event_type || payload_json)
    pub block_hash: String,
}

impl LedgerBlock {
    fn compute_hash(
        prev_hash: &str,
        scenario_time_ms: u64,
        event_type: LedgerEventType,
        payload_json: &str,
    ) -> String {
        let mut hasher = Sha256::new();
        hasher.update(prev_hash.as_bytes());
        hasher.update(scenario_time_ms.to_le_bytes());
        hasher.update(event_type.to_string().as_bytes());
        hasher.update(payload_json.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn new(
        block_seq: u64,
        scenario_time_ms: u64,
        prev_hash: String,
        event_type: LedgerEventType,
        payload_json: String,
    ) -> Self {
        let block_hash = Self::compute_hash(&prev_hash, scenario_time_ms, event_type, &payload_json);
        Self {
            block_seq,
            scenario_time_ms,
            prev_hash,
            event_type,
            payload_json,
            block_hash,
        }
    }

    pub fn verify(&self) -> bool {
        Self::compute_hash(
            &self.prev_hash,
            self.scenario_time_ms,
            self.event_type,
            &self.payload_json,
        ) == self.block_hash
    }
}

// ── Decision Ledger ───────────────────────────────────────────────────────────

pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

#[derive(Debug, Clone, Default)]
pub struct DecisionLedger {
    blocks: Vec<LedgerBlock>,
}

impl DecisionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocks(&self) -> &[LedgerBlock] {
        &self.blocks
    }

    pub fn head_hash(&self) -> &str {
        self.blocks
            .last()
            .map(|b| b.block_hash.as_str())
            .unwrap_or(GENESIS_HASH)
    }

    /// Append one block. This is the single write path.
    pub fn append(
        &mut self,
        event_type: LedgerEventType,
        scenario_time_sec: f64,
        payload: serde_json::Value,
    ) -> &LedgerBlock {
        let scenario_time_ms = (scenario_time_sec.max(0.0) * 1000.0).round() as u64;
        let block = LedgerBlock::new(
            self.blocks.len() as u64,
            scenario_time_ms,
            self.head_hash().to_string(),
            event_type,
            payload.to_string(),
        );
        debug_assert!(block.verify(), "LedgerBlock hash mismatch immediately after creation");
        self.blocks.push(block);
        &self.blocks[self.blocks.len() - 1]
    }

    /// Every block hashes correctly and links to its predecessor.
    pub fn verify_chain(&self) -> bool {
        let mut prev = GENESIS_HASH;
        for block in &self.blocks {
            if block.prev_hash != prev || !block.verify() {
                return false;
            }
            prev = &block.block_hash;
        }
        true
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_ledger() -> DecisionLedger {
        let mut ledger = DecisionLedger::new();
        ledger.append(LedgerEventType::ScenarioRun, 0.0, json!({ "mode": "ACTIVE" }));
        ledger.append(LedgerEventType::ActionExecuted, 4.5, json!({ "id": "d1" }));
        ledger.append(LedgerEventType::ActionExecuted, 4.9, json!({ "id": "d2" }));
        ledger
    }

    #[test]
    fn chain_links_and_verifies() {
        let ledger = sample_ledger();
        assert_eq!(ledger.blocks()[0].prev_hash, GENESIS_HASH);
        assert_eq!(ledger.blocks()[1].prev_hash, ledger.blocks()[0].block_hash);
        assert_eq!(ledger.blocks()[2].scenario_time_ms, 4_900);
        assert_eq!(ledger.head_hash().len(), 64);
        assert!(ledger.verify_chain());
    }

    #[test]
    fn replay_reproduces_head() {
        assert_eq!(sample_ledger().head_hash(), sample_ledger().head_hash());
    }

    #[test]
    fn tampering_breaks_chain() {
        let mut ledger = sample_ledger();
        ledger.blocks[1].payload_json = r#"{"id":"d9"}"#.into();
        assert!(!ledger.verify_chain());
    }

    #[test]
    fn clear_returns_to_genesis() {
        let mut ledger = sample_ledger();
        ledger.clear();
        assert_eq!(ledger.head_hash(), GENESIS_HASH);
        assert!(ledger.verify_chain());
    }
}
