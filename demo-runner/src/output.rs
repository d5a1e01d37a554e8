//! output.rs — Snapshot stream
//!
//! One JSON line per changed snapshot. Countdown, elapsed time, video time
//! and progress move every frame while running, so a running scenario
//! publishes every tick; an idle or held one stays quiet.

use std::io::Write;

use sentinel_types::ScenarioSnapshot;
use tracing::debug;

pub struct SnapshotWriter<W: Write> {
    out: W,
    last: Option<ScenarioSnapshot>,
    written: u64,
}

impl<W: Write> SnapshotWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last: None,
            written: 0,
        }
    }

    /// Returns whether a line was written.
    pub fn publish(&mut self, snapshot: ScenarioSnapshot) -> anyhow::Result<bool> {
        if self.last.as_ref() == Some(&snapshot) {
            return Ok(false);
        }
        if let Some(last) = &self.last {
            if snapshot.differs_discretely(last) {
                debug!(
                    "Snapshot {:?} → {:?}, {:?}, {} actions",
                    last.phase,
                    snapshot.phase,
                    snapshot.risk_level,
                    snapshot.actions.len()
                );
            }
        }
        serde_json::to_writer(&mut self.out, &snapshot)?;
        writeln!(self.out)?;
        self.out.flush()?;
        self.written += 1;
        self.last = Some(snapshot);
        Ok(true)
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}
