//! config.rs — Runner configuration
//!
//! `[playback]` drives the synthetic frame loop; `[timing.passive]` and
//! `[timing.active]` are the mode tables handed to the controller. Both
//! sections fall back to the compiled-in defaults when absent.

use std::path::Path;

use anyhow::Context;
use sentinel_core::{ModeTable, TimingConfig};
use sentinel_types::ScenarioMode;
use serde::Deserialize;
use tracing::warn;

const BUNDLED_CONFIG: &str = include_str!("../config.toml");

/// Frame callback rate bounds; the ticker period is `1 / fps`.
pub const MIN_FPS: f64 = 1.0;
pub const MAX_FPS: f64 = 1000.0;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub mode: ScenarioMode,
    pub fps: f64,
    /// Scenario milliseconds per wall-clock millisecond
    pub speed: f64,
    /// Standard deviation of frame timestamp jitter
    pub jitter_ms: f64,
    /// Drop every Nth frame; 0 disables
    pub drop_every: u32,
    pub autorun: bool,
    /// Number of play requests the simulated clip refuses
    pub reject_autoplay: u32,
    /// Clip position at which the simulated stream breaks
    pub fail_clip_at_sec: Option<f64>,
    pub log_every_frames: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            mode: ScenarioMode::Passive,
            fps: 60.0,
            speed: 1.0,
            jitter_ms: 0.0,
            drop_every: 0,
            autorun: false,
            reject_autoplay: 0,
            fail_clip_at_sec: None,
            log_every_frames: 60,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunnerConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub timing: ModeTable,
}

impl RunnerConfig {
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let cfg: Self = toml::from_str(raw).context("invalid runner config TOML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Re-run after command-line overrides.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.timing.validate().context("invalid timing tables")?;
        anyhow::ensure!(
            (MIN_FPS..=MAX_FPS).contains(&self.playback.fps),
            "playback.fps must be between {MIN_FPS} and {MAX_FPS}, got {}",
            self.playback.fps
        );
        anyhow::ensure!(
            self.playback.speed.is_finite() && self.playback.speed > 0.0,
            "playback.speed must be positive, got {}",
            self.playback.speed
        );
        anyhow::ensure!(
            self.playback.jitter_ms.is_finite() && self.playback.jitter_ms >= 0.0,
            "playback.jitter_ms must be zero or more, got {}",
            self.playback.jitter_ms
        );
        if let Some(at) = self.playback.fail_clip_at_sec {
            anyhow::ensure!(
                at.is_finite() && at >= 0.0,
                "playback.fail_clip_at_sec must be zero or more, got {at}"
            );
        }
        Ok(())
    }

    /// Read `path`, or the bundled config if it cannot be read.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("{}: {err}; using bundled config", path.display());
                BUNDLED_CONFIG.to_string()
            }
        };
        Self::from_toml_str(&raw).with_context(|| format!("loading {}", path.display()))
    }
}

/// ACTIVE timing cuts selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StrategyPreset {
    ThresholdList,
    SequentialGate,
    PauseAndReveal,
}

impl StrategyPreset {
    pub fn table(self) -> TimingConfig {
        match self {
            Self::ThresholdList => TimingConfig::active_threshold_list(),
            Self::SequentialGate => TimingConfig::active_sequential_gate(),
            Self::PauseAndReveal => TimingConfig::active_pause_and_reveal(),
        }
    }
}
