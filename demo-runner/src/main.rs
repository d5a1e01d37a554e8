//! main.rs — Sentinel demo runner
//!
//! Headless host for the scenario controller. Runs one cooperative loop:
//!   1. Frame ticker: synthetic display-refresh callbacks at `fps`, each
//!      stamped once and handed to the controller
//!   2. Command reader: JSON lines on stdin (run / reset / set_mode / ...)
//!
//! Snapshots go to stdout as JSON lines whenever any output changes, so a
//! running scenario streams one line per frame; logs go to stderr.

mod commands;
mod config;
mod frame_source;
mod output;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use sentinel_core::{
    FrameTicket, MediaError, MediaEvent, MediaSurface, MonotonicTimeSource, PlaybackDirector,
    ScenarioController, SimulatedClip, TickResult, TimeSource,
};
use sentinel_types::ScenarioMode;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use commands::Command;
use config::{RunnerConfig, StrategyPreset};
use frame_source::FrameSchedule;
use output::SnapshotWriter;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "sentinel-demo", about = "Sentinel protected/unprotected demo runner")]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
    /// Starting mode (passive | active)
    #[arg(long)]
    mode: Option<ScenarioMode>,
    /// Replace the ACTIVE table with a compiled-in cut
    #[arg(long, value_enum)]
    strategy: Option<StrategyPreset>,
    /// Frame callbacks per second
    #[arg(long)]
    fps: Option<f64>,
    /// Playback speed multiplier (1.0 = real-time)
    #[arg(long)]
    speed: Option<f64>,
    /// Gaussian frame timestamp jitter, standard deviation in ms
    #[arg(long)]
    jitter_ms: Option<f64>,
    /// Drop every Nth frame
    #[arg(long)]
    drop_every: Option<u32>,
    /// Refuse the first N play requests, like a browser blocking autoplay
    #[arg(long)]
    reject_autoplay: Option<u32>,
    /// Break the simulated clip once playback reaches this position (seconds)
    #[arg(long)]
    fail_clip_at: Option<f64>,
    /// Seed for the jitter generator
    #[arg(long)]
    seed: Option<u64>,
    /// Press Run on startup
    #[arg(long)]
    autorun: bool,
    /// Exit once the scenario holds
    #[arg(long)]
    exit_on_hold: bool,
}

impl Args {
    fn apply(&self, cfg: &mut RunnerConfig) {
        let p = &mut cfg.playback;
        if let Some(mode) = self.mode {
            p.mode = mode;
        }
        if let Some(fps) = self.fps {
            p.fps = fps;
        }
        if let Some(speed) = self.speed {
            p.speed = speed;
        }
        if let Some(jitter) = self.jitter_ms {
            p.jitter_ms = jitter;
        }
        if let Some(n) = self.drop_every {
            p.drop_every = n;
        }
        if let Some(n) = self.reject_autoplay {
            p.reject_autoplay = n;
        }
        if let Some(at) = self.fail_clip_at {
            p.fail_clip_at_sec = Some(at);
        }
        p.autorun |= self.autorun;
        if let Some(preset) = self.strategy {
            cfg.timing.active = preset.table();
        }
    }
}

// ── Main ──────────────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sentinel_demo=info,sentinel_core=info".into()),
        )
        .init();

    let args = Args::parse();
    let mut cfg = RunnerConfig::load(&args.config)?;
    args.apply(&mut cfg);
    cfg.validate().context("invalid command-line overrides")?;
    let playback = cfg.playback.clone();

    let mut ctl = ScenarioController::try_new(cfg.timing, playback.mode)?;
    info!(
        "🎬 Sentinel demo runner: {} ({}), {} fps at {}×",
        ctl.mode().label(),
        ctl.config().strategy.name(),
        playback.fps,
        playback.speed
    );

    let mut clip = SimulatedClip::new(ctl.config().clip_duration_sec)
        .with_autoplay_rejections(playback.reject_autoplay);
    if let Some(at) = playback.fail_clip_at_sec {
        clip = clip.failing_at(at, "MEDIA_ERR_NETWORK");
    }
    let mut director = PlaybackDirector::new();
    let mut frames = FrameSchedule::new(&playback, args.seed);
    let base = MonotonicTimeSource::new();
    let mut writer = SnapshotWriter::new(std::io::stdout());

    let mut ticker = interval(Duration::from_secs_f64(1.0 / playback.fps));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let mut ticket: Option<FrameTicket> = None;
    let mut last_frame_ms: Option<f64> = None;
    if playback.autorun {
        ticket = ctl.run();
    }
    writer.publish(ctl.snapshot())?;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(current) = ticket else { continue };
                if !ctl.wants_frames() {
                    continue;
                }
                let Some(now_ms) = frames.next(base.now_ms()) else {
                    debug!("Frame {} dropped", frames.frames());
                    continue;
                };

                if let Some(prev) = last_frame_ms.replace(now_ms) {
                    match clip.advance((now_ms - prev) / 1000.0) {
                        Some(MediaEvent::Ended) => info!("📼 Clip ended at {:.2}s", clip.current_time_sec()),
                        Some(MediaEvent::Error(err)) => ctl.report_media_error(&err),
                        None => {}
                    }
                }

                let (snapshot, complete) = match ctl.tick(current, now_ms) {
                    TickResult::Idle => continue,
                    TickResult::Update(s) => (s, false),
                    TickResult::Complete(s) => (s, true),
                };
                if let Some(err) = director.sync(&snapshot, &mut clip) {
                    ctl.report_media_error(&err);
                }

                if playback.log_every_frames > 0 && frames.frames() % playback.log_every_frames == 0 {
                    info!(
                        "⏱ t={:.2}s | video={:.2}s | risk={:?} | actions={}",
                        snapshot.elapsed_sec,
                        snapshot.video_time_sec,
                        snapshot.risk_level,
                        snapshot.actions.len()
                    );
                }
                writer.publish(ctl.snapshot())?;

                if complete {
                    info!(
                        "🏁 Scenario complete: {} actions, ledger head {}",
                        snapshot.actions.len(),
                        ctl.ledger().head_hash()
                    );
                    if args.exit_on_hold {
                        break;
                    }
                }
            }
            line = stdin.next_line(), if stdin_open => {
                match line {
                    Ok(Some(raw)) => {
                        let Some(cmd) = commands::parse(&raw) else { continue };
                        if cmd == Command::Quit {
                            info!("Quit requested");
                            break;
                        }
                        apply_command(cmd, &mut ctl, &mut ticket, &mut last_frame_ms);
                        let snapshot = ctl.snapshot();
                        if let Some(err) = director.sync(&snapshot, &mut clip) {
                            ctl.report_media_error(&err);
                        }
                        writer.publish(ctl.snapshot())?;
                    }
                    Ok(None) => {
                        debug!("stdin closed");
                        stdin_open = false;
                    }
                    Err(err) => {
                        warn!("stdin read failed: {err}");
                        stdin_open = false;
                    }
                }
            }
        }

        // Nothing left to drive and nobody to ask for more
        if !stdin_open && !ctl.wants_frames() {
            break;
        }
    }

    info!(
        "Runner stopped after {} frames, {} snapshots written",
        frames.frames(),
        writer.written()
    );
    Ok(())
}

fn apply_command(
    cmd: Command,
    ctl: &mut ScenarioController,
    ticket: &mut Option<FrameTicket>,
    last_frame_ms: &mut Option<f64>,
) {
    match cmd {
        Command::Run => {
            if let Some(fresh) = ctl.run() {
                *ticket = Some(fresh);
                *last_frame_ms = None;
            }
        }
        Command::Reset => {
            ctl.reset();
            *ticket = None;
        }
        Command::SetMode(mode) => {
            ctl.set_mode(mode);
            *ticket = None;
        }
        Command::MediaError(reason) => ctl.report_media_error(&MediaError::Load(reason)),
        Command::MediaClear => ctl.clear_media_error(),
        Command::Quit => {}
    }
}
