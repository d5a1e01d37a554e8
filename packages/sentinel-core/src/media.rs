//! media.rs — Media surface contract
//!
//! The clip itself is an external collaborator. The core only asks it to
//! play, pause and rewind, and reads its position. Rejected autoplay is
//! swallowed; a load failure flips the scenario into the "signal lost"
//! placeholder while the synthetic clock keeps going.

use sentinel_types::{ScenarioPhase, ScenarioSnapshot};
use tracing::{debug, warn};

use crate::error::MediaError;

pub trait MediaSurface {
    /// May be refused by the host; callers must not treat that as fatal.
    fn play(&mut self) -> Result<(), MediaError>;
    fn pause(&mut self);
    fn rewind(&mut self);
    fn current_time_sec(&self) -> f64;
    fn is_playing(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEvent {
    Ended,
    Error(MediaError),
}

// ── Simulated clip ────────────────────────────────────────────────────────────

/// In-memory stand-in for the demo clip, advanced by frame deltas.
#[derive(Debug, Clone)]
pub struct SimulatedClip {
    duration_sec: f64,
    position_sec: f64,
    playing: bool,
    rejections_left: u32,
    load_failure: Option<String>,
    /// Position at which the stream breaks mid-playback
    fail_at: Option<(f64, String)>,
    ended_reported: bool,
}

impl SimulatedClip {
    pub fn new(duration_sec: f64) -> Self {
        Self {
            duration_sec,
            position_sec: 0.0,
            playing: false,
            rejections_left: 0,
            load_failure: None,
            fail_at: None,
            ended_reported: false,
        }
    }

    /// Refuse the next `n` play requests, like a host blocking autoplay.
    pub fn with_autoplay_rejections(mut self, n: u32) -> Self {
        self.rejections_left = n;
        self
    }

    /// Fail every play request with a load error.
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.load_failure = Some(reason.into());
        self
    }

    /// Break the stream once playback reaches `position_sec`. The clip stops
    /// there and refuses to play again.
    pub fn failing_at(mut self, position_sec: f64, reason: impl Into<String>) -> Self {
        self.fail_at = Some((position_sec, reason.into()));
        self
    }

    pub fn advance(&mut self, dt_sec: f64) -> Option<MediaEvent> {
        if !self.playing {
            return None;
        }
        self.position_sec = (self.position_sec + dt_sec).min(self.duration_sec);
        if matches!(&self.fail_at, Some((at_sec, _)) if self.position_sec >= *at_sec) {
            let (at_sec, reason) = self.fail_at.take()?;
            self.position_sec = at_sec.min(self.duration_sec);
            self.playing = false;
            self.load_failure = Some(reason.clone());
            return Some(MediaEvent::Error(MediaError::Load(reason)));
        }
        if self.position_sec >= self.duration_sec && !self.ended_reported {
            self.playing = false;
            self.ended_reported = true;
            return Some(MediaEvent::Ended);
        }
        None
    }
}

impl MediaSurface for SimulatedClip {
    fn play(&mut self) -> Result<(), MediaError> {
        if let Some(reason) = &self.load_failure {
            return Err(MediaError::Load(reason.clone()));
        }
        if self.rejections_left > 0 {
            self.rejections_left -= 1;
            return Err(MediaError::PlaybackRejected("autoplay blocked".into()));
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn rewind(&mut self) {
        self.position_sec = 0.0;
        self.ended_reported = false;
    }

    fn current_time_sec(&self) -> f64 {
        self.position_sec
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

// ── Playback director ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Playback {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Keeps the surface in step with the published snapshots: stopped and
/// rewound while idle or acquiring the feed, playing while running, paused
/// on the held frame.
#[derive(Debug, Default)]
pub struct PlaybackDirector {
    state: Playback,
}

impl PlaybackDirector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a load failure for the caller to report; rejected autoplay is
    /// logged and dropped here.
    pub fn sync(
        &mut self,
        snapshot: &ScenarioSnapshot,
        surface: &mut dyn MediaSurface,
    ) -> Option<MediaError> {
        let wanted = match snapshot.phase {
            ScenarioPhase::Idle => Playback::Stopped,
            ScenarioPhase::Running if snapshot.overlays.acquiring_feed => Playback::Stopped,
            ScenarioPhase::Running => Playback::Playing,
            ScenarioPhase::Held => Playback::Paused,
        };
        if wanted == self.state {
            return None;
        }
        self.state = wanted;

        match wanted {
            Playback::Stopped => {
                surface.pause();
                surface.rewind();
                None
            }
            Playback::Paused => {
                surface.pause();
                None
            }
            Playback::Playing => match surface.play() {
                Ok(()) => None,
                Err(MediaError::PlaybackRejected(reason)) => {
                    debug!("Autoplay prevented: {reason}");
                    None
                }
                Err(err) => {
                    warn!("Media surface failed: {err}");
                    Some(err)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_types::ScenarioMode;

    fn snapshot(phase: ScenarioPhase, acquiring: bool) -> ScenarioSnapshot {
        let mut s = ScenarioSnapshot::idle(ScenarioMode::Active, false);
        s.phase = phase;
        s.overlays.acquiring_feed = acquiring;
        s
    }

    #[test]
    fn holds_playback_until_feed_acquired() {
        let mut clip = SimulatedClip::new(14.0);
        let mut director = PlaybackDirector::new();
        director.sync(&snapshot(ScenarioPhase::Running, true), &mut clip);
        assert!(!clip.is_playing());
        director.sync(&snapshot(ScenarioPhase::Running, false), &mut clip);
        assert!(clip.is_playing());
        director.sync(&snapshot(ScenarioPhase::Held, false), &mut clip);
        assert!(!clip.is_playing());
    }

    #[test]
    fn autoplay_rejection_is_swallowed() {
        let mut clip = SimulatedClip::new(14.0).with_autoplay_rejections(1);
        let mut director = PlaybackDirector::new();
        assert_eq!(director.sync(&snapshot(ScenarioPhase::Running, false), &mut clip), None);
        assert!(!clip.is_playing());
    }

    #[test]
    fn load_failure_is_reported_once() {
        let mut clip = SimulatedClip::new(14.0).failing("decode error");
        let mut director = PlaybackDirector::new();
        let running = snapshot(ScenarioPhase::Running, false);
        assert_eq!(
            director.sync(&running, &mut clip),
            Some(MediaError::Load("decode error".into()))
        );
        assert_eq!(director.sync(&running, &mut clip), None);
    }

    #[test]
    fn idle_rewinds_the_clip() {
        let mut clip = SimulatedClip::new(14.0);
        let mut director = PlaybackDirector::new();
        director.sync(&snapshot(ScenarioPhase::Running, false), &mut clip);
        clip.advance(2.0);
        director.sync(&snapshot(ScenarioPhase::Idle, false), &mut clip);
        assert_eq!(clip.current_time_sec(), 0.0);
    }

    #[test]
    fn stream_breaks_mid_playback() {
        let mut clip = SimulatedClip::new(14.0).failing_at(2.0, "network stalled");
        clip.play().unwrap();
        assert_eq!(clip.advance(1.5), None);
        assert_eq!(
            clip.advance(1.0),
            Some(MediaEvent::Error(MediaError::Load("network stalled".into())))
        );
        assert!(!clip.is_playing());
        assert_eq!(clip.current_time_sec(), 2.0);
        assert_eq!(clip.advance(1.0), None);

        // a broken stream stays broken across rewinds
        clip.rewind();
        assert_eq!(clip.play(), Err(MediaError::Load("network stalled".into())));
    }

    #[test]
    fn clip_reports_end_once() {
        let mut clip = SimulatedClip::new(1.0);
        clip.play().unwrap();
        assert_eq!(clip.advance(0.6), None);
        assert_eq!(clip.advance(0.6), Some(MediaEvent::Ended));
        assert_eq!(clip.advance(0.6), None);
        assert_eq!(clip.current_time_sec(), 1.0);
    }
}
