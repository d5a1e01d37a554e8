//! sentinel-core — timeline-driven state machine for the Sentinel demo.
//!
//! Two hard-coded scenarios of the same forklift near-miss clip: PASSIVE
//! (no intervention, the collision plays out) and ACTIVE (the agent detects
//! the hazard and executes mitigation actions). Everything is driven by
//! frame timestamps handed in by the host; no network, no persistence.

pub mod clock;
pub mod controller;
pub mod decision_log;
mod error;
pub mod media;
pub mod overlay;
pub mod reveal;
pub mod risk;
pub mod sequencer;
pub mod timing;

pub use clock::{ManualTimeSource, MonotonicTimeSource, ScenarioClock, TimeSource};
pub use controller::{FrameTicket, ScenarioController, TickResult};
pub use decision_log::{DecisionLedger, LedgerBlock, LedgerEventType};
pub use error::{ConfigError, MediaError};
pub use media::{MediaEvent, MediaSurface, PlaybackDirector, SimulatedClip};
pub use timing::{ActionTriggerStrategy, ModeTable, TimingConfig};
