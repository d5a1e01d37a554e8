use thiserror::Error;

/// Rejections raised while loading or validating the timing tables.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid timing config TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{mode}: `{field}` must be a finite, non-negative number of seconds (got {value})")]
    InvalidTime {
        mode: &'static str,
        field: &'static str,
        value: f64,
    },

    #[error("{mode}: `{field}` must be greater than zero (got {value})")]
    NonPositive {
        mode: &'static str,
        field: &'static str,
        value: f64,
    },

    #[error("{mode}: action triggers are not sorted by time (`{id}` at {at_sec}s follows {previous_sec}s)")]
    UnsortedTriggers {
        mode: &'static str,
        id: String,
        at_sec: f64,
        previous_sec: f64,
    },

    #[error("{mode}: duplicate action id `{id}`")]
    DuplicateActionId { mode: &'static str, id: String },

    #[error("{mode}: sequential gate #{index} has no actions")]
    EmptyGate { mode: &'static str, index: usize },

    #[error("passive: the unprotected run takes no decisions; expected an empty threshold_list, got `{strategy}` with {actions} action(s)")]
    PassiveActions { strategy: &'static str, actions: usize },

    #[error("{mode}: gate `{id}` at {at_sec}s comes after the hold at {hold_at_sec}s and would never fire")]
    GateAfterHold {
        mode: &'static str,
        id: String,
        at_sec: f64,
        hold_at_sec: f64,
    },

    #[error("{mode}: reveal steps must be ordered and after the deciding cutoff (step `{id}` at {after_hold_ms}ms)")]
    RevealOutOfOrder {
        mode: &'static str,
        id: String,
        after_hold_ms: u64,
    },
}

/// Failures reported by the media surface. None of them stop the scenario.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    /// Autoplay was refused by the host; playback may start later.
    #[error("playback not permitted yet: {0}")]
    PlaybackRejected(String),

    /// The clip could not be decoded or fetched.
    #[error("media failed to load: {0}")]
    Load(String),
}
