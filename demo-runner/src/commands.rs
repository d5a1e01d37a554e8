//! commands.rs — Operator commands read from stdin
//!
//! One JSON object per line: `{ "cmd": "...", "args": {...} }`.

use sentinel_types::ScenarioMode;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run,
    Reset,
    SetMode(ScenarioMode),
    /// Simulate the clip failing to load
    MediaError(String),
    MediaClear,
    Quit,
}

/// Unknown or malformed lines are logged and skipped.
pub fn parse(raw: &str) -> Option<Command> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let v: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(err) => {
            warn!("Ignoring malformed command line: {err}");
            return None;
        }
    };
    let cmd = v["cmd"].as_str().unwrap_or("");
    match cmd {
        "run" => Some(Command::Run),
        "reset" => Some(Command::Reset),
        "set_mode" => {
            let raw_mode = v["args"]["mode"].as_str().unwrap_or("");
            match raw_mode.parse::<ScenarioMode>() {
                Ok(mode) => Some(Command::SetMode(mode)),
                Err(err) => {
                    warn!("set_mode: {err}");
                    None
                }
            }
        }
        "media_error" => {
            let reason = v["args"]["reason"]
                .as_str()
                .unwrap_or("MEDIA_ERR_SRC_NOT_SUPPORTED");
            Some(Command::MediaError(reason.to_string()))
        }
        "media_clear" => Some(Command::MediaClear),
        "quit" => Some(Command::Quit),
        _ => {
            warn!("Unknown control command: {cmd}");
            None
        }
    }
}
