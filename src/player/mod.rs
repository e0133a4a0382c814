//! Domain model for the remote MPC-HC style player.
//!
//! The remote device reports its status as a flat JSON object
//! (`state`, `file`, `volumelevel`, `muted`, `durationstring`) and accepts
//! commands as query-string command codes. This module holds the state and
//! command vocabularies plus the projection functions that turn a raw
//! status snapshot into player properties.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Projected playback state of the media-player entity.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    /// No snapshot, or the device reported the `connect` sentinel
    #[default]
    Off,
    Playing,
    Paused,
    /// Any other reported state
    Idle,
}

impl PlayerState {
    /// Map the raw `state` field to the projected state.
    ///
    /// `None` covers both a missing snapshot and a snapshot without a
    /// usable `state` field.
    pub fn from_remote(state: Option<&str>) -> Self {
        match state {
            None | Some("connect") => Self::Off,
            Some("playing") => Self::Playing,
            Some("paused") => Self::Paused,
            Some(_) => Self::Idle,
        }
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "off"),
            Self::Playing => write!(f, "playing"),
            Self::Paused => write!(f, "paused"),
            Self::Idle => write!(f, "idle"),
        }
    }
}

/// Command codes the remote player accepts as the `command` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandCode {
    VolumeUp,
    VolumeDown,
    Mute,
    Play,
    PlayPause,
    Stop,
    NextTrack,
    PreviousTrack,
}

impl CommandCode {
    /// Wire representation sent to the device.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VolumeUp => "player_volume_up",
            Self::VolumeDown => "player_volume_down",
            Self::Mute => "player_mute",
            Self::Play => "player_play",
            Self::PlayPause => "player_play_pause",
            Self::Stop => "player_stop",
            Self::NextTrack => "player_next_track",
            Self::PreviousTrack => "player_previous_track",
        }
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Feature flags the entity advertises to the host framework.
pub mod support {
    pub const VOLUME_MUTE: u32 = 1 << 0;
    pub const VOLUME_STEP: u32 = 1 << 1;
    pub const PAUSE: u32 = 1 << 2;
    pub const PLAY: u32 = 1 << 3;
    pub const STOP: u32 = 1 << 4;
    pub const PREVIOUS_TRACK: u32 = 1 << 5;
    pub const NEXT_TRACK: u32 = 1 << 6;
    pub const SELECT_SOURCE: u32 = 1 << 7;
    pub const TURN_ON: u32 = 1 << 8;
    pub const TURN_OFF: u32 = 1 << 9;

    /// Everything the multiroom device supports.
    pub const ALL: u32 = VOLUME_MUTE
        | VOLUME_STEP
        | PAUSE
        | PLAY
        | STOP
        | PREVIOUS_TRACK
        | NEXT_TRACK
        | SELECT_SOURCE
        | TURN_ON
        | TURN_OFF;
}

// =============================================================================
// Snapshot projection
// =============================================================================
//
// The snapshot is the raw JSON object from the status endpoint, replaced
// wholesale on every successful poll. Field typing is lenient: the device
// is known to send numbers as strings depending on firmware.

/// Projected state of a snapshot (`None` = adapter is off).
pub fn state_of(snapshot: Option<&Value>) -> PlayerState {
    PlayerState::from_remote(snapshot.and_then(|s| s.get("state")).and_then(Value::as_str))
}

/// Title of the currently playing media (`file` field).
pub fn title_of(snapshot: &Value) -> Option<String> {
    snapshot
        .get("file")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Volume as a percentage (0..100). The device reports a 0..1 fraction,
/// as a number or a numeric string; missing or unparseable reads as 0.
pub fn volume_percent_of(snapshot: &Value) -> f32 {
    let fraction = match snapshot.get("volumelevel") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    (fraction * 100.0) as f32
}

/// Mute flag: the device reports `"1"` when muted.
pub fn is_muted(snapshot: &Value) -> bool {
    snapshot.get("muted").and_then(Value::as_str) == Some("1")
}

/// Duration of the current media in whole seconds, from the
/// `durationstring` field (`HH:MM:SS`, missing reads as `00:00:00`).
/// A malformed string is an error the caller sees.
pub fn duration_secs_of(snapshot: &Value) -> Result<u32> {
    let raw = snapshot
        .get("durationstring")
        .and_then(Value::as_str)
        .unwrap_or("00:00:00");
    parse_duration(raw)
}

/// Parse an `HH:MM:SS` duration string into total seconds.
pub fn parse_duration(s: &str) -> Result<u32> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 3 {
        return Err(anyhow!("malformed duration string: {s:?}"));
    }
    let field = |i: usize| -> Result<u32> {
        parts[i]
            .parse::<u32>()
            .with_context(|| format!("malformed duration string: {s:?}"))
    };
    let (hours, minutes, seconds) = (field(0)?, field(1)?, field(2)?);
    hours
        .checked_mul(3600)
        .and_then(|total| total.checked_add(minutes.checked_mul(60)?))
        .and_then(|total| total.checked_add(seconds))
        .ok_or_else(|| anyhow!("malformed duration string: {s:?}"))
}
