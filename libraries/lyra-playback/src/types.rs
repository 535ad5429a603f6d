//! Core types for playback management

use lyra_core::Track;
use serde::{Deserialize, Serialize};

use crate::progress::ListenPolicy;

/// Repeat mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when queue ends
    #[default]
    Off,

    /// Restart the session from history once the queue drains
    All,

    /// Loop current track only
    One,
}

impl RepeatMode {
    /// Next mode in the UI toggle cycle: Off -> All -> One -> Off
    #[must_use]
    pub fn cycle(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }
}

/// Configuration for the playback engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Maximum history size (default: 500)
    ///
    /// Also bounds repeat-all: the wrap restarts from the oldest remembered
    /// track, so once more than `history_size` tracks have played it lands
    /// on a later track than the one the session began with.
    pub history_size: usize,

    /// Initial volume (0.0-1.0, default: 1.0)
    pub volume: f32,

    /// Initial shuffle flag (default: off)
    pub shuffle: bool,

    /// Initial repeat mode (default: Off)
    pub repeat: RepeatMode,

    /// "Previous" restarts the current track past this position (default: 3s)
    pub restart_threshold_secs: f64,

    /// Seed for the shuffle picker; random when unset
    pub shuffle_seed: Option<u64>,

    /// Listen-progress thresholds
    pub listen: ListenPolicy,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            history_size: 500,
            volume: 1.0,
            shuffle: false,
            repeat: RepeatMode::Off,
            restart_threshold_secs: 3.0,
            shuffle_seed: None,
            listen: ListenPolicy::default(),
        }
    }
}

/// Read-only view of the engine state for UI consumers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub current_track: Option<Track>,
    pub playing: bool,
    pub current_time: f64,
    pub duration: f64,
    pub queue: Vec<Track>,
    pub history_len: usize,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub volume_percent: u8,
    pub muted: bool,
}
