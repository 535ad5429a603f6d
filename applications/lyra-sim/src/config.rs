/// Simulator configuration
use crate::error::{Result, SimError};
use lyra_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file read when no `--config` is given (optional)
pub const DEFAULT_CONFIG_FILE: &str = "lyra-sim.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SimConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default = "default_clock")]
    pub clock: ClockSettings,

    #[serde(default = "default_session")]
    pub session: SessionSettings,

    #[serde(default)]
    pub catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClockSettings {
    /// Real time between two position updates
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Virtual seconds played per real second
    #[serde(default = "default_speed")]
    pub speed: f64,

    /// Delay between a play request and audio starting
    #[serde(default = "default_start_latency_ms")]
    pub start_latency_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionSettings {
    /// Streams are served from `<stream_base_url><track id>`
    #[serde(default = "default_stream_base_url")]
    pub stream_base_url: String,

    /// Stop after this many track starts (repeat-all sessions never run dry)
    #[serde(default = "default_max_tracks")]
    pub max_tracks: usize,

    /// Real-time limit for the whole session
    #[serde(default = "default_time_limit_secs")]
    pub time_limit_secs: u64,

    /// Track ids whose stream cannot be resolved
    #[serde(default)]
    pub unavailable: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    pub artist: String,

    /// Real length of the stream
    pub duration_secs: f64,

    /// Whether the track metadata carries the duration; when false the
    /// engine only learns it once the stream is loaded
    #[serde(default = "default_duration_in_metadata")]
    pub duration_in_metadata: bool,
}

impl ClockSettings {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Virtual seconds that pass between two ticks
    pub fn step_secs(&self) -> f64 {
        self.tick_ms as f64 / 1000.0 * self.speed
    }

    pub fn start_latency(&self) -> Duration {
        Duration::from_millis(self.start_latency_ms)
    }
}

impl SimConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `lyra-sim.toml` in the
    /// working directory is read if present. `LYRA_`-prefixed variables
    /// override both, with `__` between nested keys
    /// (`LYRA_CLOCK__SPEED=8`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        settings = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(SimError::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                settings.add_source(config::File::from(path.to_path_buf()))
            }
            None => settings.add_source(
                config::File::from(PathBuf::from(DEFAULT_CONFIG_FILE)).required(false),
            ),
        };

        settings = settings.add_source(
            config::Environment::with_prefix("LYRA")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| SimError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| SimError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.catalog.is_empty() {
            return Err(SimError::Config(
                "Catalog is empty (add [[catalog]] entries to the config file)".to_string(),
            ));
        }

        if self.clock.tick_ms == 0 {
            return Err(SimError::Config("clock.tick_ms must be positive".to_string()));
        }

        if !(self.clock.speed.is_finite() && self.clock.speed > 0.0) {
            return Err(SimError::Config(format!(
                "clock.speed must be positive, got {}",
                self.clock.speed
            )));
        }

        // Larger steps look like seeks to the listen tracker and are never credited
        let step = self.clock.step_secs();
        if step >= self.playback.listen.max_tick_gap_secs {
            return Err(SimError::Config(format!(
                "Clock advances {:.2}s per tick; must stay below {:.2}s",
                step, self.playback.listen.max_tick_gap_secs
            )));
        }

        if let Some(entry) = self
            .catalog
            .iter()
            .find(|entry| !(entry.duration_secs.is_finite() && entry.duration_secs > 0.0))
        {
            return Err(SimError::Config(format!(
                "Track {} has invalid duration {}",
                entry.id, entry.duration_secs
            )));
        }

        if self.session.max_tracks == 0 {
            return Err(SimError::Config(
                "session.max_tracks must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

// Default values
fn default_clock() -> ClockSettings {
    ClockSettings {
        tick_ms: default_tick_ms(),
        speed: default_speed(),
        start_latency_ms: default_start_latency_ms(),
    }
}

fn default_tick_ms() -> u64 {
    250
}

fn default_speed() -> f64 {
    4.0
}

fn default_start_latency_ms() -> u64 {
    50
}

fn default_session() -> SessionSettings {
    SessionSettings {
        stream_base_url: default_stream_base_url(),
        max_tracks: default_max_tracks(),
        time_limit_secs: default_time_limit_secs(),
        unavailable: Vec::new(),
    }
}

fn default_stream_base_url() -> String {
    "https://media.lyra.local/stream/".to_string()
}

fn default_max_tracks() -> usize {
    50
}

fn default_time_limit_secs() -> u64 {
    600
}

fn default_duration_in_metadata() -> bool {
    true
}

impl Default for ClockSettings {
    fn default() -> Self {
        default_clock()
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        default_session()
    }
}
