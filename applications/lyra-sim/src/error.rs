/// Simulator error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(#[from] lyra_core::CoreError),

    #[error("Playback error: {0}")]
    Playback(#[from] lyra_playback::PlaybackError),

    #[error("Engine stopped before the session finished")]
    EngineStopped,
}
