//! Error types for the playback engine

use lyra_core::CoreError;
use thiserror::Error;

/// Failures reported by a `MediaSink` when asked to start playback
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// Stream unreachable or undecodable
    #[error("Failed to load stream: {0}")]
    Load(String),

    /// Platform policy refused to start playback (autoplay restrictions)
    #[error("Playback blocked: {0}")]
    PlaybackBlocked(String),
}

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No track is currently loaded
    #[error("No track loaded")]
    NoTrackLoaded,

    /// Index out of bounds
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// Media output failed to load or start
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// View registrar rejected the credit call
    #[error("View registration failed: {0}")]
    Registration(#[source] CoreError),

    /// Song repository failed to resolve a track
    #[error("Song repository error: {0}")]
    Repository(#[source] CoreError),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
