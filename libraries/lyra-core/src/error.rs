/// Core error types for Lyra
use crate::types::TrackId;
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors reported by the engine's external collaborators
#[derive(Error, Debug)]
pub enum CoreError {
    /// Track does not exist (or is not visible to the caller)
    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),

    /// A stream URL could not be built for a track
    #[error("Invalid stream URL: {0}")]
    InvalidUrl(String),

    /// Transport-level failure talking to the backend
    #[error("Network error: {0}")]
    Network(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl CoreError {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create an invalid URL error
    pub fn invalid_url(msg: impl Into<String>) -> Self {
        Self::InvalidUrl(msg.into())
    }
}

impl From<url::ParseError> for CoreError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}
