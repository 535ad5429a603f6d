//! Player Events
//!
//! Event-based communication for UI synchronization. Events are queued as
//! the engine changes state and handed out by `PlaybackEngine::drain_events`.

use lyra_core::TrackId;
use serde::{Deserialize, Serialize};

/// Events emitted by the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerEvent {
    /// Playing flag changed
    StateChanged {
        /// Whether audio is now playing
        playing: bool,
    },

    /// A different track became current
    TrackChanged {
        /// ID of the new (current) track
        track_id: TrackId,
        /// ID of the previous track (if any)
        previous_track_id: Option<TrackId>,
    },

    /// Queue changed (tracks added/removed/replaced)
    QueueChanged {
        /// New queue length
        length: usize,
    },

    /// Volume changed
    VolumeChanged {
        /// New volume level (0-100)
        percent: u8,
        /// Whether audio is muted
        muted: bool,
    },

    /// A view was credited for the track
    ViewRegistered {
        /// ID of the credited track
        track_id: TrackId,
    },

    /// Loading or starting the stream failed; the track stays selected
    PlaybackFailed {
        /// ID of the track that failed
        track_id: TrackId,
        /// Error message
        message: String,
    },
}
