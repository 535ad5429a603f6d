/// Collaborator traits consumed by the playback engine
use crate::error::Result;
use crate::types::{Track, TrackId};
use async_trait::async_trait;
use url::Url;

/// Resolves track ids to metadata and streaming endpoints
///
/// Implementations usually sit on top of the backend's REST API. The engine
/// only relies on two properties of the returned URL: it is stable per track,
/// and the endpoint honours HTTP range requests (needed for seeking).
#[async_trait]
pub trait SongRepository: Send + Sync {
    /// Streaming endpoint for a track
    ///
    /// This is a pure derivation, no I/O is expected here.
    ///
    /// # Errors
    /// Returns an error if no URL can be formed for the id
    fn stream_url(&self, track_id: &TrackId) -> Result<Url>;

    /// Fetch the track's metadata
    ///
    /// # Errors
    /// Returns `CoreError::TrackNotFound` for unknown ids, or a network error
    async fn fetch_metadata(&self, track_id: &TrackId) -> Result<Track>;
}

/// Credits a listening session as a "view"
///
/// The engine calls this at most once per track per uninterrupted listening
/// session. Deduplication beyond that is up to the implementation.
#[async_trait]
pub trait ViewRegistrar: Send + Sync {
    /// Register one view for the track
    ///
    /// # Errors
    /// Returns an error if the backend rejected or never received the call
    async fn register_view(&self, track_id: &TrackId) -> Result<()>;
}
