/// Track domain type
use super::ids::{AlbumId, ArtistId, TrackId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reference to the artist credited on a track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    /// Artist identifier
    pub id: ArtistId,

    /// Display name
    pub name: String,
}

impl ArtistRef {
    /// Create an artist reference
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ArtistId::new(id),
            name: name.into(),
        }
    }
}

/// Reference to the album a track belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumRef {
    /// Album identifier
    pub id: AlbumId,

    /// Album title
    pub title: String,
}

impl AlbumRef {
    /// Create an album reference
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: AlbumId::new(id),
            title: title.into(),
        }
    }
}

/// Playable audio item
///
/// Immutable value owned by the song repository; the engine only holds
/// clones of it. Two tracks are "the same track" when their ids match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Credited artist
    pub artist: ArtistRef,

    /// Cover image reference (resolved by the image service)
    #[serde(default)]
    pub cover: Option<String>,

    /// Duration in seconds, unknown until the stream's metadata loads
    #[serde(default)]
    pub duration_secs: Option<f64>,

    /// Whether the track is publicly listed
    #[serde(default = "default_public")]
    pub is_public: bool,

    /// Album the track belongs to
    #[serde(default)]
    pub album: Option<AlbumRef>,
}

fn default_public() -> bool {
    true
}

impl Track {
    /// Create a public track with minimal metadata
    pub fn new(id: impl Into<String>, title: impl Into<String>, artist: ArtistRef) -> Self {
        Self {
            id: TrackId::new(id),
            title: title.into(),
            artist,
            cover: None,
            duration_secs: None,
            is_public: true,
            album: None,
        }
    }

    /// Set the known duration
    #[must_use]
    pub fn with_duration_secs(mut self, secs: f64) -> Self {
        self.duration_secs = Some(secs);
        self
    }

    /// Attach an album reference
    #[must_use]
    pub fn with_album(mut self, album: AlbumRef) -> Self {
        self.album = Some(album);
        self
    }

    /// Attach a cover reference
    #[must_use]
    pub fn with_cover(mut self, cover: impl Into<String>) -> Self {
        self.cover = Some(cover.into());
        self
    }

    /// Mark the track as private
    #[must_use]
    pub fn private(mut self) -> Self {
        self.is_public = false;
        self
    }

    /// Get the track duration as a Duration
    ///
    /// `None` while unknown or when the stored value is not a usable length.
    pub fn duration(&self) -> Option<Duration> {
        self.duration_secs
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map(Duration::from_secs_f64)
    }

    /// Whether `other` refers to the same track
    pub fn same_as(&self, other: &Track) -> bool {
        self.id == other.id
    }
}
