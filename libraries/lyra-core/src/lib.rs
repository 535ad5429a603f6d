//! Lyra Core
//!
//! Domain types and collaborator interfaces shared by the Lyra playback engine
//! and the applications that host it.
//!
//! The core crate defines:
//! - **Domain Types**: `Track` plus its `TrackId`, `ArtistRef` and `AlbumRef` references
//! - **Collaborator Traits**: `SongRepository` (track id to stream URL and metadata)
//!   and `ViewRegistrar` (credits a listen)
//! - **Error Handling**: `CoreError` and `Result`
//!
//! # Example
//!
//! ```rust
//! use lyra_core::{ArtistRef, Track, TrackId};
//!
//! let track = Track::new("song-1", "Night Drive", ArtistRef::new("artist-9", "Neon Coast"))
//!     .with_duration_secs(212.0);
//!
//! assert_eq!(track.id, TrackId::new("song-1"));
//! assert_eq!(track.duration_secs, Some(212.0));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{CoreError, Result};
pub use traits::{SongRepository, ViewRegistrar};
pub use types::{AlbumId, AlbumRef, ArtistId, ArtistRef, Track, TrackId};
