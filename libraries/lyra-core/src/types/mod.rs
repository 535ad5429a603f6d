mod ids;
mod track;

pub use ids::{AlbumId, ArtistId, TrackId};
pub use track::{AlbumRef, ArtistRef, Track};
