/// In-memory song repository built from the configured catalog
use crate::config::SimConfig;
use crate::error::{Result, SimError};
use async_trait::async_trait;
use lyra_core::{ArtistRef, CoreError, SongRepository, Track, TrackId};
use std::collections::{HashMap, HashSet};
use url::Url;

pub struct CatalogRepository {
    base_url: Url,
    tracks: Vec<Track>,
    durations: HashMap<String, f64>,
    unavailable: HashSet<TrackId>,
}

impl CatalogRepository {
    pub fn from_config(config: &SimConfig) -> Result<Self> {
        let mut base = config.session.stream_base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| {
            SimError::Config(format!("Invalid stream_base_url {:?}: {}", base, e))
        })?;

        let mut tracks = Vec::with_capacity(config.catalog.len());
        let mut durations = HashMap::with_capacity(config.catalog.len());
        for entry in &config.catalog {
            let artist = ArtistRef::new(artist_slug(&entry.artist), entry.artist.clone());
            let mut track = Track::new(entry.id.clone(), entry.title.clone(), artist);
            if entry.duration_in_metadata {
                track = track.with_duration_secs(entry.duration_secs);
            }
            tracks.push(track);
            durations.insert(entry.id.clone(), entry.duration_secs);
        }

        let unavailable = config
            .session
            .unavailable
            .iter()
            .map(|id| TrackId::new(id.as_str()))
            .collect();

        Ok(Self {
            base_url,
            tracks,
            durations,
            unavailable,
        })
    }

    /// Tracks in catalog order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Real stream lengths keyed by the last URL path segment
    pub fn stream_durations(&self) -> HashMap<String, f64> {
        self.durations.clone()
    }
}

#[async_trait]
impl SongRepository for CatalogRepository {
    fn stream_url(&self, track_id: &TrackId) -> lyra_core::Result<Url> {
        if !self.durations.contains_key(track_id.as_str()) {
            return Err(CoreError::TrackNotFound(track_id.clone()));
        }
        if self.unavailable.contains(track_id) {
            return Err(CoreError::network(format!("stream for {} is offline", track_id)));
        }

        Ok(self.base_url.join(track_id.as_str())?)
    }

    async fn fetch_metadata(&self, track_id: &TrackId) -> lyra_core::Result<Track> {
        self.tracks
            .iter()
            .find(|track| &track.id == track_id)
            .cloned()
            .ok_or_else(|| CoreError::TrackNotFound(track_id.clone()))
    }
}

fn artist_slug(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogEntry;

    fn config() -> SimConfig {
        let mut config = SimConfig {
            catalog: vec![
                CatalogEntry {
                    id: "night-drive".to_string(),
                    title: "Night Drive".to_string(),
                    artist: "Neon Coast".to_string(),
                    duration_secs: 212.0,
                    duration_in_metadata: true,
                },
                CatalogEntry {
                    id: "interlude".to_string(),
                    title: "Interlude".to_string(),
                    artist: "Neon Coast".to_string(),
                    duration_secs: 41.5,
                    duration_in_metadata: false,
                },
            ],
            ..Default::default()
        };
        config.session.stream_base_url = "https://cdn.test/audio".to_string();
        config.session.unavailable = vec!["interlude".to_string()];
        config
    }

    #[test]
    fn builds_tracks_in_catalog_order() {
        let repo = CatalogRepository::from_config(&config()).unwrap();
        let tracks = repo.tracks();

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].id.as_str(), "night-drive");
        assert_eq!(tracks[0].duration_secs, Some(212.0));
        assert_eq!(tracks[0].artist.id.as_str(), "neon-coast");
        assert_eq!(tracks[1].duration_secs, None);
        assert_eq!(repo.stream_durations()["interlude"], 41.5);
    }

    #[test]
    fn stream_urls_live_under_base() {
        let repo = CatalogRepository::from_config(&config()).unwrap();

        let url = repo.stream_url(&TrackId::new("night-drive")).unwrap();
        assert_eq!(url.as_str(), "https://cdn.test/audio/night-drive");
    }

    #[test]
    fn unknown_and_offline_tracks_have_no_stream() {
        let repo = CatalogRepository::from_config(&config()).unwrap();

        assert!(matches!(
            repo.stream_url(&TrackId::new("missing")),
            Err(CoreError::TrackNotFound(_))
        ));
        assert!(matches!(
            repo.stream_url(&TrackId::new("interlude")),
            Err(CoreError::Network(_))
        ));
    }

    #[tokio::test]
    async fn fetches_metadata_by_id() {
        let repo = CatalogRepository::from_config(&config()).unwrap();

        let track = repo
            .fetch_metadata(&TrackId::new("night-drive"))
            .await
            .unwrap();
        assert_eq!(track.title, "Night Drive");
        assert!(repo.fetch_metadata(&TrackId::new("nope")).await.is_err());
    }
}
