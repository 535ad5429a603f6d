//! Playback history tracking
//!
//! Maintains a bounded back-stack of played tracks for "previous" and for
//! the repeat-all wrap.

use lyra_core::Track;
use std::collections::VecDeque;

/// Playback history with bounded size
///
/// Chronological: oldest at the front, most recently played at the back.
/// When full, the oldest entry is discarded.
#[derive(Debug, Clone)]
pub struct History {
    /// History buffer (most recent = back)
    tracks: VecDeque<Track>,

    /// Maximum history size
    max_size: usize,
}

impl History {
    /// Create new history with specified maximum size
    pub fn new(max_size: usize) -> Self {
        Self {
            tracks: VecDeque::new(),
            max_size,
        }
    }

    /// Add track to history
    ///
    /// If history is full, oldest track is discarded
    pub fn push(&mut self, track: Track) {
        if self.max_size == 0 {
            return;
        }
        if self.tracks.len() >= self.max_size {
            self.tracks.pop_front(); // Remove oldest
        }
        self.tracks.push_back(track);
    }

    /// Oldest track still remembered
    pub fn first(&self) -> Option<&Track> {
        self.tracks.front()
    }

    /// Pop most recent track from history
    pub fn pop(&mut self) -> Option<Track> {
        self.tracks.pop_back()
    }

    /// Get all history tracks (oldest first)
    pub fn get_all(&self) -> Vec<&Track> {
        self.tracks.iter().collect()
    }

    /// Get number of tracks in history
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.tracks.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyra_core::ArtistRef;

    fn create_test_track(id: &str) -> Track {
        Track::new(id, format!("Track {}", id), ArtistRef::new("artist", "Test Artist"))
    }

    #[test]
    fn create_history() {
        let history = History::new(10);
        assert_eq!(history.len(), 0);
        assert!(history.first().is_none());
    }

    #[test]
    fn first_is_oldest() {
        let mut history = History::new(10);
        history.push(create_test_track("1"));
        history.push(create_test_track("2"));

        assert_eq!(history.first().unwrap().id.as_str(), "1");
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn pop_from_history() {
        let mut history = History::new(10);
        history.push(create_test_track("1"));
        history.push(create_test_track("2"));
        history.push(create_test_track("3"));

        assert_eq!(history.pop().unwrap().id.as_str(), "3");
        assert_eq!(history.pop().unwrap().id.as_str(), "2");
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn history_bounded() {
        let mut history = History::new(3);

        for id in ["1", "2", "3", "4"] {
            history.push(create_test_track(id));
        }
        assert_eq!(history.len(), 3);

        // Oldest (Track 1) should be gone
        let all = history.get_all();
        assert_eq!(all[0].id.as_str(), "2");
        assert_eq!(all[1].id.as_str(), "3");
        assert_eq!(all[2].id.as_str(), "4");
        assert_eq!(history.first().unwrap().id.as_str(), "2");
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut history = History::new(0);
        history.push(create_test_track("1"));
        assert_eq!(history.len(), 0);
        assert!(history.pop().is_none());
    }

    #[test]
    fn clear_history() {
        let mut history = History::new(10);
        history.push(create_test_track("1"));
        history.push(create_test_track("2"));

        history.clear();
        assert_eq!(history.len(), 0);
        assert!(history.first().is_none());
    }

    #[test]
    fn default_history() {
        let mut history = History::default();
        for index in 0..501 {
            history.push(create_test_track(&index.to_string()));
        }
        assert_eq!(history.len(), 500);
        assert_eq!(history.first().unwrap().id.as_str(), "1");
    }
}
