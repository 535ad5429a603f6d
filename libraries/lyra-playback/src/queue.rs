//! Pending-track queue
//!
//! Ordered list of tracks scheduled after the current one. Advancing is FIFO
//! from the head unless shuffle picks an arbitrary index; "previous" pushes
//! the outgoing track back onto the front.

use lyra_core::{Track, TrackId};
use std::collections::VecDeque;

/// Queue of pending tracks
///
/// Structure:
/// ```text
/// Currently Playing: Track A
/// ─────────────────────────────
/// Queue (head plays next):
///   - Track B
///   - Track C
///   - Track D
/// ```
#[derive(Debug, Clone, Default)]
pub struct Queue {
    tracks: VecDeque<Track>,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append track to the end
    pub fn push_back(&mut self, track: Track) {
        self.tracks.push_back(track);
    }

    /// Put a track at the head so it plays next
    pub fn push_front(&mut self, track: Track) {
        self.tracks.push_front(track);
    }

    /// Pop the head (FIFO advance)
    pub fn pop_front(&mut self) -> Option<Track> {
        self.tracks.pop_front()
    }

    /// Remove track at `index`
    pub fn remove(&mut self, index: usize) -> Option<Track> {
        self.tracks.remove(index)
    }

    /// Replace the whole queue
    pub fn replace(&mut self, tracks: impl IntoIterator<Item = Track>) {
        self.tracks = tracks.into_iter().collect();
    }

    /// Load the part of a context list that follows `current`
    ///
    /// If `current` is not in `context`, the whole list is queued.
    pub fn load_context(&mut self, context: &[Track], current: &TrackId) {
        let start = context
            .iter()
            .position(|track| &track.id == current)
            .map_or(0, |index| index + 1);
        self.replace(context[start..].iter().cloned());
    }

    /// Drop every entry for the given track
    ///
    /// Returns the number of entries removed.
    pub fn remove_track(&mut self, id: &TrackId) -> usize {
        let before = self.tracks.len();
        self.tracks.retain(|track| &track.id != id);
        before - self.tracks.len()
    }

    /// Clear entire queue
    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    /// Get all tracks in play order
    pub fn get_all(&self) -> Vec<&Track> {
        self.tracks.iter().collect()
    }

    /// Get queue length
    pub fn len(&self) -> usize {
        self.tracks.len()
    }
}
