//! Transport controller
//!
//! Owns the binding between the engine and the one media output. Every
//! rebind and every play/pause request bumps a counter; a pending play
//! completion carries a `PlayTicket` snapshot of those counters and is only
//! honoured if nothing has superseded it by the time it resolves.

use lyra_core::TrackId;
use tokio::sync::mpsc;
use url::Url;

use crate::sink::{MediaSink, PlayFuture, SinkEvent};

/// Identity of one play request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayTicket {
    /// Track the output was bound to when the request was made
    pub track_id: TrackId,
    generation: u64,
    request: u64,
}

/// Binding between the engine and its media output
pub struct Transport<S> {
    sink: S,
    bound: Option<TrackId>,
    /// Bumped on every (un)bind
    generation: u64,
    /// Bumped on every play or pause request
    request: u64,
    /// Last request was "play" and nothing cancelled it since
    play_requested: bool,
}

impl<S: MediaSink> Transport<S> {
    /// Take ownership of the output
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            bound: None,
            generation: 0,
            request: 0,
            play_requested: false,
        }
    }

    /// Route the output's lifecycle events to `events`
    pub fn subscribe(&mut self, events: mpsc::UnboundedSender<SinkEvent>) {
        self.sink.subscribe(events);
    }

    /// Bind the output to a track's stream
    ///
    /// Invalidates every outstanding ticket.
    pub fn bind(&mut self, track_id: TrackId, url: &Url) {
        self.generation += 1;
        self.request += 1;
        self.play_requested = false;
        self.sink.load(url);
        self.bound = Some(track_id);
    }

    /// Drop the binding (the stream could not be resolved)
    pub fn unbind(&mut self) {
        self.generation += 1;
        self.request += 1;
        self.play_requested = false;
        self.sink.pause();
        self.bound = None;
    }

    /// Track the output is currently bound to
    pub fn bound_track(&self) -> Option<&TrackId> {
        self.bound.as_ref()
    }

    /// Ask the output to play the bound stream
    ///
    /// Returns `None` when nothing is bound.
    pub fn request_play(&mut self) -> Option<(PlayTicket, PlayFuture)> {
        let track_id = self.bound.clone()?;
        self.request += 1;
        self.play_requested = true;
        let ticket = PlayTicket {
            track_id,
            generation: self.generation,
            request: self.request,
        };
        Some((ticket, self.sink.play()))
    }

    /// Pause the output; any in-flight play request becomes stale
    pub fn pause(&mut self) {
        self.request += 1;
        self.play_requested = false;
        self.sink.pause();
    }

    /// Whether the most recent request was to play
    pub fn play_requested(&self) -> bool {
        self.play_requested
    }

    /// Whether a completion for `ticket` may still be applied
    pub fn is_current(&self, ticket: &PlayTicket) -> bool {
        self.bound.as_ref() == Some(&ticket.track_id)
            && self.generation == ticket.generation
            && self.request == ticket.request
    }

    /// Seek, clamped to `[0, duration]` (only the lower bound while the
    /// duration is unknown). Returns the position actually applied.
    pub fn seek(&mut self, seconds: f64, duration: f64) -> f64 {
        let mut position = if seconds.is_nan() { 0.0 } else { seconds.max(0.0) };
        if duration.is_finite() && duration > 0.0 {
            position = position.min(duration);
        }
        self.sink.seek(position);
        position
    }

    /// Output position in seconds
    pub fn current_time(&self) -> f64 {
        self.sink.current_time()
    }

    /// Output duration, `None` while unknown
    pub fn duration(&self) -> Option<f64> {
        let duration = self.sink.duration();
        (duration.is_finite() && duration > 0.0).then_some(duration)
    }

    /// Set output level
    pub fn set_volume(&mut self, level: f32) {
        self.sink.set_volume(level);
    }

    /// Borrow the output
    pub fn sink(&self) -> &S {
        &self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::FutureExt;

    #[derive(Default)]
    struct FakeSink {
        loaded: Vec<String>,
        position: f64,
        duration: f64,
        volume: f32,
        paused: usize,
    }

    impl MediaSink for FakeSink {
        fn subscribe(&mut self, _events: mpsc::UnboundedSender<SinkEvent>) {}

        fn load(&mut self, url: &Url) {
            self.loaded.push(url.to_string());
            self.position = 0.0;
        }

        fn play(&mut self) -> PlayFuture {
            async { Ok(()) }.boxed()
        }

        fn pause(&mut self) {
            self.paused += 1;
        }

        fn seek(&mut self, seconds: f64) {
            self.position = seconds;
        }

        fn current_time(&self) -> f64 {
            self.position
        }

        fn duration(&self) -> f64 {
            self.duration
        }

        fn volume(&self) -> f32 {
            self.volume
        }

        fn set_volume(&mut self, level: f32) {
            self.volume = level;
        }
    }

    fn url(id: &str) -> Url {
        Url::parse(&format!("https://stream.example.com/songs/{}", id)).unwrap()
    }

    #[test]
    fn nothing_to_play_when_unbound() {
        let mut transport = Transport::new(FakeSink::default());
        assert!(transport.request_play().is_none());
    }

    #[test]
    fn ticket_current_until_superseded() {
        let mut transport = Transport::new(FakeSink::default());
        transport.bind(TrackId::new("a"), &url("a"));

        let (ticket, _) = transport.request_play().unwrap();
        assert_eq!(ticket.track_id.as_str(), "a");
        assert!(transport.is_current(&ticket));

        transport.bind(TrackId::new("b"), &url("b"));
        assert!(!transport.is_current(&ticket));
    }

    #[test]
    fn rebinding_same_track_invalidates_old_ticket() {
        let mut transport = Transport::new(FakeSink::default());
        transport.bind(TrackId::new("a"), &url("a"));
        let (first, _) = transport.request_play().unwrap();

        transport.bind(TrackId::new("b"), &url("b"));
        transport.bind(TrackId::new("a"), &url("a"));
        let (second, _) = transport.request_play().unwrap();

        assert!(!transport.is_current(&first));
        assert!(transport.is_current(&second));
    }

    #[test]
    fn pause_invalidates_pending_play() {
        let mut transport = Transport::new(FakeSink::default());
        transport.bind(TrackId::new("a"), &url("a"));
        let (ticket, _) = transport.request_play().unwrap();

        assert!(transport.play_requested());

        transport.pause();
        assert!(!transport.is_current(&ticket));
        assert!(!transport.play_requested());
        assert_eq!(transport.sink().paused, 1);
    }

    #[test]
    fn unbind_clears_binding() {
        let mut transport = Transport::new(FakeSink::default());
        transport.bind(TrackId::new("a"), &url("a"));
        transport.unbind();

        assert!(transport.bound_track().is_none());
        assert!(transport.request_play().is_none());
    }

    #[test]
    fn seek_clamps_to_duration() {
        let mut transport = Transport::new(FakeSink::default());
        assert_eq!(transport.seek(500.0, 200.0), 200.0);
        assert_eq!(transport.seek(-3.0, 200.0), 0.0);
        assert_eq!(transport.seek(42.0, 200.0), 42.0);
        assert_eq!(transport.sink().position, 42.0);
    }

    #[test]
    fn seek_with_unknown_duration_only_clamps_below() {
        let mut transport = Transport::new(FakeSink::default());
        assert_eq!(transport.seek(500.0, 0.0), 500.0);
        assert_eq!(transport.seek(f64::NAN, f64::NAN), 0.0);
    }

    #[test]
    fn duration_unknown_until_positive() {
        let mut transport = Transport::new(FakeSink::default());
        assert_eq!(transport.duration(), None);

        transport.sink.duration = f64::NAN;
        assert_eq!(transport.duration(), None);

        transport.sink.duration = 215.0;
        assert_eq!(transport.duration(), Some(215.0));
    }

    #[test]
    fn bind_loads_stream() {
        let mut transport = Transport::new(FakeSink::default());
        transport.bind(TrackId::new("a"), &url("a"));
        assert_eq!(transport.bound_track().unwrap().as_str(), "a");
        assert_eq!(transport.sink().loaded, vec!["https://stream.example.com/songs/a"]);
    }
}
