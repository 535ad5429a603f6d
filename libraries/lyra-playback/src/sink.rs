//! Platform-agnostic media output
//!
//! Abstracts the single audio output the engine drives. Any platform
//! primitive (a browser `<audio>` bridge, a native decoder + device, a test
//! double) can be adapted to this capability set.

use futures_util::future::BoxFuture;
use tokio::sync::mpsc;
use url::Url;

use crate::error::SinkError;

/// Resolves once the output actually starts playing (or fails to)
pub type PlayFuture = BoxFuture<'static, Result<(), SinkError>>;

/// Asynchronous lifecycle signals from the media output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkEvent {
    /// Playback position moved; read it from `MediaSink::current_time`
    TimeAdvanced,

    /// Duration (and possibly position) became known for the loaded stream
    MetadataLoaded,

    /// The loaded stream played to its end
    Ended,

    /// Output started producing audio
    PlaybackStarted,
}

/// Media output capability
///
/// Exclusively owned by the engine's transport; nothing else touches it.
/// All methods except `play` are synchronous and must not block.
pub trait MediaSink: Send {
    /// Hand the output the channel it publishes `SinkEvent`s on
    ///
    /// Called once, when the engine takes ownership.
    fn subscribe(&mut self, events: mpsc::UnboundedSender<SinkEvent>);

    /// Point the output at a new stream, resetting position to zero
    fn load(&mut self, url: &Url);

    /// Request playback of the loaded stream
    ///
    /// The returned future is driven on the runtime, off the engine's
    /// call stack, and resolves when playback really started.
    fn play(&mut self) -> PlayFuture;

    /// Stop producing audio, keeping position
    fn pause(&mut self);

    /// Move the playback position
    fn seek(&mut self, seconds: f64);

    /// Current playback position in seconds
    fn current_time(&self) -> f64;

    /// Stream duration in seconds; not finite or zero while unknown
    fn duration(&self) -> f64;

    /// Output level (0.0-1.0)
    fn volume(&self) -> f32;

    /// Set output level (0.0-1.0)
    fn set_volume(&mut self, level: f32);
}

impl<S: MediaSink + ?Sized> MediaSink for Box<S> {
    fn subscribe(&mut self, events: mpsc::UnboundedSender<SinkEvent>) {
        (**self).subscribe(events);
    }

    fn load(&mut self, url: &Url) {
        (**self).load(url);
    }

    fn play(&mut self) -> PlayFuture {
        (**self).play()
    }

    fn pause(&mut self) {
        (**self).pause();
    }

    fn seek(&mut self, seconds: f64) {
        (**self).seek(seconds);
    }

    fn current_time(&self) -> f64 {
        (**self).current_time()
    }

    fn duration(&self) -> f64 {
        (**self).duration()
    }

    fn volume(&self) -> f32 {
        (**self).volume()
    }

    fn set_volume(&mut self, level: f32) {
        (**self).set_volume(level);
    }
}
