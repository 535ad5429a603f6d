//! Lyra - Playback Engine
//!
//! Platform-agnostic playback engine for Lyra.
//!
//! This crate provides:
//! - Transport control over a single media output (play/pause/seek, stream binding)
//! - Pending queue and played history ("next"/"previous")
//! - Shuffle (random pick per advance) and repeat modes (Off, All, One)
//! - Listen-progress tracking that credits one view per listening session
//! - Volume with mute memory
//!
//! # Architecture
//!
//! `lyra-playback` has no platform dependencies:
//! - The audio output is any `MediaSink` implementation
//! - Track resolution goes through `lyra_core::SongRepository`
//! - View crediting goes through `lyra_core::ViewRegistrar`
//!
//! The engine is a plain owned value. Operations are synchronous; starting
//! playback and crediting views are spawned onto the Tokio runtime and their
//! results fed back in through `process_next`, `settle` or the `run` loop.
//! A result that no longer matches the current track is discarded.
//!
//! # Example
//!
//! ```rust,no_run
//! use lyra_playback::{Command, MediaSink, PlaybackConfig, PlaybackEngine};
//! use lyra_core::{SongRepository, ViewRegistrar};
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//!
//! async fn start<S: MediaSink + 'static>(
//!     sink: S,
//!     repository: Arc<dyn SongRepository>,
//!     registrar: Arc<dyn ViewRegistrar>,
//! ) -> mpsc::UnboundedSender<Command> {
//!     let engine = PlaybackEngine::new(PlaybackConfig::default(), sink, repository, registrar);
//!
//!     let (commands_tx, commands_rx) = mpsc::unbounded_channel();
//!     let (events_tx, mut events_rx) = mpsc::unbounded_channel();
//!     tokio::spawn(engine.run(commands_rx, events_tx));
//!     tokio::spawn(async move {
//!         while let Some(event) = events_rx.recv().await {
//!             println!("{:?}", event);
//!         }
//!     });
//!
//!     commands_tx
//! }
//! ```

mod engine;
mod error;
mod events;
mod history;
mod progress;
mod queue;
mod shuffle;
mod sink;
mod transport;
pub mod types;
mod volume;

// Public exports
pub use engine::{Command, PlaybackEngine};
pub use error::{PlaybackError, Result, SinkError};
pub use events::PlayerEvent;
pub use progress::{ListenPolicy, ListenProgress};
pub use sink::{MediaSink, PlayFuture, SinkEvent};
pub use types::{PlaybackConfig, PlayerSnapshot, RepeatMode};
