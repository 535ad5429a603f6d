//! Playback engine - core orchestration
//!
//! Owns the player state (current track, queue, history, shuffle/repeat,
//! volume, listen progress) and the transport to the media output. All
//! operations run to completion synchronously; the only asynchronous work
//! is starting playback and crediting views, both of which report back
//! through an internal completion channel and are re-validated on arrival.

use crate::{
    error::{PlaybackError, Result, SinkError},
    events::PlayerEvent,
    history::History,
    progress::{ListenPolicy, ListenProgress},
    queue::Queue,
    shuffle::ShufflePicker,
    sink::{MediaSink, SinkEvent},
    transport::{PlayTicket, Transport},
    types::{PlaybackConfig, PlayerSnapshot, RepeatMode},
    volume::Volume,
};
use lyra_core::{SongRepository, Track, TrackId, ViewRegistrar};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Slack allowed between the output position and its duration when it
/// reports the end of a stream
const END_TOLERANCE_SECS: f64 = 0.5;

/// Outcome of asynchronous work started by the engine
enum Completion {
    Play {
        ticket: PlayTicket,
        result: std::result::Result<(), SinkError>,
    },
    View {
        track_id: TrackId,
        result: lyra_core::Result<()>,
    },
}

/// Operations a UI can send to an engine driven by `PlaybackEngine::run`
#[derive(Debug)]
pub enum Command {
    PlayTrack {
        track: Track,
        context: Option<Vec<Track>>,
    },
    Resume,
    Pause,
    TogglePlay,
    Next,
    Previous,
    Seek(f64),
    SetVolumePercent(f64),
    ToggleMute,
    SetShuffle(bool),
    ToggleShuffle,
    SetRepeat(RepeatMode),
    ToggleRepeat,
    AddToQueue(Track),
    RemoveFromQueue(usize),
    ClearQueue,
    Snapshot(oneshot::Sender<PlayerSnapshot>),
}

/// Central playback management
///
/// Orchestrates:
/// - Transport (binding the media output to the current track's stream)
/// - Queue and history (FIFO or shuffled advance, "previous" back-stack)
/// - Repeat modes (Off, All, One)
/// - Listen-progress tracking and view crediting
/// - Volume with mute memory
///
/// Construct one per session and pass it around by reference (or drive it
/// with `run`). Must be used from within a Tokio runtime: play requests and
/// view registrations are spawned onto it.
pub struct PlaybackEngine<S> {
    // State
    current_track: Option<Track>,
    playing: bool,
    current_time: f64,
    duration: f64,

    // Queue and history
    queue: Queue,
    history: History,

    // Settings
    shuffle: bool,
    repeat: RepeatMode,
    volume: Volume,
    restart_threshold_secs: f64,
    listen_policy: ListenPolicy,
    picker: ShufflePicker,

    progress: ListenProgress,

    // Collaborators
    transport: Transport<S>,
    repository: Arc<dyn SongRepository>,
    registrar: Arc<dyn ViewRegistrar>,

    // Async plumbing
    sink_events: mpsc::UnboundedReceiver<SinkEvent>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: usize,

    // Event queue for UI synchronization
    pending_events: Vec<PlayerEvent>,
}

impl<S: MediaSink> PlaybackEngine<S> {
    /// Create a new engine around a media output
    pub fn new(
        config: PlaybackConfig,
        sink: S,
        repository: Arc<dyn SongRepository>,
        registrar: Arc<dyn ViewRegistrar>,
    ) -> Self {
        let (sink_tx, sink_events) = mpsc::unbounded_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        let volume = Volume::new(config.volume);
        let mut transport = Transport::new(sink);
        transport.subscribe(sink_tx);
        transport.set_volume(volume.level());

        Self {
            current_track: None,
            playing: false,
            current_time: 0.0,
            duration: 0.0,
            queue: Queue::new(),
            history: History::new(config.history_size),
            shuffle: config.shuffle,
            repeat: config.repeat,
            volume,
            restart_threshold_secs: config.restart_threshold_secs,
            listen_policy: config.listen,
            picker: ShufflePicker::new(config.shuffle_seed),
            progress: ListenProgress::new(),
            transport,
            repository,
            registrar,
            sink_events,
            completions_tx,
            completions_rx,
            in_flight: 0,
            pending_events: Vec::new(),
        }
    }

    // ===== Transport =====

    /// Play a track, optionally replacing the queue from a context list
    ///
    /// If the track is already current this resumes in place: no rebind, no
    /// progress reset, and `context` is ignored. Otherwise the outgoing track
    /// goes to history and, when `context` is given, the queue becomes the
    /// part of `context` after `track` (all of it if `track` is absent).
    ///
    /// Load and autoplay failures never surface here; they leave the track
    /// selected with `playing == false`.
    pub fn play_track(&mut self, track: Track, context: Option<&[Track]>) {
        if self
            .current_track
            .as_ref()
            .is_some_and(|current| current.same_as(&track))
        {
            debug!(track_id = %track.id, "Track already current, resuming in place");
            self.resume();
            return;
        }

        if let Some(context) = context {
            self.queue.load_context(context, &track.id);
            self.emit_queue_changed();
        }

        self.advance_to(track);
    }

    /// Fetch a track's metadata from the repository, then play it
    pub async fn play_track_id(&mut self, track_id: &TrackId, context: Option<&[Track]>) -> Result<()> {
        let track = self
            .repository
            .fetch_metadata(track_id)
            .await
            .map_err(PlaybackError::Repository)?;

        self.play_track(track, context);
        Ok(())
    }

    /// Resume the current track where it is
    ///
    /// Rebinds only if the output is not bound to it (a previous bind failed).
    pub fn resume(&mut self) {
        let Some(track_id) = self.current_track.as_ref().map(|t| t.id.clone()) else {
            debug!("Nothing to resume");
            return;
        };

        if self.transport.bound_track() == Some(&track_id) {
            self.start_playback();
        } else {
            self.bind_current();
        }
    }

    /// Pause playback
    pub fn pause(&mut self) {
        self.transport.pause();
        self.set_playing(false);
    }

    /// Pause if playing, resume otherwise
    pub fn toggle_play(&mut self) {
        if self.playing {
            self.pause();
        } else {
            self.resume();
        }
    }

    /// Seek to position in current track
    ///
    /// Clamped to `[0, duration]`. The listen tracker treats the jump as a
    /// position change, not as listening time.
    pub fn seek_to(&mut self, seconds: f64) -> Result<()> {
        if self.current_track.is_none() {
            return Err(PlaybackError::NoTrackLoaded);
        }

        let position = self.transport.seek(seconds, self.duration);
        self.current_time = position;
        self.progress.mark_position(position);
        Ok(())
    }

    // ===== Queue & History =====

    /// Advance to the next track
    ///
    /// Priority: a random queue entry when shuffling, else the queue head;
    /// with an empty queue and repeat-all, restart from the oldest history
    /// entry; otherwise stop.
    pub fn play_next(&mut self) {
        let next = if self.shuffle {
            self.picker
                .pick(self.queue.len())
                .and_then(|index| self.queue.remove(index))
        } else {
            self.queue.pop_front()
        };

        if let Some(track) = next {
            self.emit_queue_changed();
            self.advance_to(track);
            return;
        }

        // Wraps to the oldest remembered track; see `PlaybackConfig::history_size`
        if self.repeat == RepeatMode::All {
            if let Some(first) = self.history.first().cloned() {
                debug!(track_id = %first.id, "Queue exhausted, repeating from start of history");
                self.history.clear();
                self.queue.clear();
                self.emit_queue_changed();
                let previous_id = self.current_track.take().map(|t| t.id);
                self.set_current(first, previous_id);
                return;
            }
        }

        // The last track stays current (stopped), so a later resume replays it.
        debug!("Queue exhausted, stopping");
        self.transport.pause();
        self.set_playing(false);
    }

    /// Go back
    ///
    /// Past the restart threshold this restarts the current track. Otherwise
    /// the most recent history entry becomes current and the outgoing track
    /// is put back at the head of the queue.
    pub fn play_prev(&mut self) {
        if self.current_time > self.restart_threshold_secs {
            self.restart_current();
            return;
        }

        let Some(previous) = self.history.pop() else {
            self.restart_current();
            return;
        };

        let outgoing = self.current_track.take();
        let outgoing_id = outgoing.as_ref().map(|t| t.id.clone());
        if let Some(track) = outgoing {
            self.queue.push_front(track);
            self.emit_queue_changed();
        }

        self.set_current(previous, outgoing_id);
    }

    /// Append a track to the queue
    ///
    /// The current track is never queued behind itself; such adds are ignored.
    pub fn add_to_queue(&mut self, track: Track) {
        if self
            .current_track
            .as_ref()
            .is_some_and(|current| current.same_as(&track))
        {
            debug!(track_id = %track.id, "Ignoring queue add of the current track");
            return;
        }

        self.queue.push_back(track);
        self.emit_queue_changed();
    }

    /// Remove track from queue by index
    pub fn remove_from_queue(&mut self, index: usize) -> Result<Track> {
        let track = self
            .queue
            .remove(index)
            .ok_or(PlaybackError::IndexOutOfBounds(index))?;
        self.emit_queue_changed();
        Ok(track)
    }

    /// Clear entire queue
    pub fn clear_queue(&mut self) {
        self.queue.clear();
        self.emit_queue_changed();
    }

    /// Set shuffle flag
    pub fn set_shuffle(&mut self, shuffle: bool) {
        self.shuffle = shuffle;
    }

    /// Flip shuffle flag
    pub fn toggle_shuffle(&mut self) {
        self.shuffle = !self.shuffle;
    }

    /// Set repeat mode
    pub fn set_repeat(&mut self, mode: RepeatMode) {
        self.repeat = mode;
    }

    /// Cycle repeat mode: Off -> All -> One -> Off
    pub fn toggle_repeat(&mut self) {
        self.repeat = self.repeat.cycle();
    }

    // ===== Volume =====

    /// Mute, or restore the level saved by the last mute
    pub fn toggle_mute(&mut self) {
        let level = self.volume.toggle_mute();
        self.transport.set_volume(level);
        self.emit_volume_changed();
    }

    /// Set volume from a 0-100 slider value
    pub fn set_volume_percent(&mut self, percent: f64) {
        let level = self.volume.set_percent(percent);
        self.transport.set_volume(level);
        self.emit_volume_changed();
    }

    // ===== Media output signals =====

    /// React to a lifecycle signal from the media output
    pub fn handle_sink_event(&mut self, event: SinkEvent) {
        match event {
            SinkEvent::TimeAdvanced => self.on_time_advanced(),
            SinkEvent::MetadataLoaded => self.on_metadata_loaded(),
            SinkEvent::Ended => self.on_ended(),
            SinkEvent::PlaybackStarted => self.on_playback_started(),
        }
    }

    fn on_time_advanced(&mut self) {
        self.refresh_clock();

        let Some(track_id) = self.current_track.as_ref().map(|t| t.id.clone()) else {
            return;
        };

        if self
            .progress
            .observe(self.current_time, self.duration, &self.listen_policy)
        {
            self.register_view(track_id);
        }
    }

    fn on_metadata_loaded(&mut self) {
        self.refresh_clock();
    }

    fn on_ended(&mut self) {
        if !self.bound_to_current() {
            debug!("Ignoring end signal for a stream that is no longer current");
            return;
        }

        if let Some(duration) = self.transport.duration() {
            let position = self.transport.current_time();
            if position + END_TOLERANCE_SECS < duration {
                debug!(position, duration, "Ignoring end signal before the end of the stream");
                return;
            }
        }

        if self.repeat == RepeatMode::One && self.current_track.is_some() {
            debug!("Repeat one, looping current track");
            self.current_time = self.transport.seek(0.0, self.duration);
            self.progress.reset();
            self.start_playback();
        } else {
            self.play_next();
        }
    }

    fn on_playback_started(&mut self) {
        if self.bound_to_current() && self.transport.play_requested() {
            self.set_playing(true);
        }
    }

    /// Whether the output still carries the current track's stream
    fn bound_to_current(&self) -> bool {
        match (&self.current_track, self.transport.bound_track()) {
            (Some(current), Some(bound)) => &current.id == bound,
            _ => false,
        }
    }

    /// Drop output signals queued before a rebind; they describe the old stream
    fn discard_queued_signals(&mut self) {
        let mut discarded = 0;
        while self.sink_events.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            debug!(discarded, "Discarded signals from the previous stream");
        }
    }

    fn refresh_clock(&mut self) {
        self.current_time = self.transport.current_time();
        if let Some(duration) = self.transport.duration() {
            self.duration = duration;
        }
    }

    // ===== Event loop =====

    /// Handle the next sink event or async completion, waiting for one
    ///
    /// Returns `false` once neither source can produce anything more.
    pub async fn process_next(&mut self) -> bool {
        tokio::select! {
            Some(completion) = self.completions_rx.recv() => {
                self.handle_completion(completion);
                true
            }
            Some(event) = self.sink_events.recv() => {
                self.handle_sink_event(event);
                true
            }
            else => false,
        }
    }

    /// Handle everything already waiting, without blocking
    ///
    /// Returns the number of messages handled.
    pub fn process_ready(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.handle_completion(completion);
            handled += 1;
        }
        while let Ok(event) = self.sink_events.try_recv() {
            self.handle_sink_event(event);
            handled += 1;
        }
        handled
    }

    /// Wait until every spawned play request and view registration resolved
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            match self.completions_rx.recv().await {
                Some(completion) => self.handle_completion(completion),
                None => break,
            }
        }
    }

    /// Drive the engine from a command channel until it closes
    ///
    /// Messages are handled one at a time. Completions and media output
    /// signals that are already waiting go before the next UI command, so a
    /// command always sees the effects of what the output reported before
    /// it. Events are forwarded after each message.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        events: mpsc::UnboundedSender<PlayerEvent>,
    ) {
        loop {
            tokio::select! {
                biased;
                Some(completion) = self.completions_rx.recv() => self.handle_completion(completion),
                Some(event) = self.sink_events.recv() => self.handle_sink_event(event),
                command = commands.recv() => match command {
                    Some(command) => self.execute(command),
                    None => break,
                },
            }

            for event in self.drain_events() {
                // The UI side may have gone away; keep running for the commands.
                let _ = events.send(event);
            }
        }

        debug!("Command channel closed, engine stopping");
    }

    /// Apply one UI command
    pub fn execute(&mut self, command: Command) {
        match command {
            Command::PlayTrack { track, context } => self.play_track(track, context.as_deref()),
            Command::Resume => self.resume(),
            Command::Pause => self.pause(),
            Command::TogglePlay => self.toggle_play(),
            Command::Next => self.play_next(),
            Command::Previous => self.play_prev(),
            Command::Seek(seconds) => {
                if let Err(err) = self.seek_to(seconds) {
                    debug!(error = %err, "Ignoring seek");
                }
            }
            Command::SetVolumePercent(percent) => self.set_volume_percent(percent),
            Command::ToggleMute => self.toggle_mute(),
            Command::SetShuffle(shuffle) => self.set_shuffle(shuffle),
            Command::ToggleShuffle => self.toggle_shuffle(),
            Command::SetRepeat(mode) => self.set_repeat(mode),
            Command::ToggleRepeat => self.toggle_repeat(),
            Command::AddToQueue(track) => self.add_to_queue(track),
            Command::RemoveFromQueue(index) => {
                if let Err(err) = self.remove_from_queue(index) {
                    warn!(error = %err, "Queue removal rejected");
                }
            }
            Command::ClearQueue => self.clear_queue(),
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    // ===== State Queries =====

    /// Get currently selected track
    pub fn current_track(&self) -> Option<&Track> {
        self.current_track.as_ref()
    }

    /// Whether audio is playing
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Mirrored playback position in seconds
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Mirrored duration in seconds (0 while unknown)
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Get all tracks in queue
    pub fn queue(&self) -> Vec<&Track> {
        self.queue.get_all()
    }

    /// Get queue length
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Get playback history (oldest first)
    pub fn history(&self) -> Vec<&Track> {
        self.history.get_all()
    }

    /// Shuffle flag
    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    /// Current repeat mode
    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    /// Volume level (0.0-1.0)
    pub fn volume(&self) -> f32 {
        self.volume.level()
    }

    /// Level the next unmute restores
    pub fn previous_volume(&self) -> f32 {
        self.volume.previous_level()
    }

    /// Listen progress for the current track
    pub fn listen_progress(&self) -> &ListenProgress {
        &self.progress
    }

    /// Number of play requests and view registrations still unresolved
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Borrow the media output
    pub fn sink(&self) -> &S {
        self.transport.sink()
    }

    /// Read-only copy of the state for UI consumers
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            current_track: self.current_track.clone(),
            playing: self.playing,
            current_time: self.current_time,
            duration: self.duration,
            queue: self.queue.get_all().into_iter().cloned().collect(),
            history_len: self.history.len(),
            shuffle: self.shuffle,
            repeat: self.repeat,
            volume_percent: self.volume.percent(),
            muted: self.volume.is_muted(),
        }
    }

    /// Take all queued events
    pub fn drain_events(&mut self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Check whether events are waiting
    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Internal =====

    /// Make `track` current, pushing the outgoing track onto history
    fn advance_to(&mut self, track: Track) {
        let previous = self.current_track.take();
        let previous_id = previous.as_ref().map(|t| t.id.clone());
        if let Some(previous) = previous {
            self.history.push(previous);
        }
        self.set_current(track, previous_id);
    }

    fn set_current(&mut self, track: Track, previous_id: Option<TrackId>) {
        if self.queue.remove_track(&track.id) > 0 {
            self.emit_queue_changed();
        }

        self.progress.reset();
        self.current_time = 0.0;
        self.duration = track.duration_secs.filter(|d| d.is_finite() && *d > 0.0).unwrap_or(0.0);

        debug!(track_id = %track.id, "Current track changed");
        self.pending_events.push(PlayerEvent::TrackChanged {
            track_id: track.id.clone(),
            previous_track_id: previous_id,
        });
        self.current_track = Some(track);
        self.bind_current();
    }

    /// Bind the output to the current track's stream and request playback
    fn bind_current(&mut self) {
        let Some(track_id) = self.current_track.as_ref().map(|t| t.id.clone()) else {
            return;
        };

        self.discard_queued_signals();
        match self.repository.stream_url(&track_id) {
            Ok(url) => {
                debug!(track_id = %track_id, url = %url, "Binding media output");
                self.transport.bind(track_id, &url);
                self.start_playback();
            }
            Err(err) => {
                let err = PlaybackError::Repository(err);
                warn!(track_id = %track_id, error = %err, "Could not resolve stream");
                self.transport.unbind();
                self.set_playing(false);
                self.emit_playback_failed(track_id, &err);
            }
        }
    }

    fn start_playback(&mut self) {
        let Some((ticket, play)) = self.transport.request_play() else {
            return;
        };

        let completions = self.completions_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let result = play.await;
            let _ = completions.send(Completion::Play { ticket, result });
        });
    }

    fn restart_current(&mut self) {
        if let Err(err) = self.seek_to(0.0) {
            debug!(error = %err, "Nothing to restart");
        }
    }

    fn register_view(&mut self, track_id: TrackId) {
        info!(
            track_id = %track_id,
            listened_secs = self.progress.accumulated_secs(),
            "Listen threshold reached, crediting view"
        );
        self.pending_events.push(PlayerEvent::ViewRegistered {
            track_id: track_id.clone(),
        });

        let registrar = Arc::clone(&self.registrar);
        let completions = self.completions_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let result = registrar.register_view(&track_id).await;
            let _ = completions.send(Completion::View { track_id, result });
        });
    }

    fn handle_completion(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);

        match completion {
            Completion::Play { ticket, result } => {
                let still_current = self.transport.is_current(&ticket)
                    && self
                        .current_track
                        .as_ref()
                        .is_some_and(|current| current.id == ticket.track_id);
                if !still_current {
                    debug!(track_id = %ticket.track_id, "Discarding superseded play completion");
                    return;
                }

                match result {
                    Ok(()) => self.set_playing(true),
                    Err(err) => {
                        let err = PlaybackError::from(err);
                        warn!(track_id = %ticket.track_id, error = %err, "Playback did not start");
                        self.set_playing(false);
                        self.emit_playback_failed(ticket.track_id, &err);
                    }
                }
            }
            Completion::View { track_id, result } => match result {
                Ok(()) => debug!(track_id = %track_id, "View registration confirmed"),
                Err(err) => {
                    // Not retried: the latch stays set.
                    let err = PlaybackError::Registration(err);
                    warn!(track_id = %track_id, error = %err, "View registration failed");
                }
            },
        }
    }

    fn set_playing(&mut self, playing: bool) {
        let playing = playing && self.current_track.is_some();
        if self.playing != playing {
            self.playing = playing;
            self.pending_events.push(PlayerEvent::StateChanged { playing });
        }
    }

    fn emit_queue_changed(&mut self) {
        self.pending_events.push(PlayerEvent::QueueChanged {
            length: self.queue.len(),
        });
    }

    fn emit_volume_changed(&mut self) {
        self.pending_events.push(PlayerEvent::VolumeChanged {
            percent: self.volume.percent(),
            muted: self.volume.is_muted(),
        });
    }

    fn emit_playback_failed(&mut self, track_id: TrackId, err: &PlaybackError) {
        self.pending_events.push(PlayerEvent::PlaybackFailed {
            track_id,
            message: err.to_string(),
        });
    }
}
