//! Shared test doubles for engine integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use futures_util::FutureExt;
use lyra_core::{ArtistRef, CoreError, SongRepository, Track, TrackId, ViewRegistrar};
use lyra_playback::{
    MediaSink, PlayFuture, PlaybackConfig, PlaybackEngine, SinkError, SinkEvent,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, Once};
use tokio::sync::{mpsc, oneshot};
use url::Url;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

// ===== Media sink =====

/// How the sink answers `play()`
#[derive(Debug, Clone)]
pub enum PlayBehavior {
    Succeed,
    Fail(SinkError),
    /// Park the request until the test resolves it
    Manual,
}

pub struct SinkState {
    pub loaded: Vec<String>,
    pub position: f64,
    pub duration: f64,
    pub volume: f32,
    pub play_calls: usize,
    pub pause_calls: usize,
    pub seeks: Vec<f64>,
    pub behavior: PlayBehavior,
    pub parked: Vec<oneshot::Sender<Result<(), SinkError>>>,
    pub events: Option<mpsc::UnboundedSender<SinkEvent>>,
}

/// Test-side handle onto the sink the engine owns
#[derive(Clone)]
pub struct SinkHandle(pub Arc<Mutex<SinkState>>);

impl SinkHandle {
    pub fn state(&self) -> std::sync::MutexGuard<'_, SinkState> {
        self.0.lock().unwrap()
    }

    pub fn set_position(&self, seconds: f64) {
        self.state().position = seconds;
    }

    pub fn set_duration(&self, seconds: f64) {
        self.state().duration = seconds;
    }

    pub fn set_behavior(&self, behavior: PlayBehavior) {
        self.state().behavior = behavior;
    }

    /// Resolve the `index`-th parked play request
    pub fn resolve(&self, index: usize, result: Result<(), SinkError>) {
        let sender = {
            let mut state = self.state();
            std::mem::replace(&mut state.parked[index], oneshot::channel().0)
        };
        sender.send(result).unwrap();
    }

    pub fn emit(&self, event: SinkEvent) {
        if let Some(events) = &self.state().events {
            events.send(event).unwrap();
        }
    }

    pub fn loaded(&self) -> Vec<String> {
        self.state().loaded.clone()
    }
}

pub struct RecordingSink {
    handle: SinkHandle,
}

impl RecordingSink {
    pub fn new() -> (Self, SinkHandle) {
        let handle = SinkHandle(Arc::new(Mutex::new(SinkState {
            loaded: Vec::new(),
            position: 0.0,
            duration: 0.0,
            volume: 1.0,
            play_calls: 0,
            pause_calls: 0,
            seeks: Vec::new(),
            behavior: PlayBehavior::Succeed,
            parked: Vec::new(),
            events: None,
        })));
        (
            Self {
                handle: handle.clone(),
            },
            handle,
        )
    }
}

impl MediaSink for RecordingSink {
    fn subscribe(&mut self, events: mpsc::UnboundedSender<SinkEvent>) {
        self.handle.state().events = Some(events);
    }

    fn load(&mut self, url: &Url) {
        let mut state = self.handle.state();
        state.loaded.push(url.to_string());
        state.position = 0.0;
    }

    fn play(&mut self) -> PlayFuture {
        let mut state = self.handle.state();
        state.play_calls += 1;
        match state.behavior.clone() {
            PlayBehavior::Succeed => futures_util::future::ready(Ok(())).boxed(),
            PlayBehavior::Fail(err) => futures_util::future::ready(Err(err)).boxed(),
            PlayBehavior::Manual => {
                let (tx, rx) = oneshot::channel();
                state.parked.push(tx);
                async move {
                    rx.await
                        .unwrap_or_else(|_| Err(SinkError::Load("request dropped".into())))
                }
                .boxed()
            }
        }
    }

    fn pause(&mut self) {
        self.handle.state().pause_calls += 1;
    }

    fn seek(&mut self, seconds: f64) {
        let mut state = self.handle.state();
        state.position = seconds;
        state.seeks.push(seconds);
    }

    fn current_time(&self) -> f64 {
        self.handle.state().position
    }

    fn duration(&self) -> f64 {
        self.handle.state().duration
    }

    fn volume(&self) -> f32 {
        self.handle.state().volume
    }

    fn set_volume(&mut self, level: f32) {
        self.handle.state().volume = level;
    }
}

// ===== Song repository =====

#[derive(Default)]
pub struct MemoryRepository {
    pub tracks: Mutex<HashMap<TrackId, Track>>,
    pub unresolvable: Mutex<HashSet<TrackId>>,
}

impl MemoryRepository {
    pub fn with_tracks(tracks: &[Track]) -> Self {
        let repo = Self::default();
        {
            let mut map = repo.tracks.lock().unwrap();
            for track in tracks {
                map.insert(track.id.clone(), track.clone());
            }
        }
        repo
    }

    pub fn make_unresolvable(&self, id: &str) {
        self.unresolvable.lock().unwrap().insert(TrackId::new(id));
    }

    pub fn make_resolvable(&self, id: &str) {
        self.unresolvable.lock().unwrap().remove(&TrackId::new(id));
    }
}

#[async_trait]
impl SongRepository for MemoryRepository {
    fn stream_url(&self, track_id: &TrackId) -> lyra_core::Result<Url> {
        if self.unresolvable.lock().unwrap().contains(track_id) {
            return Err(CoreError::invalid_url(format!("no stream for {}", track_id)));
        }
        Ok(Url::parse(&format!("https://stream.test/songs/{}", track_id))?)
    }

    async fn fetch_metadata(&self, track_id: &TrackId) -> lyra_core::Result<Track> {
        self.tracks
            .lock()
            .unwrap()
            .get(track_id)
            .cloned()
            .ok_or_else(|| CoreError::TrackNotFound(track_id.clone()))
    }
}

// ===== View registrar =====

#[derive(Default)]
pub struct RecordingRegistrar {
    pub calls: Mutex<Vec<TrackId>>,
    pub fail: Mutex<bool>,
}

impl RecordingRegistrar {
    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn count_for(&self, id: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.as_str() == id)
            .count()
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

#[async_trait]
impl ViewRegistrar for RecordingRegistrar {
    async fn register_view(&self, track_id: &TrackId) -> lyra_core::Result<()> {
        self.calls.lock().unwrap().push(track_id.clone());
        if *self.fail.lock().unwrap() {
            Err(CoreError::network("backend unavailable"))
        } else {
            Ok(())
        }
    }
}

// ===== Fixtures =====

pub fn track(id: &str, duration_secs: f64) -> Track {
    Track::new(id, format!("Track {}", id), ArtistRef::new("artist-1", "Test Artist"))
        .with_duration_secs(duration_secs)
}

pub fn tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| track(id, 180.0)).collect()
}

pub struct Harness {
    pub engine: PlaybackEngine<RecordingSink>,
    pub sink: SinkHandle,
    pub repository: Arc<MemoryRepository>,
    pub registrar: Arc<RecordingRegistrar>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(PlaybackConfig::default())
    }

    pub fn with_config(config: PlaybackConfig) -> Self {
        init_tracing();
        let (sink, handle) = RecordingSink::new();
        let repository = Arc::new(MemoryRepository::default());
        let registrar = Arc::new(RecordingRegistrar::default());
        let engine = PlaybackEngine::new(config, sink, repository.clone(), registrar.clone());

        Self {
            engine,
            sink: handle,
            repository,
            registrar,
        }
    }

    /// Move the output clock and deliver a time-advance tick
    pub fn tick(&mut self, seconds: f64) {
        self.sink.set_position(seconds);
        self.engine.handle_sink_event(SinkEvent::TimeAdvanced);
    }

    /// Tick from the current position to `to` in `step` increments
    pub fn play_until(&mut self, to: f64, step: f64) {
        let mut now = self.sink.state().position;
        while now < to {
            now = (now + step).min(to);
            self.tick(now);
        }
    }

    pub fn current_id(&self) -> Option<String> {
        self.engine
            .current_track()
            .map(|t| t.id.as_str().to_string())
    }

    pub fn queue_ids(&self) -> Vec<String> {
        self.engine
            .queue()
            .iter()
            .map(|t| t.id.as_str().to_string())
            .collect()
    }

    pub fn history_ids(&self) -> Vec<String> {
        self.engine
            .history()
            .iter()
            .map(|t| t.id.as_str().to_string())
            .collect()
    }
}
