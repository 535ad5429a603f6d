/// Virtual-clock media output
///
/// Plays nothing: a background task advances the position of the loaded
/// stream on every clock tick and publishes the same lifecycle signals a
/// real output would (time updates, metadata, start, end).
use crate::config::ClockSettings;
use futures_util::FutureExt;
use lyra_playback::{MediaSink, PlayFuture, SinkError, SinkEvent};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use url::Url;

#[derive(Debug)]
struct ClockState {
    stream: Option<String>,
    position: f64,
    duration: f64,
    playing: bool,
    volume: f32,
    /// Bumped by load and pause; a pending start gives up if it changed
    epoch: u64,
}

impl Default for ClockState {
    fn default() -> Self {
        Self {
            stream: None,
            position: 0.0,
            duration: 0.0,
            playing: false,
            volume: 1.0,
            epoch: 0,
        }
    }
}

/// Media output driven by a virtual clock
///
/// Must be subscribed from within a Tokio runtime: the clock task is
/// spawned when the engine hands over its event channel.
pub struct VirtualSink {
    state: Arc<Mutex<ClockState>>,
    durations: HashMap<String, f64>,
    clock: ClockSettings,
    events: Option<mpsc::UnboundedSender<SinkEvent>>,
    ticker: Option<JoinHandle<()>>,
}

impl VirtualSink {
    /// `durations` maps the last URL path segment of each stream to its length
    pub fn new(durations: HashMap<String, f64>, clock: ClockSettings) -> Self {
        Self {
            state: Arc::new(Mutex::new(ClockState::default())),
            durations,
            clock,
            events: None,
            ticker: None,
        }
    }

    fn send(&self, event: SinkEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}

impl MediaSink for VirtualSink {
    fn subscribe(&mut self, events: mpsc::UnboundedSender<SinkEvent>) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }

        self.ticker = Some(tokio::spawn(run_clock(
            Arc::clone(&self.state),
            events.clone(),
            self.clock.tick(),
            self.clock.step_secs(),
        )));
        self.events = Some(events);
    }

    fn load(&mut self, url: &Url) {
        let stream = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default()
            .to_string();
        let duration = self.durations.get(&stream).copied().unwrap_or(0.0);
        debug!(url = %url, duration, "Stream loaded");

        {
            let mut state = self.state.lock().unwrap();
            state.stream = Some(stream);
            state.position = 0.0;
            state.duration = duration;
            state.playing = false;
            state.epoch += 1;
        }

        self.send(SinkEvent::MetadataLoaded);
    }

    fn play(&mut self) -> PlayFuture {
        let (epoch, loaded) = {
            let state = self.state.lock().unwrap();
            (state.epoch, state.stream.is_some())
        };
        if !loaded {
            return futures_util::future::ready(Err(SinkError::Load(
                "no stream loaded".to_string(),
            )))
            .boxed();
        }

        let state = Arc::clone(&self.state);
        let events = self.events.clone();
        let latency = self.clock.start_latency();

        async move {
            tokio::time::sleep(latency).await;

            {
                let mut state = state.lock().unwrap();
                if state.epoch != epoch {
                    return Err(SinkError::Load(
                        "play request interrupted by load or pause".to_string(),
                    ));
                }
                state.playing = true;
            }

            if let Some(events) = events {
                let _ = events.send(SinkEvent::PlaybackStarted);
            }
            Ok(())
        }
        .boxed()
    }

    fn pause(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.playing = false;
        state.epoch += 1;
    }

    fn seek(&mut self, seconds: f64) {
        {
            let mut state = self.state.lock().unwrap();
            let mut position = seconds.max(0.0);
            if state.duration > 0.0 {
                position = position.min(state.duration);
            }
            state.position = position;
        }
        self.send(SinkEvent::TimeAdvanced);
    }

    fn current_time(&self) -> f64 {
        self.state.lock().unwrap().position
    }

    fn duration(&self) -> f64 {
        self.state.lock().unwrap().duration
    }

    fn volume(&self) -> f32 {
        self.state.lock().unwrap().volume
    }

    fn set_volume(&mut self, level: f32) {
        self.state.lock().unwrap().volume = level;
    }
}

impl Drop for VirtualSink {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

/// Move the clock one step; `None` when nothing is playing, otherwise
/// whether the stream reached its end
fn advance(state: &mut ClockState, step: f64) -> Option<bool> {
    if !state.playing {
        return None;
    }

    state.position += step;
    if state.duration > 0.0 && state.position >= state.duration {
        state.position = state.duration;
        state.playing = false;
        Some(true)
    } else {
        Some(false)
    }
}

async fn run_clock(
    state: Arc<Mutex<ClockState>>,
    events: mpsc::UnboundedSender<SinkEvent>,
    tick: Duration,
    step: f64,
) {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately
    interval.tick().await;

    loop {
        interval.tick().await;

        let update = advance(&mut state.lock().unwrap(), step);
        let Some(ended) = update else {
            continue;
        };

        if events.send(SinkEvent::TimeAdvanced).is_err() {
            break;
        }
        if ended && events.send(SinkEvent::Ended).is_err() {
            break;
        }
    }

    debug!("Clock stopped");
}
