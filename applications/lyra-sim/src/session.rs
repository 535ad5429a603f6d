/// Headless listening session
///
/// Wires the engine to the virtual output and the catalog, plays the whole
/// catalog as one context and reports what happened.
use crate::catalog::CatalogRepository;
use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::registrar::LoggingRegistrar;
use crate::sink::VirtualSink;
use lyra_core::TrackId;
use lyra_playback::{Command, PlaybackEngine, PlayerEvent, PlayerSnapshot, RepeatMode};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// What a finished session did
#[derive(Debug, Default, Clone, Serialize)]
pub struct SessionReport {
    /// Tracks that became current, in order
    pub tracks_played: Vec<TrackId>,

    /// Tracks credited with a view, in order
    pub views: Vec<TrackId>,

    /// Tracks that could not be loaded or started
    pub failures: Vec<TrackId>,

    /// Whether the session ran out of tracks (or hit `max_tracks`) in time
    pub completed: bool,
}

/// Play the configured catalog from the top until it runs out
pub async fn run_session(config: &SimConfig) -> Result<SessionReport> {
    let repository = Arc::new(CatalogRepository::from_config(config)?);
    let registrar = Arc::new(LoggingRegistrar::new());
    let sink = VirtualSink::new(repository.stream_durations(), config.clock.clone());

    let engine = PlaybackEngine::new(
        config.playback.clone(),
        sink,
        repository.clone(),
        registrar.clone(),
    );

    let (commands, commands_rx) = mpsc::unbounded_channel();
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let engine = tokio::spawn(engine.run(commands_rx, events_tx));

    let tracks = repository.tracks().to_vec();
    let first = tracks.first().cloned().ok_or_else(|| {
        SimError::Config("Catalog is empty".to_string())
    })?;
    info!(tracks = tracks.len(), first = %first.id, "Starting session");

    send(
        &commands,
        Command::PlayTrack {
            track: first,
            context: Some(tracks),
        },
    )?;

    let mut report = SessionReport::default();
    let limit = Duration::from_secs(config.session.time_limit_secs);
    let session = drive(&commands, &mut events, &mut report, config.session.max_tracks);

    match tokio::time::timeout(limit, session).await {
        Ok(result) => {
            result?;
            report.completed = true;
        }
        Err(_) => warn!(limit_secs = limit.as_secs(), "Session hit its time limit"),
    }

    drop(commands);
    if let Err(err) = engine.await {
        warn!(error = %err, "Engine task ended abnormally");
    }

    info!(
        played = report.tracks_played.len(),
        views = report.views.len(),
        failures = report.failures.len(),
        registered = registrar.credited().len(),
        "Session finished"
    );
    Ok(report)
}

/// React to engine events until playback stops for good
async fn drive(
    commands: &mpsc::UnboundedSender<Command>,
    events: &mut mpsc::UnboundedReceiver<PlayerEvent>,
    report: &mut SessionReport,
    max_tracks: usize,
) -> Result<()> {
    loop {
        let Some(event) = events.recv().await else {
            return Err(SimError::EngineStopped);
        };

        match event {
            PlayerEvent::TrackChanged { track_id, .. } => {
                if report.tracks_played.len() == max_tracks {
                    info!(max_tracks, "Track limit reached");
                    send(commands, Command::Pause)?;
                    return Ok(());
                }
                info!(track_id = %track_id, "Now playing");
                report.tracks_played.push(track_id);
            }
            PlayerEvent::ViewRegistered { track_id } => {
                report.views.push(track_id);
            }
            PlayerEvent::PlaybackFailed { track_id, message } => {
                warn!(track_id = %track_id, error = %message, "Track failed");
                report.failures.push(track_id);
                if exhausted(commands).await? {
                    break;
                }
                send(commands, Command::Next)?;
            }
            PlayerEvent::StateChanged { playing: false } => {
                if exhausted(commands).await? {
                    break;
                }
            }
            other => debug!(event = ?other, "Engine event"),
        }
    }

    debug!("Queue exhausted");
    // Events forwarded in the same batch as the stop
    while let Ok(event) = events.try_recv() {
        match event {
            PlayerEvent::ViewRegistered { track_id } => report.views.push(track_id),
            PlayerEvent::PlaybackFailed { track_id, .. } => report.failures.push(track_id),
            _ => {}
        }
    }
    Ok(())
}

/// Nothing left to play and nothing to wrap around to
async fn exhausted(commands: &mpsc::UnboundedSender<Command>) -> Result<bool> {
    let snapshot = snapshot(commands).await?;
    let can_wrap = snapshot.repeat == RepeatMode::All && snapshot.history_len > 0;
    Ok(snapshot.queue.is_empty() && !can_wrap)
}

async fn snapshot(commands: &mpsc::UnboundedSender<Command>) -> Result<PlayerSnapshot> {
    let (reply, response) = oneshot::channel();
    send(commands, Command::Snapshot(reply))?;
    response.await.map_err(|_| SimError::EngineStopped)
}

fn send(commands: &mpsc::UnboundedSender<Command>, command: Command) -> Result<()> {
    commands.send(command).map_err(|_| SimError::EngineStopped)
}
