//! Speaking sessions
//!
//! A session speaks one text: it is split into chunks, each chunk is
//! synthesized and played in order on a background worker while the front
//! end stays responsive.
//!
//! For the cloud backend a downloader thread fetches up to [`LOOKAHEAD`]
//! chunks ahead of the one playing. Speech speed is read when a chunk is
//! about to start, so changing it never affects the chunk already playing.
//! Stopping cancels the whole session at once: in-flight downloads, tempo
//! processing and playback are abandoned and queued chunks are discarded.

use super::backends::cloud::CloudBackend;
use super::cancel::{PlaybackControl, POLL_INTERVAL};
use super::synth::{Backend, Synth};
use crate::state::settings::Settings;
use crate::text::split_chunks;
use crate::{Result, WspeechError};
use log::{debug, error, info, warn};
use std::fmt;
use std::sync::mpsc::{channel, sync_channel, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Chunks fetched ahead of the one playing
pub const LOOKAHEAD: usize = 3;

/// How long dropping a player waits for backends to silence themselves
pub const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Progress reports sent to the front end
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started { total: usize, backend: String },
    /// 1-based index of the chunk now playing
    Speaking { index: usize, total: usize },
    Paused,
    Resumed,
    /// A backend failed; `to` continues from the failed chunk
    Fallback { from: String, to: String, error: String },
    Finished,
    Stopped,
    Failed(String),
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEvent::Started { .. } => write!(f, "Starting…"),
            SessionEvent::Speaking { index, total } => {
                write!(f, "Speaking…  ({}/{})", index, total)
            }
            SessionEvent::Paused => write!(f, "Paused  —  press Resume to continue"),
            SessionEvent::Resumed => write!(f, "Speaking…"),
            SessionEvent::Fallback { from, to, error } => {
                write!(f, "{} failed ({}), switching to {}", from, error, to)
            }
            SessionEvent::Finished => write!(f, "Done  —  press Speak to read again"),
            SessionEvent::Stopped => write!(f, "Stopped"),
            SessionEvent::Failed(e) => write!(f, "Error: {}", e),
        }
    }
}

/// Synthesis state of one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStatus {
    Pending,
    Ready,
    Played,
}

/// Per-chunk status shared between the session threads
pub struct ChunkTracker {
    statuses: Mutex<Vec<ChunkStatus>>,
}

impl ChunkTracker {
    pub fn new(len: usize) -> Self {
        Self {
            statuses: Mutex::new(vec![ChunkStatus::Pending; len]),
        }
    }

    fn set(&self, index: usize, status: ChunkStatus) {
        if let Ok(mut statuses) = self.statuses.lock() {
            if let Some(slot) = statuses.get_mut(index) {
                // Played is final
                if *slot != ChunkStatus::Played {
                    *slot = status;
                }
            }
        }
    }

    pub fn snapshot(&self) -> Vec<ChunkStatus> {
        self.statuses.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn played(&self) -> usize {
        self.snapshot()
            .iter()
            .filter(|s| **s == ChunkStatus::Played)
            .count()
    }
}

/// How a backend's run over the remaining chunks ended
enum Outcome {
    Completed,
    Cancelled,
    Failed { index: usize, error: WspeechError },
}

/// Everything a session worker needs
struct SessionContext {
    chunks: Arc<Vec<String>>,
    control: Arc<PlaybackControl>,
    tracker: Arc<ChunkTracker>,
    events: Sender<SessionEvent>,
}

impl SessionContext {
    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    fn total(&self) -> usize {
        self.chunks.len()
    }
}

struct ActiveSession {
    control: Arc<PlaybackControl>,
    tracker: Arc<ChunkTracker>,
    worker: JoinHandle<()>,
    /// Disconnects when the worker exits
    done: Receiver<()>,
}

impl ActiveSession {
    fn running(&self) -> bool {
        matches!(self.done.try_recv(), Err(TryRecvError::Empty))
    }
}

/// Front-end handle for starting and controlling sessions
pub struct Player {
    backends: Arc<Mutex<Vec<Backend>>>,
    names: Vec<String>,
    events: Sender<SessionEvent>,
    current: Option<ActiveSession>,
}

impl Player {
    /// Create a player over backends ordered best first
    pub fn new(backends: Vec<Backend>, events: Sender<SessionEvent>) -> Self {
        let names = backends.iter().map(|b| b.name().to_string()).collect();
        Self {
            backends: Arc::new(Mutex::new(backends)),
            names,
            events,
            current: None,
        }
    }

    pub fn has_backend(&self) -> bool {
        !self.names.is_empty()
    }

    /// Backend names in fallback order
    pub fn backend_names(&self) -> &[String] {
        &self.names
    }

    /// Whether a session is running and hasn't been stopped
    pub fn is_active(&self) -> bool {
        self.current
            .as_ref()
            .map_or(false, |s| s.running() && !s.control.is_cancelled())
    }

    pub fn is_paused(&self) -> bool {
        self.is_active() && self.current.as_ref().map_or(false, |s| s.control.is_paused())
    }

    /// Chunk statuses of the current or last session
    pub fn progress(&self) -> Vec<ChunkStatus> {
        self.current
            .as_ref()
            .map(|s| s.tracker.snapshot())
            .unwrap_or_default()
    }

    /// Start speaking `text`; returns the number of chunks
    pub fn start(&mut self, text: &str, settings: Settings) -> Result<usize> {
        if self.is_active() {
            return Err(WspeechError::Other("Already speaking".to_string()));
        }
        if !self.has_backend() {
            return Err(WspeechError::Speech(
                "No TTS backend available. Install: sudo apt install espeak-ng".to_string(),
            ));
        }

        let chunks = split_chunks(text);
        if chunks.is_empty() {
            return Err(WspeechError::Other(
                "Please enter some text first.".to_string(),
            ));
        }
        let total = chunks.len();
        info!("Starting session with {} chunks", total);

        let control = Arc::new(PlaybackControl::new(settings));
        let tracker = Arc::new(ChunkTracker::new(total));

        let ctx = SessionContext {
            chunks: Arc::new(chunks),
            control: Arc::clone(&control),
            tracker: Arc::clone(&tracker),
            events: self.events.clone(),
        };
        let backends = Arc::clone(&self.backends);
        let (done_tx, done) = channel::<()>();

        let worker = thread::Builder::new()
            .name("wspeech-session".to_string())
            .spawn(move || {
                // Waits for a previous, stopped session to release the backends
                match backends.lock() {
                    Ok(mut backends) => run_session(&mut backends, &ctx),
                    Err(_) => ctx.emit(SessionEvent::Failed("backend lock poisoned".to_string())),
                }
                drop(done_tx);
            })?;

        if let Some(previous) = self.current.take() {
            if !previous.running() {
                let _ = previous.worker.join();
            }
        }
        self.current = Some(ActiveSession {
            control,
            tracker,
            worker,
            done,
        });

        Ok(total)
    }

    /// Pause or resume; returns the new paused state, or None when idle
    pub fn toggle_pause(&mut self) -> Option<bool> {
        if !self.is_active() {
            return None;
        }
        let session = self.current.as_ref()?;
        let paused = !session.control.is_paused();
        session.control.set_paused(paused);
        debug!("Session {}", if paused { "paused" } else { "resumed" });
        let _ = self.events.send(if paused {
            SessionEvent::Paused
        } else {
            SessionEvent::Resumed
        });
        Some(paused)
    }

    /// Stop immediately, abandoning in-flight work
    ///
    /// Returns without waiting for the worker; it notices the cancellation
    /// within one poll interval and releases the backends.
    pub fn stop(&mut self) {
        if let Some(session) = &self.current {
            if !session.control.is_cancelled() && session.running() {
                info!("Stopping session");
                session.control.cancel();
                let _ = self.events.send(SessionEvent::Stopped);
            }
        }
    }

    /// Apply new settings to the running session from its next chunk on
    pub fn update_settings(&self, settings: Settings) {
        if let Some(session) = &self.current {
            session.control.update_settings(settings);
        }
    }

    /// Wait until the worker of the current session has exited
    ///
    /// Returns false if it is still running after `timeout`.
    pub fn wait(&self, timeout: Duration) -> bool {
        let Some(session) = &self.current else {
            return true;
        };
        match session.done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) => false,
        }
    }
}

impl Drop for Player {
    /// Cancel the session and give the worker time to kill its speech
    /// processes; child processes outlive the program otherwise
    fn drop(&mut self) {
        let Some(session) = self.current.take() else {
            return;
        };
        session.control.cancel();
        match session.done.recv_timeout(SHUTDOWN_GRACE) {
            Err(RecvTimeoutError::Timeout) => warn!("Speech worker still running at shutdown"),
            _ => {
                let _ = session.worker.join();
            }
        }
    }
}

/// Run the chunks through the backends, falling back on failure
fn run_session(backends: &mut [Backend], ctx: &SessionContext) {
    let Some(first) = backends.first() else {
        ctx.emit(SessionEvent::Failed("No TTS backend available".to_string()));
        return;
    };
    ctx.emit(SessionEvent::Started {
        total: ctx.total(),
        backend: first.name().to_string(),
    });

    let mut start = 0;
    let mut current = 0;

    while current < backends.len() {
        let from = backends[current].name().to_string();
        let outcome = match &mut backends[current] {
            Backend::Cloud(cloud) => play_fetched(cloud, start, ctx),
            Backend::Speaker(synth) => speak_direct(synth.as_mut(), start, ctx),
        };

        match outcome {
            Outcome::Completed => {
                info!("Session finished");
                ctx.emit(SessionEvent::Finished);
                return;
            }
            Outcome::Cancelled => {
                debug!("Session cancelled");
                return;
            }
            Outcome::Failed { index, error } => {
                warn!("{} failed on chunk {}: {}", from, index + 1, error);
                current += 1;
                match backends.get(current) {
                    Some(next) => {
                        ctx.emit(SessionEvent::Fallback {
                            from,
                            to: next.name().to_string(),
                            error: error.to_string(),
                        });
                        start = index;
                    }
                    None => {
                        error!("No backend left: {}", error);
                        ctx.emit(SessionEvent::Failed(error.to_string()));
                        return;
                    }
                }
            }
        }
    }
}

/// Speak chunks with a backend that produces sound itself
fn speak_direct(synth: &mut dyn Synth, start: usize, ctx: &SessionContext) -> Outcome {
    let control = &ctx.control;

    for index in start..ctx.total() {
        if !control.wait_while_paused() {
            return Outcome::Cancelled;
        }

        let settings = control.settings();
        ctx.tracker.set(index, ChunkStatus::Ready);
        ctx.emit(SessionEvent::Speaking {
            index: index + 1,
            total: ctx.total(),
        });

        if let Err(error) = synth
            .configure(&settings)
            .and_then(|_| synth.speak(&ctx.chunks[index]))
        {
            return Outcome::Failed { index, error };
        }

        let mut pause_attempted = false;
        loop {
            if control.is_cancelled() {
                let _ = synth.cancel();
                return Outcome::Cancelled;
            }

            if control.is_paused() {
                if !pause_attempted {
                    pause_attempted = true;
                    // Backends that can't pause finish the chunk and wait at the gate
                    if synth.pause().unwrap_or(false) {
                        if !control.wait_while_paused() {
                            let _ = synth.cancel();
                            return Outcome::Cancelled;
                        }
                        if let Err(e) = synth.resume() {
                            warn!("Resume failed: {}", e);
                        }
                        pause_attempted = false;
                    }
                }
            } else {
                pause_attempted = false;
            }

            match synth.is_speaking() {
                Ok(true) => thread::sleep(POLL_INTERVAL),
                Ok(false) => break,
                Err(error) => return Outcome::Failed { index, error },
            }
        }

        ctx.tracker.set(index, ChunkStatus::Played);
    }

    Outcome::Completed
}

/// A chunk coming out of the downloader
enum Fetched {
    Ready {
        index: usize,
        raw: Vec<u8>,
        audio: Vec<u8>,
        /// Speed the tempo filter was applied with
        speed: u16,
    },
    Failed {
        index: usize,
        error: WspeechError,
    },
}

/// Fetch chunks ahead on a downloader thread and play them in order
fn play_fetched(cloud: &CloudBackend, start: usize, ctx: &SessionContext) -> Outcome {
    let control = &ctx.control;

    let mut output = match (cloud.output)() {
        Ok(output) => output,
        Err(error) => return Outcome::Failed { index: start, error },
    };

    let (tx, rx) = sync_channel(LOOKAHEAD);
    spawn_downloader(cloud, start, ctx, tx);

    let mut next = start;
    while next < ctx.total() {
        let item = match receive(&rx, control) {
            Some(item) => item,
            None if control.is_cancelled() => {
                output.stop();
                return Outcome::Cancelled;
            }
            None => {
                return Outcome::Failed {
                    index: next,
                    error: WspeechError::Audio("audio stream ended early".to_string()),
                }
            }
        };

        let (index, raw, audio, fetched_speed) = match item {
            Fetched::Ready {
                index,
                raw,
                audio,
                speed,
            } => (index, raw, audio, speed),
            Fetched::Failed { index, error } => {
                output.stop();
                return Outcome::Failed { index, error };
            }
        };

        if !control.wait_while_paused() {
            output.stop();
            return Outcome::Cancelled;
        }

        // Speed may have changed while this chunk waited in the queue
        let settings = control.settings();
        let audio = if settings.speed != fetched_speed {
            debug!(
                "Re-applying tempo to chunk {} ({} -> {} wpm)",
                index + 1,
                fetched_speed,
                settings.speed
            );
            match cloud.filter.apply(&raw, settings.speed_ratio(), control) {
                Ok(audio) => audio,
                Err(WspeechError::Cancelled) => return Outcome::Cancelled,
                Err(error) => return Outcome::Failed { index, error },
            }
        } else {
            audio
        };

        ctx.emit(SessionEvent::Speaking {
            index: index + 1,
            total: ctx.total(),
        });
        if let Err(error) = output.play(audio) {
            return Outcome::Failed { index, error };
        }

        loop {
            if control.is_cancelled() {
                output.stop();
                return Outcome::Cancelled;
            }
            if control.is_paused() {
                output.pause();
                if !control.wait_while_paused() {
                    output.stop();
                    return Outcome::Cancelled;
                }
                output.resume();
            }
            if output.is_finished() {
                break;
            }
            thread::sleep(POLL_INTERVAL);
        }

        ctx.tracker.set(index, ChunkStatus::Played);
        next = index + 1;
    }

    Outcome::Completed
}

/// Wait for the next fetched chunk, giving up on cancellation
fn receive(rx: &Receiver<Fetched>, control: &PlaybackControl) -> Option<Fetched> {
    loop {
        if control.is_cancelled() {
            return None;
        }
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(item) => return Some(item),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return None,
        }
    }
}

fn spawn_downloader(
    cloud: &CloudBackend,
    start: usize,
    ctx: &SessionContext,
    tx: std::sync::mpsc::SyncSender<Fetched>,
) {
    let fetcher = Arc::clone(&cloud.fetcher);
    let filter = Arc::clone(&cloud.filter);
    let chunks = Arc::clone(&ctx.chunks);
    let control = Arc::clone(&ctx.control);
    let tracker = Arc::clone(&ctx.tracker);

    let spawned = thread::Builder::new()
        .name("wspeech-fetch".to_string())
        .spawn(move || {
            for index in start..chunks.len() {
                if control.is_cancelled() {
                    break;
                }

                let settings = control.settings();
                let fetched = fetcher
                    .fetch(&chunks[index], settings.voice, &control)
                    .and_then(|raw| {
                        let audio = filter.apply(&raw, settings.speed_ratio(), &control)?;
                        Ok((raw, audio))
                    });

                let item = match fetched {
                    Ok((raw, audio)) => {
                        tracker.set(index, ChunkStatus::Ready);
                        Fetched::Ready {
                            index,
                            raw,
                            audio,
                            speed: settings.speed,
                        }
                    }
                    Err(WspeechError::Cancelled) => break,
                    Err(error) => Fetched::Failed { index, error },
                };

                let failed = matches!(item, Fetched::Failed { .. });
                // Blocks while LOOKAHEAD chunks are waiting; errors once the player is gone
                if tx.send(item).is_err() || failed {
                    break;
                }
            }
            debug!("Downloader finished");
        });

    if let Err(e) = spawned {
        // The player sees a disconnected channel and reports the failure
        error!("Failed to start downloader: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_played_is_final() {
        let tracker = ChunkTracker::new(2);
        tracker.set(0, ChunkStatus::Played);
        tracker.set(0, ChunkStatus::Ready);
        tracker.set(5, ChunkStatus::Ready);
        assert_eq!(
            tracker.snapshot(),
            vec![ChunkStatus::Played, ChunkStatus::Pending]
        );
        assert_eq!(tracker.played(), 1);
    }

    #[test]
    fn test_event_status_text() {
        assert_eq!(
            SessionEvent::Speaking { index: 2, total: 5 }.to_string(),
            "Speaking…  (2/5)"
        );
        assert_eq!(SessionEvent::Stopped.to_string(), "Stopped");
        assert_eq!(
            SessionEvent::Failed("boom".into()).to_string(),
            "Error: boom"
        );
    }

    #[test]
    fn test_start_without_backends() {
        let (tx, _rx) = std::sync::mpsc::channel();
        let mut player = Player::new(Vec::new(), tx);
        assert!(player.start("Hello.", Settings::default()).is_err());
        assert!(!player.is_active());
    }
}
