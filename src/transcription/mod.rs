pub mod feed;

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// A speech-to-text engine seen from the session: it can be started and
/// stopped, and polled for its most recent transcript fragment.
pub trait SpeechSource: Send + Sync {
    fn start(&self) -> anyhow::Result<()>;

    fn stop(&self);

    /// The newest fragment produced since the previous pull, if any.
    fn pull_latest(&self) -> Option<String>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Transcription already running")]
    AlreadyRunning,
    #[error("No active transcription")]
    NotRunning,
    #[error("Failed to start transcription: {0}")]
    Source(String),
}

/// A stored transcript fragment. `seq` increases with every fragment for the
/// lifetime of the session object, across restarts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub seq: u64,
    pub text: String,
}

struct SessionInner {
    active: bool,
    /// Bumped on every start so a loop from an earlier run never writes.
    generation: u64,
    latest: Option<Fragment>,
    next_seq: u64,
}

impl SessionInner {
    fn is_current(&self, generation: u64) -> bool {
        self.active && self.generation == generation
    }

    fn record(&mut self, text: String) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.latest = Some(Fragment { seq, text });
    }
}

/// Idle/Running state machine around a `SpeechSource`.
///
/// `active`, the latest fragment and the loop generation share one lock, so
/// a reader never sees a fragment from a stopped run next to `active == true`.
pub struct TranscriptionSession {
    source: Arc<dyn SpeechSource>,
    inner: Arc<Mutex<SessionInner>>,
    poll_interval: Duration,
}

impl TranscriptionSession {
    pub fn new(source: Arc<dyn SpeechSource>, poll_interval: Duration) -> Self {
        Self {
            source,
            inner: Arc::new(Mutex::new(SessionInner {
                active: false,
                generation: 0,
                latest: None,
                next_seq: 1,
            })),
            poll_interval,
        }
    }

    /// Idle → Running. Starts the source and spawns the capture loop.
    pub fn start(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        if inner.active {
            return Err(SessionError::AlreadyRunning);
        }

        self.source
            .start()
            .map_err(|e| SessionError::Source(format!("{e:#}")))?;

        inner.active = true;
        inner.generation += 1;
        inner.latest = None;
        let generation = inner.generation;

        let source = self.source.clone();
        let shared = self.inner.clone();
        let interval = self.poll_interval;
        let spawned = std::thread::Builder::new()
            .name("transcription-capture".to_string())
            .spawn(move || capture_loop(source, shared, generation, interval));

        if let Err(e) = spawned {
            inner.active = false;
            self.source.stop();
            return Err(SessionError::Source(format!("failed to spawn capture loop: {e}")));
        }

        info!("Transcription started");
        Ok(())
    }

    /// Running → Idle. The capture loop notices on its next iteration.
    pub fn stop(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        if !inner.active {
            return Err(SessionError::NotRunning);
        }
        inner.active = false;
        self.source.stop();
        info!("Transcription stopped");
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.inner.lock().active
    }

    pub fn latest(&self) -> Option<String> {
        self.inner.lock().latest.as_ref().map(|f| f.text.clone())
    }

    /// The latest fragment if it is newer than `seq`.
    pub fn latest_since(&self, seq: u64) -> Option<Fragment> {
        self.inner
            .lock()
            .latest
            .as_ref()
            .filter(|f| f.seq > seq)
            .cloned()
    }
}

impl Drop for TranscriptionSession {
    fn drop(&mut self) {
        let mut inner = self.inner.lock();
        if inner.active {
            inner.active = false;
            self.source.stop();
        }
    }
}

fn capture_loop(
    source: Arc<dyn SpeechSource>,
    shared: Arc<Mutex<SessionInner>>,
    generation: u64,
    interval: Duration,
) {
    debug!("capture loop {generation} running");
    loop {
        if !shared.lock().is_current(generation) {
            break;
        }

        if let Some(text) = source.pull_latest() {
            let text = text.trim().to_string();
            if !text.is_empty() {
                let mut inner = shared.lock();
                if !inner.is_current(generation) {
                    warn!("dropping fragment captured after stop");
                    break;
                }
                debug!("captured fragment: {text:?}");
                inner.record(text);
            }
        }

        std::thread::sleep(interval);
    }
    debug!("capture loop {generation} exited");
}
