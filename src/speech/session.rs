use super::microphone::{MicrophoneHandle, MicrophoneSource};
use super::normalize::normalize_final_transcript;
use super::recognizer::{is_fatal_error_code, Recognizer, RecognizerEvent};
use crate::error::VoiceError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

const TRANSCRIPT_CHANNEL_CAPACITY: usize = 256;

/// One transcript emission.
///
/// Interim text is raw engine output; final text has been through
/// [`normalize_final_transcript`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEvent {
    pub transcript: String,
    #[serde(rename = "isFinal")]
    pub is_final: bool,
}

/// Configuration for a capture session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Unique session identifier, used in logs
    pub session_id: String,

    /// Upper bound on consecutive automatic restart attempts
    pub max_restart_attempts: u32,

    /// Delay between a failed restart and the next attempt
    pub restart_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("capture-{}", uuid::Uuid::new_v4()),
            max_restart_attempts: 3,
            restart_delay: Duration::from_secs(1),
        }
    }
}

/// Point-in-time view of session state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Whether the user wants capture running
    pub desired_active: bool,

    /// Whether the recognizer is currently live
    pub listening: bool,

    /// Consecutive failed restart attempts so far
    pub restart_attempts: u32,

    /// When the session was created
    pub started_at: DateTime<Utc>,

    /// Transcript events emitted so far (interim and final)
    pub transcripts_emitted: usize,
}

struct SessionShared {
    config: SessionConfig,
    recognizer: Mutex<Box<dyn Recognizer>>,
    microphone: Mutex<Option<MicrophoneHandle>>,
    desired_active: AtomicBool,
    listening: AtomicBool,
    restart_attempts: AtomicU32,
    transcripts_emitted: AtomicUsize,
    events_tx: broadcast::Sender<TranscriptEvent>,
}

impl SessionShared {
    async fn release_microphone(&self) {
        if let Some(mic) = self.microphone.lock().await.take() {
            mic.release();
        }
    }
}

/// Speech capture session: exclusive owner of one recognizer handle and one
/// microphone stream.
///
/// Keeps the recognizer running for as long as the user wants it running,
/// relaunching it after unexpected termination up to the configured bound.
/// Once the bound is hit, automatic restarting is disabled until the next
/// explicit `start()`. Transcript events fan out over a broadcast channel in
/// emission order.
pub struct CaptureSession {
    shared: Arc<SessionShared>,
    microphone_source: Box<dyn MicrophoneSource>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
    started_at: DateTime<Utc>,
}

impl CaptureSession {
    pub fn new(
        config: SessionConfig,
        recognizer: Box<dyn Recognizer>,
        microphone_source: Box<dyn MicrophoneSource>,
    ) -> Self {
        let (events_tx, _) = broadcast::channel(TRANSCRIPT_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(SessionShared {
                config,
                recognizer: Mutex::new(recognizer),
                microphone: Mutex::new(None),
                desired_active: AtomicBool::new(false),
                listening: AtomicBool::new(false),
                restart_attempts: AtomicU32::new(0),
                transcripts_emitted: AtomicUsize::new(0),
                events_tx,
            }),
            microphone_source,
            supervisor: Mutex::new(None),
            started_at: Utc::now(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.shared.config.session_id
    }

    /// Subscribe to transcript events. Multi-subscriber, fire-and-forget,
    /// ordered by emission.
    pub fn subscribe(&self) -> broadcast::Receiver<TranscriptEvent> {
        self.shared.events_tx.subscribe()
    }

    /// Start capturing: acquire the microphone, start the recognizer, spawn
    /// the supervising task. No-op when capture is already running.
    pub async fn start(&self) -> Result<(), VoiceError> {
        if self.shared.listening.load(Ordering::SeqCst) {
            warn!(session = %self.session_id(), "capture already running");
            return Ok(());
        }

        self.shared.desired_active.store(true, Ordering::SeqCst);

        let mic = match self.microphone_source.acquire().await {
            Ok(mic) => mic,
            Err(err) => {
                error!(session = %self.session_id(), error = %err, "microphone acquisition failed");
                self.shared.desired_active.store(false, Ordering::SeqCst);
                return Err(err);
            }
        };

        // A stop() may have completed while the permission prompt was up;
        // teardown wins, so the recognizer must not start.
        if !self.shared.desired_active.load(Ordering::SeqCst) {
            info!(session = %self.session_id(), "stopped during microphone acquisition, not starting");
            mic.release();
            return Ok(());
        }
        *self.shared.microphone.lock().await = Some(mic);

        let events = {
            let mut recognizer = self.shared.recognizer.lock().await;
            match recognizer.start().await {
                Ok(events) => events,
                Err(err) => {
                    error!(session = %self.session_id(), error = %err, "recognizer start failed");
                    self.shared.desired_active.store(false, Ordering::SeqCst);
                    self.shared.release_microphone().await;
                    return Err(err);
                }
            }
        };

        if !self.shared.desired_active.load(Ordering::SeqCst) {
            info!(session = %self.session_id(), "stopped during recognizer start, tearing down");
            let mut recognizer = self.shared.recognizer.lock().await;
            if let Err(err) = recognizer.stop().await {
                warn!(session = %self.session_id(), error = %err, "recognizer stop failed");
            }
            self.shared.release_microphone().await;
            return Ok(());
        }

        self.shared.restart_attempts.store(0, Ordering::SeqCst);
        self.shared.listening.store(true, Ordering::SeqCst);
        info!(session = %self.session_id(), "speech capture started");

        let shared = Arc::clone(&self.shared);
        let task = tokio::spawn(run_capture(shared, events));
        if let Some(old) = self.supervisor.lock().await.replace(task) {
            old.abort();
        }

        Ok(())
    }

    /// Stop capturing: cancel any pending restart, stop the recognizer,
    /// release the microphone. Idempotent, and safe to call while a `start()`
    /// is in flight; no recognizer start fires after this returns.
    pub async fn stop(&self) {
        self.shared.desired_active.store(false, Ordering::SeqCst);

        // The supervisor is the only place automatic restarts come from;
        // aborting it also cancels a pending restart delay.
        if let Some(task) = self.supervisor.lock().await.take() {
            task.abort();
        }

        {
            let mut recognizer = self.shared.recognizer.lock().await;
            if let Err(err) = recognizer.stop().await {
                warn!(session = %self.session_id(), error = %err, "recognizer stop failed");
            }
        }

        self.shared.listening.store(false, Ordering::SeqCst);
        self.shared.release_microphone().await;
        info!(session = %self.session_id(), "speech capture stopped");
    }

    pub fn is_listening(&self) -> bool {
        self.shared.listening.load(Ordering::SeqCst)
    }

    pub fn desired_active(&self) -> bool {
        self.shared.desired_active.load(Ordering::SeqCst)
    }

    pub fn restart_attempts(&self) -> u32 {
        self.shared.restart_attempts.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            desired_active: self.desired_active(),
            listening: self.is_listening(),
            restart_attempts: self.restart_attempts(),
            started_at: self.started_at,
            transcripts_emitted: self.shared.transcripts_emitted.load(Ordering::SeqCst),
        }
    }
}

/// Supervising task: pump recognizer events, and when a run ends while the
/// user still wants capture, work through the bounded restart loop.
async fn run_capture(shared: Arc<SessionShared>, mut events: mpsc::Receiver<RecognizerEvent>) {
    loop {
        pump_run(&shared, &mut events).await;
        shared.listening.store(false, Ordering::SeqCst);

        if !shared.desired_active.load(Ordering::SeqCst) {
            shared.release_microphone().await;
            return;
        }

        info!(session = %shared.config.session_id, "recognizer ended unexpectedly, restarting");
        match attempt_restarts(&shared).await {
            Some(next) => events = next,
            None => {
                shared.release_microphone().await;
                return;
            }
        }
    }
}

/// Consume one run's event stream until the engine ends it.
async fn pump_run(shared: &SessionShared, events: &mut mpsc::Receiver<RecognizerEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            RecognizerEvent::Started => {
                shared.listening.store(true, Ordering::SeqCst);
            }
            RecognizerEvent::Results {
                start_index,
                results,
            } => {
                for result in results.iter().skip(start_index) {
                    let Some(text) = result.best_transcript() else {
                        continue;
                    };
                    let transcript = if result.is_final {
                        normalize_final_transcript(text)
                    } else {
                        text.to_string()
                    };
                    if result.is_final {
                        info!(session = %shared.config.session_id, transcript = %transcript, "final transcript");
                    }
                    shared.transcripts_emitted.fetch_add(1, Ordering::SeqCst);
                    // Send only fails when nobody is subscribed; that is fine
                    // for a fire-and-forget broadcast.
                    let _ = shared.events_tx.send(TranscriptEvent {
                        transcript,
                        is_final: result.is_final,
                    });
                }
            }
            RecognizerEvent::Error { code } => {
                if is_fatal_error_code(&code) {
                    let err = VoiceError::FatalRecognizer(code);
                    error!(session = %shared.config.session_id, error = %err, "disabling capture");
                    shared.desired_active.store(false, Ordering::SeqCst);
                } else {
                    warn!(session = %shared.config.session_id, code = %code, "recognizer error");
                }
            }
            RecognizerEvent::Ended => break,
        }
    }
}

/// Restart the recognizer, retrying after a fixed delay on failure.
///
/// Gives up after `max_restart_attempts` consecutive failures: capture is
/// disabled and the counter reset, so nothing happens until the next
/// explicit `start()`. Any successful start resets the counter to zero.
async fn attempt_restarts(shared: &SessionShared) -> Option<mpsc::Receiver<RecognizerEvent>> {
    loop {
        if !shared.desired_active.load(Ordering::SeqCst) {
            return None;
        }

        if shared.restart_attempts.load(Ordering::SeqCst) >= shared.config.max_restart_attempts {
            warn!(
                session = %shared.config.session_id,
                limit = shared.config.max_restart_attempts,
                "restart limit reached, giving up until next explicit start"
            );
            shared.desired_active.store(false, Ordering::SeqCst);
            shared.restart_attempts.store(0, Ordering::SeqCst);
            return None;
        }

        let started = {
            let mut recognizer = shared.recognizer.lock().await;
            recognizer.start().await
        };

        match started {
            Ok(events) => {
                shared.restart_attempts.store(0, Ordering::SeqCst);
                shared.listening.store(true, Ordering::SeqCst);
                info!(session = %shared.config.session_id, "recognizer restarted");
                return Some(events);
            }
            Err(err) => {
                let attempts = shared.restart_attempts.fetch_add(1, Ordering::SeqCst) + 1;
                warn!(
                    session = %shared.config.session_id,
                    attempts,
                    error = %err,
                    "recognizer restart failed"
                );
                // The last allowed attempt gives up right away; only retries
                // still within the bound wait out the delay.
                if attempts >= shared.config.max_restart_attempts {
                    continue;
                }
                tokio::time::sleep(shared.config.restart_delay).await;
            }
        }
    }
}
