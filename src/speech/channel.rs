use super::recognizer::{RecognitionResult, Recognizer, RecognizerConfig, RecognizerEvent};
use crate::error::VoiceError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

const EVENT_BUFFER: usize = 64;

struct DriverShared {
    /// Sender for the current run's event stream, if one is live
    live: Mutex<Option<mpsc::Sender<RecognizerEvent>>>,
    running: AtomicBool,
    start_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    fail_next_starts: AtomicUsize,
}

/// Recognizer driven from outside the session.
///
/// The host bridge (or a test) pushes engine events through a
/// [`RecognizerDriver`]; the session consumes them like any other engine.
/// Starts can be told to fail, which is how restart behavior is exercised
/// without a real engine.
pub struct ChannelRecognizer {
    config: RecognizerConfig,
    shared: Arc<DriverShared>,
}

impl ChannelRecognizer {
    pub fn new(config: RecognizerConfig) -> Self {
        Self {
            config,
            shared: Arc::new(DriverShared {
                live: Mutex::new(None),
                running: AtomicBool::new(false),
                start_calls: AtomicUsize::new(0),
                stop_calls: AtomicUsize::new(0),
                fail_next_starts: AtomicUsize::new(0),
            }),
        }
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    /// Handle for injecting engine events into the live run.
    pub fn driver(&self) -> RecognizerDriver {
        RecognizerDriver {
            shared: Arc::clone(&self.shared),
        }
    }
}

#[async_trait]
impl Recognizer for ChannelRecognizer {
    async fn start(&mut self) -> Result<mpsc::Receiver<RecognizerEvent>, VoiceError> {
        self.shared.start_calls.fetch_add(1, Ordering::SeqCst);

        let remaining = self.shared.fail_next_starts.load(Ordering::SeqCst);
        if remaining > 0 {
            self.shared
                .fail_next_starts
                .store(remaining - 1, Ordering::SeqCst);
            return Err(VoiceError::RecognizerStart(
                "engine rejected start".to_string(),
            ));
        }

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let _ = tx.try_send(RecognizerEvent::Started);
        *self.shared.live.lock().await = Some(tx);
        self.shared.running.store(true, Ordering::SeqCst);

        debug!(language = %self.config.language, "channel recognizer started");
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), VoiceError> {
        self.shared.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.shared.live.lock().await.take();
        self.shared.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "channel"
    }
}

/// Injection handle paired with a [`ChannelRecognizer`].
///
/// Push methods return `false` when no run is live (the event is dropped,
/// matching an engine handle that has already gone away).
#[derive(Clone)]
pub struct RecognizerDriver {
    shared: Arc<DriverShared>,
}

impl RecognizerDriver {
    /// Deliver a raw engine event into the live run.
    pub async fn push(&self, event: RecognizerEvent) -> bool {
        let live = self.shared.live.lock().await;
        match live.as_ref() {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }

    /// Deliver a single interim result.
    pub async fn push_interim(&self, text: &str) -> bool {
        self.push(RecognizerEvent::Results {
            start_index: 0,
            results: vec![RecognitionResult::interim(text)],
        })
        .await
    }

    /// Deliver a single final result.
    pub async fn push_final(&self, text: &str) -> bool {
        self.push(RecognizerEvent::Results {
            start_index: 0,
            results: vec![RecognitionResult::finalized(text)],
        })
        .await
    }

    /// Deliver an engine error with the given error-code string.
    pub async fn push_error(&self, code: &str) -> bool {
        self.push(RecognizerEvent::Error {
            code: code.to_string(),
        })
        .await
    }

    /// End the live run, as an engine whose session terminated on its own.
    pub async fn end_run(&self) -> bool {
        let mut live = self.shared.live.lock().await;
        match live.take() {
            Some(tx) => {
                let _ = tx.try_send(RecognizerEvent::Ended);
                self.shared.running.store(false, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    /// Reject the next `n` start attempts.
    pub fn fail_next_starts(&self, n: usize) {
        self.shared.fail_next_starts.store(n, Ordering::SeqCst);
    }

    /// Number of times the engine has been asked to start so far.
    pub fn start_calls(&self) -> usize {
        self.shared.start_calls.load(Ordering::SeqCst)
    }

    /// Number of times the engine has been asked to stop so far.
    pub fn stop_calls(&self) -> usize {
        self.shared.stop_calls.load(Ordering::SeqCst)
    }
}
