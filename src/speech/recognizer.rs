use crate::error::VoiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// A single hypothesis for one stretch of recognized speech.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionAlternative {
    pub transcript: String,
    /// Confidence score (0.0 to 1.0), if the engine reports one
    pub confidence: Option<f32>,
}

/// One incremental recognition result.
///
/// `is_final` means the engine will not revise this result further; interim
/// results may be replaced wholesale by later events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionResult {
    /// Alternatives ranked best-first
    pub alternatives: Vec<RecognitionAlternative>,
    pub is_final: bool,
}

impl RecognitionResult {
    pub fn interim(text: &str) -> Self {
        Self {
            alternatives: vec![RecognitionAlternative {
                transcript: text.to_string(),
                confidence: None,
            }],
            is_final: false,
        }
    }

    pub fn finalized(text: &str) -> Self {
        Self {
            alternatives: vec![RecognitionAlternative {
                transcript: text.to_string(),
                confidence: None,
            }],
            is_final: true,
        }
    }

    /// Top-ranked alternative text, if any.
    pub fn best_transcript(&self) -> Option<&str> {
        self.alternatives.first().map(|alt| alt.transcript.as_str())
    }
}

/// Events delivered by a running recognizer, in emission order.
#[derive(Debug, Clone)]
pub enum RecognizerEvent {
    /// The engine began listening.
    Started,

    /// Incremental results. `start_index` points at the first entry in
    /// `results` that changed since the previous event; earlier entries are
    /// unchanged history and must not be re-emitted.
    Results {
        start_index: usize,
        results: Vec<RecognitionResult>,
    },

    /// Engine-reported error, carrying the engine's error-code string.
    Error { code: String },

    /// The engine stopped listening on its own.
    Ended,
}

/// Recognizer settings, fixed for the lifetime of a session.
#[derive(Debug, Clone)]
pub struct RecognizerConfig {
    /// BCP-47 language tag for recognition
    pub language: String,
    /// Keep listening across utterances instead of stopping after the first
    pub continuous: bool,
    /// Deliver provisional results before the final one
    pub interim_results: bool,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            language: "nl-NL".to_string(),
            continuous: true,
            interim_results: true,
        }
    }
}

/// Error codes after which the session must not attempt a restart.
pub(crate) fn is_fatal_error_code(code: &str) -> bool {
    matches!(code, "not-allowed" | "network" | "service-not-allowed")
}

/// Speech recognition capability.
///
/// The host engine's assignable callback fields become named subscription
/// points here: each successful `start` hands back an ordered event stream
/// for that run, and the stream closing (or `Ended`) is the run's end signal.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Start recognizing. Returns the event stream for this run.
    async fn start(&mut self) -> Result<mpsc::Receiver<RecognizerEvent>, VoiceError>;

    /// Stop the current run. Idempotent.
    async fn stop(&mut self) -> Result<(), VoiceError>;

    /// Whether a run is currently live.
    fn is_running(&self) -> bool;

    /// Implementation name for logging.
    fn name(&self) -> &str;
}
