use thiserror::Error;

/// Error taxonomy for the capture session and widget glue.
///
/// None of these take the page down. Transient recognizer failures are
/// retried up to the session's restart bound; everything else is reported
/// and waits for an explicit user retry.
#[derive(Debug, Error)]
pub enum VoiceError {
    /// Microphone access was refused. Terminal for the current `start()` call.
    #[error("microphone permission denied")]
    PermissionDenied,

    /// The recognizer failed to start for a recoverable reason.
    #[error("recognizer failed to start: {0}")]
    RecognizerStart(String),

    /// The recognizer reported an error class that must not be retried
    /// (permission, network, service unavailable).
    #[error("fatal recognizer error: {0}")]
    FatalRecognizer(String),

    /// Widget construction failed (missing configuration, bad element state).
    /// The page continues without the voice widget.
    #[error("widget initialization failed: {0}")]
    WidgetInit(String),
}
