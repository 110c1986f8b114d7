//! Speech capture
//!
//! This module owns the voice input half of the page:
//! - The `Recognizer` capability and its event types
//! - Microphone access and release
//! - `CaptureSession`, which keeps the recognizer alive with a bounded
//!   restart loop and broadcasts transcript events
//! - Final-transcript normalization

mod channel;
mod microphone;
mod normalize;
mod recognizer;
mod session;

pub use channel::{ChannelRecognizer, RecognizerDriver};
pub use microphone::{FixedMicrophone, MicrophoneHandle, MicrophoneSource};
pub use normalize::normalize_final_transcript;
pub use recognizer::{
    RecognitionAlternative, RecognitionResult, Recognizer, RecognizerConfig, RecognizerEvent,
};
pub use session::{CaptureSession, SessionConfig, SessionStats, TranscriptEvent};
