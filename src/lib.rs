pub mod config;
pub mod error;
pub mod speech;
pub mod transcript;
pub mod widget;

pub use config::Config;
pub use error::VoiceError;
pub use speech::{
    normalize_final_transcript, CaptureSession, ChannelRecognizer, FixedMicrophone,
    MicrophoneHandle, MicrophoneSource, RecognitionAlternative, RecognitionResult, Recognizer,
    RecognizerConfig, RecognizerDriver, RecognizerEvent, SessionConfig, SessionStats,
    TranscriptEvent,
};
pub use transcript::{ChatTurn, Speaker, TranscriptView};
pub use widget::{run_mic_sync, Widget, WidgetConfig, WidgetEvent};
