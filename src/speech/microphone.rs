use crate::error::VoiceError;
use async_trait::async_trait;
use tracing::info;

/// Exclusive handle on an open microphone stream.
///
/// Dropping the handle releases the stream; `release` does the same with an
/// explicit call site.
#[derive(Debug)]
pub struct MicrophoneHandle {
    device: String,
}

impl MicrophoneHandle {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
        }
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn release(self) {}
}

impl Drop for MicrophoneHandle {
    fn drop(&mut self) {
        info!(device = %self.device, "microphone released");
    }
}

/// Microphone access capability.
///
/// `acquire` may suspend on the permission prompt and fails with
/// [`VoiceError::PermissionDenied`] when the user declines.
#[async_trait]
pub trait MicrophoneSource: Send + Sync {
    async fn acquire(&self) -> Result<MicrophoneHandle, VoiceError>;
}

/// Microphone source with a fixed grant/deny policy.
pub struct FixedMicrophone {
    device: String,
    grant: bool,
}

impl FixedMicrophone {
    pub fn granting(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            grant: true,
        }
    }

    /// A source whose permission prompt is always declined.
    pub fn denying() -> Self {
        Self {
            device: String::new(),
            grant: false,
        }
    }
}

impl Default for FixedMicrophone {
    fn default() -> Self {
        Self::granting("default")
    }
}

#[async_trait]
impl MicrophoneSource for FixedMicrophone {
    async fn acquire(&self) -> Result<MicrophoneHandle, VoiceError> {
        if !self.grant {
            return Err(VoiceError::PermissionDenied);
        }
        info!(device = %self.device, "microphone acquired");
        Ok(MicrophoneHandle::new(self.device.clone()))
    }
}
