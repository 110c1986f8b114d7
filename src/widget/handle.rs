use super::events::WidgetEvent;
use crate::error::VoiceError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{info, warn};

const WIDGET_CHANNEL_CAPACITY: usize = 64;

/// Static configuration for the embedded widget element.
///
/// Supplied at startup; the widget cannot be constructed without an API key
/// and agent id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetConfig {
    pub api_key: String,
    pub agent_id: String,
    pub voice_id: String,
}

/// In-page handle for the embedded third-party voice agent.
///
/// The widget itself is opaque; this handle validates its configuration,
/// produces the attribute set the element is constructed with, and owns the
/// one broadcast channel its events reach the page through.
#[derive(Debug)]
pub struct Widget {
    config: WidgetConfig,
    events_tx: broadcast::Sender<WidgetEvent>,
}

impl Widget {
    /// Validate configuration and build the handle. Fails with
    /// [`VoiceError::WidgetInit`] when required identifiers are missing;
    /// callers are expected to log and continue without voice.
    pub fn new(config: WidgetConfig) -> Result<Self, VoiceError> {
        if config.api_key.trim().is_empty() {
            return Err(VoiceError::WidgetInit("missing api key".to_string()));
        }
        if config.agent_id.trim().is_empty() {
            return Err(VoiceError::WidgetInit("missing agent id".to_string()));
        }

        let (events_tx, _) = broadcast::channel(WIDGET_CHANNEL_CAPACITY);
        info!(agent_id = %config.agent_id, "widget initialized");

        Ok(Self { config, events_tx })
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    /// Attribute map the embedded element is constructed with. Scalar values
    /// become plain strings, structured values JSON.
    pub fn element_attributes(&self, language: &str) -> Vec<(String, String)> {
        let stt = json!({
            "continuous": true,
            "interimResults": true,
        });

        vec![
            ("api-key".to_string(), self.config.api_key.clone()),
            ("agent-id".to_string(), self.config.agent_id.clone()),
            ("voice-id".to_string(), self.config.voice_id.clone()),
            ("language".to_string(), language.to_string()),
            ("stt".to_string(), stt.to_string()),
        ]
    }

    /// Subscribe to widget events. Multi-subscriber, ordered by emission.
    pub fn subscribe(&self) -> broadcast::Receiver<WidgetEvent> {
        self.events_tx.subscribe()
    }

    /// Feed an event from the embedded element into the page-side channel.
    pub fn inject(&self, event: WidgetEvent) {
        if let WidgetEvent::Error { message } = &event {
            warn!(agent_id = %self.config.agent_id, message = %message, "widget error");
        }
        // Send only fails when nobody is subscribed yet.
        let _ = self.events_tx.send(event);
    }
}
