use serde::{Deserialize, Serialize};

/// Events surfaced by the embedded conversational widget.
///
/// This is the single page-side channel for widget output; reply text,
/// errors, and mic toggle requests all arrive here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum WidgetEvent {
    /// Assistant reply text
    Message { text: String },

    /// Widget-reported error text
    Error { message: String },

    /// The widget's own mic toggle was used
    Microphone { active: bool },
}
