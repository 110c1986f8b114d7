//! Embedded voice widget glue
//!
//! The third-party widget is opaque; this module owns its page-side surface:
//! configuration validation, the single event channel its output reaches the
//! page through, and the mic lockstep with the capture session.

mod events;
mod handle;
mod mic_sync;

pub use events::WidgetEvent;
pub use handle::{Widget, WidgetConfig};
pub use mic_sync::run_mic_sync;
