use super::events::WidgetEvent;
use super::handle::Widget;
use crate::speech::CaptureSession;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Keep the capture session in lockstep with the widget's own mic toggle.
///
/// When the widget reports its microphone switching on or off, the session
/// starts or stops to match. A widget that echoes the state change it just
/// caused would otherwise re-trigger the same toggle; the first mic event
/// that matches the state this task last applied is treated as that echo and
/// skipped.
pub fn run_mic_sync(session: Arc<CaptureSession>, widget: &Widget) -> JoinHandle<()> {
    let mut events = widget.subscribe();

    tokio::spawn(async move {
        let mut last_applied: Option<bool> = None;

        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "widget events dropped, mic sync may be stale");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let WidgetEvent::Microphone { active } = event else {
                continue;
            };

            if last_applied.take() == Some(active) {
                // Echo of the toggle this task just performed.
                continue;
            }

            if active {
                info!("widget mic on, starting capture");
                if let Err(err) = session.start().await {
                    warn!(error = %err, "capture start from widget toggle failed");
                    continue;
                }
            } else {
                info!("widget mic off, stopping capture");
                session.stop().await;
            }
            last_applied = Some(active);
        }
    })
}
