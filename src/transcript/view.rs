use super::turn::{ChatTurn, Speaker};
use crate::speech::{CaptureSession, TranscriptEvent};
use crate::widget::{Widget, WidgetEvent};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::warn;

#[derive(Default)]
struct ViewState {
    turns: Vec<ChatTurn>,
    /// The most recent non-final transcript, if one is pending
    interim: Option<String>,
}

impl ViewState {
    fn apply_transcript(&mut self, event: TranscriptEvent) {
        if event.is_final {
            self.turns.push(ChatTurn::now(Speaker::User, event.transcript));
            self.interim = None;
        } else {
            self.interim = Some(event.transcript);
        }
    }

    fn apply_reply(&mut self, text: String) {
        self.turns.push(ChatTurn::now(Speaker::Assistant, text));
    }
}

/// Append-only chat log fed by the transcript broadcast and the widget's
/// reply events.
///
/// Final transcripts append a user turn and clear the interim line; interim
/// transcripts only replace the interim line. Widget messages append
/// assistant turns. Rendering is a pure function of the turn list plus the
/// optional interim line.
pub struct TranscriptView {
    state: Arc<Mutex<ViewState>>,
    transcript_task: Option<JoinHandle<()>>,
    reply_task: Option<JoinHandle<()>>,
}

impl TranscriptView {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ViewState::default())),
            transcript_task: None,
            reply_task: None,
        }
    }

    /// Subscribe to the session's transcript events and, when a widget is
    /// present, its reply events. Re-attaching tears down the existing
    /// subscriptions first, so a reattached view never double-handles events.
    pub fn attach(&mut self, session: &CaptureSession, widget: Option<&Widget>) {
        self.detach();

        let mut transcripts = session.subscribe();
        let state = Arc::clone(&self.state);
        self.transcript_task = Some(tokio::spawn(async move {
            loop {
                match transcripts.recv().await {
                    Ok(event) => state.lock().await.apply_transcript(event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "transcript events dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }));

        if let Some(widget) = widget {
            let mut replies = widget.subscribe();
            let state = Arc::clone(&self.state);
            self.reply_task = Some(tokio::spawn(async move {
                loop {
                    match replies.recv().await {
                        Ok(WidgetEvent::Message { text }) => state.lock().await.apply_reply(text),
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "widget events dropped");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }));
        }
    }

    /// Unsubscribe from both sources. Idempotent; also runs on drop.
    pub fn detach(&mut self) {
        if let Some(task) = self.transcript_task.take() {
            task.abort();
        }
        if let Some(task) = self.reply_task.take() {
            task.abort();
        }
    }

    pub async fn turns(&self) -> Vec<ChatTurn> {
        self.state.lock().await.turns.clone()
    }

    pub async fn interim_line(&self) -> Option<String> {
        self.state.lock().await.interim.clone()
    }

    /// Render the current log, one line per turn, with the interim line (if
    /// any) last.
    pub async fn render(&self) -> Vec<String> {
        let state = self.state.lock().await;
        render_lines(&state.turns, state.interim.as_deref())
    }
}

impl Default for TranscriptView {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TranscriptView {
    fn drop(&mut self) {
        self.detach();
    }
}

fn render_lines(turns: &[ChatTurn], interim: Option<&str>) -> Vec<String> {
    let mut lines = Vec::with_capacity(turns.len() + 1);
    for turn in turns {
        let speaker = match turn.speaker {
            Speaker::User => "you",
            Speaker::Assistant => "assistant",
        };
        lines.push(format!(
            "[{}] {}: {}",
            turn.occurred_at.format("%H:%M:%S"),
            speaker,
            turn.text
        ));
    }
    if let Some(text) = interim {
        lines.push(format!("(typing) {text}"));
    }
    lines
}
