//! Transcript view
//!
//! Renders the conversation as an append-only list of chat turns plus a
//! transient line for the in-progress (non-final) transcript.

mod turn;
mod view;

pub use turn::{ChatTurn, Speaker};
pub use view::TranscriptView;
