use serde::{Deserialize, Serialize};

use crate::config::Theme;
use crate::message::MessageId;
use crate::mode::Mode;

/// Events emitted by the session orchestrator.
/// Presentation drains these and re-renders from a state snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    MessageAppended { id: MessageId },
    ConversationReplaced,
    InputChanged,
    ModeChanged { mode: Mode },
    BusyChanged { busy: bool, summarizing: bool },
    SelectionChanged,
    AuthChanged { signed_in: bool },
    HistoryChanged,
    ConfirmationChanged,
    RecordingChanged { recording: bool },
    PlaybackChanged { playing: Option<MessageId> },
    SettingsChanged,
    ThemeChanged { theme: Theme },
    SetupGuideChanged { visible: bool },
    /// Mirrors every Error-role message, for logging sinks
    Error { message: String },
}
