//! Session state and the single-writer store that owns it.
//!
//! Every mutation goes through `SessionStore`, which emits the matching
//! `SessionEvent`. Borrows are never held across an await point.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::Serialize;
use assistant_types::{
    AssistantError,
    config::{LanguageConfig, Theme},
    event::SessionEvent,
    file::{FileSelection, FileSessionKey, FileSummary},
    history::HistoryLog,
    message::{ConversationMessage, MessageDraft, MessageId},
    mode::Mode,
};

use crate::event_bus::EventBus;

/// Which exchange is in flight, if any
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    #[default]
    Idle,
    AutoSummarizing,
    UserExchange,
}

impl RequestState {
    pub fn is_busy(&self) -> bool {
        !matches!(self, RequestState::Idle)
    }

    pub fn is_summarizing(&self) -> bool {
        matches!(self, RequestState::AutoSummarizing)
    }
}

/// A destructive history action awaiting user confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Confirmation {
    DeleteEntry { id: String },
    ClearAll,
}

#[derive(Debug, Default)]
pub struct SessionState {
    pub messages: Vec<ConversationMessage>,
    pub input: String,
    pub mode: Mode,
    pub request: RequestState,
    pub selection: Option<FileSelection>,
    /// Key of the file last handed to auto-summarization
    pub processed_key: Option<FileSessionKey>,
    pub auth_token: Option<String>,
    pub recording: bool,
    pub playing: Option<MessageId>,
    pub history: HistoryLog,
    pub pending_confirmation: Option<Confirmation>,
    pub languages: LanguageConfig,
    pub theme: Theme,
    pub show_setup_guide: bool,
}

/// Read-only projection handed to presentation
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub messages: Vec<ConversationMessage>,
    pub input: String,
    pub mode: Mode,
    pub busy: bool,
    pub summarizing: bool,
    pub file: Option<FileSummary>,
    pub signed_in: bool,
    pub recording: bool,
    pub playing: Option<MessageId>,
    pub history: HistoryLog,
    pub pending_confirmation: Option<Confirmation>,
    pub languages: LanguageConfig,
    pub theme: Theme,
    pub show_setup_guide: bool,
}

/// Shared handle to the session state: clone-cheap via Rc.
#[derive(Clone)]
pub struct SessionStore {
    state: Rc<RefCell<SessionState>>,
    bus: EventBus,
    next_message_id: Rc<Cell<u64>>,
}

impl SessionStore {
    pub fn new(state: SessionState, bus: EventBus) -> Self {
        Self {
            state: Rc::new(RefCell::new(state)),
            bus,
            next_message_id: Rc::new(Cell::new(1)),
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn emit(&self, event: SessionEvent) {
        self.bus.emit(event);
    }

    pub fn read<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Mutate without emitting; callers emit the events that apply.
    pub fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        f(&mut self.state.borrow_mut())
    }

    fn allocate_id(&self) -> MessageId {
        let id = self.next_message_id.get();
        self.next_message_id.set(id + 1);
        MessageId(id)
    }

    pub fn push_message(&self, draft: MessageDraft) -> MessageId {
        let id = self.allocate_id();
        self.update(|s| s.messages.push(draft.into_message(id)));
        self.emit(SessionEvent::MessageAppended { id });
        id
    }

    pub fn push_error(&self, error: &AssistantError) -> MessageId {
        let text = error.user_message();
        log::warn!("{}", error);
        let id = self.push_message(MessageDraft::error(text.clone()));
        self.emit(SessionEvent::Error { message: text });
        id
    }

    /// Replace the whole conversation (history selection, file changes).
    pub fn replace_messages(&self, drafts: Vec<MessageDraft>) {
        let messages: Vec<ConversationMessage> = drafts
            .into_iter()
            .map(|d| d.into_message(self.allocate_id()))
            .collect();
        self.update(|s| s.messages = messages);
        self.emit(SessionEvent::ConversationReplaced);
    }

    pub fn set_input(&self, text: String) {
        self.update(|s| s.input = text);
        self.emit(SessionEvent::InputChanged);
    }

    pub fn set_request(&self, request: RequestState) {
        self.update(|s| s.request = request);
        self.emit(SessionEvent::BusyChanged {
            busy: request.is_busy(),
            summarizing: request.is_summarizing(),
        });
    }

    pub fn set_recording(&self, recording: bool) {
        let changed = self.update(|s| std::mem::replace(&mut s.recording, recording) != recording);
        if changed {
            self.emit(SessionEvent::RecordingChanged { recording });
        }
    }

    pub fn set_playing(&self, playing: Option<MessageId>) {
        let changed = self.update(|s| std::mem::replace(&mut s.playing, playing) != playing);
        if changed {
            self.emit(SessionEvent::PlaybackChanged { playing });
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.read(|s| SessionSnapshot {
            messages: s.messages.clone(),
            input: s.input.clone(),
            mode: s.mode,
            busy: s.request.is_busy(),
            summarizing: s.request.is_summarizing(),
            file: s.selection.as_ref().map(FileSelection::summary),
            signed_in: s.auth_token.is_some(),
            recording: s.recording,
            playing: s.playing,
            history: s.history.clone(),
            pending_confirmation: s.pending_confirmation.clone(),
            languages: s.languages.clone(),
            theme: s.theme,
            show_setup_guide: s.show_setup_guide,
        })
    }
}
