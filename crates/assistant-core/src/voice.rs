//! Voice capture coordination.
//!
//! At most one recognition session exists. A fresh session is created on
//! every start; the recognizer's `End` event is the only thing that moves
//! the state back to not-recording. Events from superseded sessions are ignored.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use assistant_types::{AssistantError, event::SessionEvent, message::MessageDraft};

use crate::ports::{RecognitionEvent, RecognitionOptions, RecognitionSession, SpeechRecognitionPort};
use crate::store::SessionStore;

pub const RECOGNITION_UNSUPPORTED: &str = "Speech recognition is not supported in this browser.";

struct ActiveRecognition {
    generation: u64,
    session: Rc<dyn RecognitionSession>,
}

struct VoiceInner {
    generation: Cell<u64>,
    /// Kept until the next start so the recognizer's callbacks stay alive
    active: RefCell<Option<ActiveRecognition>>,
}

#[derive(Clone)]
pub struct VoiceCapture {
    store: SessionStore,
    recognizer: Rc<dyn SpeechRecognitionPort>,
    inner: Rc<VoiceInner>,
}

impl VoiceCapture {
    pub fn new(store: SessionStore, recognizer: Rc<dyn SpeechRecognitionPort>) -> Self {
        Self {
            store,
            recognizer,
            inner: Rc::new(VoiceInner {
                generation: Cell::new(0),
                active: RefCell::new(None),
            }),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.store.read(|s| s.recording)
    }

    pub fn toggle(&self) {
        if self.is_recording() {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Ask the live session to stop. The state flips when it reports `End`.
    pub fn stop(&self) {
        let session = self
            .inner
            .active
            .borrow()
            .as_ref()
            .map(|a| a.session.clone());
        match session {
            Some(session) => session.stop(),
            None => log::debug!("stop requested with no recognition session"),
        }
    }

    pub fn start(&self) {
        if self.is_recording() {
            return;
        }
        if !self.recognizer.is_available() {
            self.store
                .push_error(&AssistantError::Unsupported(RECOGNITION_UNSUPPORTED.to_string()));
            return;
        }

        let generation = self.inner.generation.get() + 1;
        self.inner.generation.set(generation);

        let options = RecognitionOptions {
            language: self.store.read(|s| s.languages.voice.clone()),
            continuous: true,
            interim_results: true,
        };

        let store = self.store.clone();
        let inner: Weak<VoiceInner> = Rc::downgrade(&self.inner);
        let sink = Rc::new(move |event: RecognitionEvent| {
            let Some(inner) = inner.upgrade() else { return };
            if inner.generation.get() != generation {
                log::debug!("ignoring event from stale recognition session {}", generation);
                return;
            }
            handle_event(&store, event);
        });

        match self.recognizer.start(options, sink) {
            Ok(session) => {
                *self.inner.active.borrow_mut() = Some(ActiveRecognition { generation, session });
                self.store.set_recording(true);
                log::info!("Recognition session {} started", generation);
            }
            Err(e) => {
                self.store.push_error(&e);
            }
        }
    }

    /// Generation of the live session, if one was started
    pub fn active_generation(&self) -> Option<u64> {
        self.inner.active.borrow().as_ref().map(|a| a.generation)
    }
}

fn handle_event(store: &SessionStore, event: RecognitionEvent) {
    match event {
        RecognitionEvent::Transcript(parts) => {
            // The buffer always mirrors the full transcript so far
            store.set_input(parts.concat());
        }
        RecognitionEvent::Error(reason) => {
            let message = format!("Speech recognition error: {}", reason);
            log::warn!("{}", message);
            store.push_message(MessageDraft::error(message.clone()));
            store.emit(SessionEvent::Error { message });
            store.set_recording(false);
        }
        RecognitionEvent::End => store.set_recording(false),
    }
}
