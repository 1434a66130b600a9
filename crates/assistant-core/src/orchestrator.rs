//! Session orchestrator: the request state machine.
//!
//! States are `Idle`, `AutoSummarizing` and `UserExchange`. At most one
//! exchange is in flight; a submission while busy is dropped, never queued.
//! Every handler mutates state synchronously before its first await, so a
//! second event arriving mid-flight always observes the busy flag.

use std::cell::RefCell;
use std::rc::Rc;

use assistant_types::{
    AssistantError,
    config::{AssistantConfig, SourceLanguage, Theme},
    event::SessionEvent,
    file::{DocumentSource, FileSelection, FileSessionKey, LocalFile, RemoteFile, SUPPORTED_REMOTE_MIME_TYPES},
    history::HistoryEntry,
    message::{GroundingSource, MessageDraft, MessageId},
    mode::Mode,
};

use crate::dispatch::{self, Exchange};
use crate::event_bus::EventBus;
use crate::persistence::Persistence;
use crate::playback::PlaybackController;
use crate::ports::{Capabilities, Gateways, StoragePort};
use crate::store::{Confirmation, RequestState, SessionSnapshot, SessionState, SessionStore};
use crate::voice::VoiceCapture;

pub const GREETING: &str = "Hello! How can I help you today? Choose a mode to get started.";
pub const SELECT_FILE_PROMPT: &str = "Select a file to start analysing.";
pub const SETUP_REQUIRED: &str = "Please complete the setup guide to connect to cloud storage.";
pub const AUTH_NOT_READY: &str = "Cloud sign-in is not ready yet. Try again in a moment.";
pub const SUMMARY_FAILED: &str = "The document summary could not be generated.";

/// A pending automatic summary, captured when it starts
struct SummaryJob {
    key: FileSessionKey,
    source: DocumentSource,
}

#[derive(Clone)]
pub struct Orchestrator {
    store: SessionStore,
    gateways: Gateways,
    persistence: Persistence,
    voice: VoiceCapture,
    playback: PlaybackController,
    config: Rc<RefCell<AssistantConfig>>,
}

impl Orchestrator {
    pub fn new(
        config: AssistantConfig,
        gateways: Gateways,
        capabilities: Capabilities,
        storage: Rc<dyn StoragePort>,
        bus: EventBus,
    ) -> Self {
        let state = SessionState {
            languages: config.languages.clone(),
            show_setup_guide: !config.cloud.is_configured(),
            ..SessionState::default()
        };
        let store = SessionStore::new(state, bus);
        let voice = VoiceCapture::new(store.clone(), capabilities.speech_recognition.clone());
        let playback = PlaybackController::new(
            store.clone(),
            gateways.speech.clone(),
            capabilities.audio_output.clone(),
            config.audio.clone(),
        );

        Self {
            store,
            gateways,
            persistence: Persistence::new(storage),
            voice,
            playback,
            config: Rc::new(RefCell::new(config)),
        }
    }

    /// Restore persisted history, theme and credentials, then greet.
    pub async fn initialize(&self) {
        let history = self.persistence.load_history().await;
        let theme = self.persistence.load_theme().await;
        let stored = self.persistence.load_config().await;

        if let Some(stored) = stored {
            let mut config = self.config.borrow_mut();
            if stored.cloud.is_configured() {
                config.cloud = stored.cloud;
            }
            config.languages = stored.languages;
        }
        let (languages, configured) = {
            let config = self.config.borrow();
            (config.languages.clone(), config.cloud.is_configured())
        };

        log::info!(
            "Session restored from {}: {} history entries",
            self.persistence.backend_name(),
            history.len()
        );

        self.store.update(|s| {
            s.history = history;
            s.theme = theme;
            s.languages = languages;
            s.show_setup_guide = !configured;
        });
        self.store.emit(SessionEvent::HistoryChanged);
        self.store.emit(SessionEvent::ThemeChanged { theme });
        self.store.emit(SessionEvent::SettingsChanged);
        self.store.emit(SessionEvent::SetupGuideChanged { visible: !configured });

        let empty = self.store.read(|s| s.messages.is_empty() && s.selection.is_none());
        if empty {
            self.store.push_message(MessageDraft::model(GREETING));
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.store.snapshot()
    }

    pub fn config(&self) -> AssistantConfig {
        self.config.borrow().clone()
    }

    // ─── Input & Settings ────────────────────────────────────

    pub fn set_input(&self, text: impl Into<String>) {
        self.store.set_input(text.into());
    }

    /// Allowed in any state; only affects the next submission.
    pub fn set_mode(&self, mode: Mode) {
        self.store.update(|s| s.mode = mode);
        self.store.emit(SessionEvent::ModeChanged { mode });
    }

    pub fn set_voice_language(&self, language: impl Into<String>) {
        let language = language.into();
        self.store.update(|s| s.languages.voice = language);
        self.store.emit(SessionEvent::SettingsChanged);
    }

    pub fn set_target_language(&self, language: impl Into<String>) {
        let language = language.into();
        self.store.update(|s| s.languages.target = language);
        self.store.emit(SessionEvent::SettingsChanged);
    }

    pub fn set_source_language(&self, language: SourceLanguage) {
        self.store.update(|s| s.languages.source = language);
        self.store.emit(SessionEvent::SettingsChanged);
    }

    pub async fn toggle_theme(&self) {
        let theme = self.store.update(|s| {
            s.theme = s.theme.toggled();
            s.theme
        });
        self.store.emit(SessionEvent::ThemeChanged { theme });
        if let Err(e) = self.persistence.save_theme(theme).await {
            log::error!("Failed to persist theme: {}", e);
        }
    }

    pub fn theme(&self) -> Theme {
        self.store.read(|s| s.theme)
    }

    // ─── Conversational Exchanges ────────────────────────────

    /// Submit the input buffer to the gateway of the current mode.
    pub async fn submit(&self) {
        let prompt = self.store.read(|s| s.input.trim().to_string());
        if prompt.is_empty() {
            return;
        }
        if self.is_busy() {
            log::debug!("Submission dropped: an exchange is already in flight");
            return;
        }

        let exchange = match self.store.read(|s| Exchange::plan(s, &prompt)) {
            Ok(exchange) => exchange,
            Err(e) => {
                self.store.push_error(&e);
                return;
            }
        };

        self.store.set_request(RequestState::UserExchange);
        self.store.push_message(MessageDraft::user(prompt));
        self.store.set_input(String::new());

        self.run_exchange(exchange).await;
        self.run_pending_summaries().await;
    }

    /// Put `reply` in the input buffer and submit it.
    pub async fn quick_reply(&self, reply: impl Into<String>) {
        if self.is_busy() {
            log::debug!("Quick reply dropped: an exchange is already in flight");
            return;
        }
        self.set_input(reply);
        self.submit().await;
    }

    /// Ask for more about a grounding source attached to an answer.
    pub async fn follow_source(&self, source: &GroundingSource) {
        if self.is_busy() {
            log::debug!("Source follow-up dropped: an exchange is already in flight");
            return;
        }
        self.store.set_request(RequestState::UserExchange);
        self.store
            .push_message(MessageDraft::user(dispatch::follow_up_prompt(&source.title)));

        self.run_exchange(Exchange::SourceFollowUp {
            title: source.title.clone(),
        })
        .await;
        self.run_pending_summaries().await;
    }

    pub fn is_busy(&self) -> bool {
        self.store.read(|s| s.request.is_busy())
    }

    async fn run_exchange(&self, exchange: Exchange) {
        log::info!("Dispatching {} exchange", exchange.kind());
        let result = exchange.execute(&self.gateways).await;
        match result {
            Ok(outcome) => {
                self.store.push_message(outcome.reply);
                self.store.set_request(RequestState::Idle);
                self.record_history(outcome.history).await;
            }
            Err(e) => {
                log::error!("{} exchange failed: {}", exchange.kind(), e);
                self.store.push_error(&e);
                self.store.set_request(RequestState::Idle);
            }
        }
    }

    // ─── File Selection & Auto-Summary ───────────────────────

    pub async fn select_local_file(&self, file: LocalFile) {
        self.select(FileSelection::Local(file)).await;
    }

    pub async fn select_remote_file(&self, file: RemoteFile) {
        self.select(FileSelection::Remote(file)).await;
    }

    async fn select(&self, selection: FileSelection) {
        log::info!("Selected file {}", selection.name());
        self.store.update(|s| s.selection = Some(selection));
        self.store.emit(SessionEvent::SelectionChanged);
        self.store.replace_messages(Vec::new());
        self.run_pending_summaries().await;
    }

    /// Clear the selection and start over with an empty conversation.
    pub fn remove_file(&self) {
        self.store.update(|s| {
            s.selection = None;
            s.processed_key = None;
        });
        self.store.emit(SessionEvent::SelectionChanged);
        self.store
            .replace_messages(vec![MessageDraft::model(SELECT_FILE_PROMPT)]);
    }

    /// Summarize newly selected files until nothing is pending.
    async fn run_pending_summaries(&self) {
        while let Some(job) = self.begin_summary() {
            self.run_summary(job).await;
        }
    }

    fn begin_summary(&self) -> Option<SummaryJob> {
        let job = self.store.update(|s| {
            if s.request.is_busy() {
                return None;
            }
            let selection = s.selection.as_ref()?;
            let key = selection.session_key();
            if s.processed_key.as_ref() == Some(&key) {
                return None;
            }
            let source = match selection {
                FileSelection::Local(file) => DocumentSource::Local(file.clone()),
                FileSelection::Remote(file) => DocumentSource::Remote {
                    file: file.clone(),
                    token: s.auth_token.clone()?,
                },
            };
            s.processed_key = Some(key.clone());
            Some(SummaryJob { key, source })
        })?;

        self.store.set_request(RequestState::AutoSummarizing);
        self.store.replace_messages(Vec::new());
        Some(job)
    }

    async fn run_summary(&self, job: SummaryJob) {
        log::info!("Summarizing {}", job.source.name());
        match self
            .gateways
            .documents
            .analyze(&job.source, dispatch::SUMMARY_PROMPT)
            .await
        {
            Ok(summary) => {
                self.store.push_message(
                    MessageDraft::model(summary.clone())
                        .with_quick_replies(dispatch::SUMMARY_QUICK_REPLIES),
                );
                self.store.set_request(RequestState::Idle);
                let entry = HistoryEntry::new(Mode::Document, dispatch::SUMMARY_PROMPT, summary)
                    .with_file_name(Some(job.source.name().to_string()));
                self.record_history(entry).await;
            }
            Err(e) => {
                log::error!("Summary of {} failed: {}", job.source.name(), e);
                let error = match e {
                    AssistantError::Gateway(reason) if reason.trim().is_empty() => {
                        AssistantError::Gateway(SUMMARY_FAILED.to_string())
                    }
                    other => other,
                };
                self.store.push_error(&error);
                let cleared = self.store.update(|s| {
                    s.processed_key = None;
                    // A newer selection made meanwhile is left alone
                    let still_current = s
                        .selection
                        .as_ref()
                        .map(|sel| sel.session_key() == job.key)
                        .unwrap_or(false);
                    if still_current {
                        s.selection = None;
                    }
                    still_current
                });
                if cleared {
                    self.store.emit(SessionEvent::SelectionChanged);
                }
                self.store.set_request(RequestState::Idle);
            }
        }
    }

    // ─── Cloud Auth & Picker ─────────────────────────────────

    pub async fn sign_in(&self) {
        if self.store.read(|s| s.show_setup_guide) {
            self.store
                .push_error(&AssistantError::Validation(SETUP_REQUIRED.to_string()));
            return;
        }
        if !self.gateways.cloud_auth.is_ready() {
            self.store
                .push_error(&AssistantError::Validation(AUTH_NOT_READY.to_string()));
            return;
        }

        match self.gateways.cloud_auth.sign_in().await {
            Ok(token) => {
                self.store.update(|s| s.auth_token = Some(token));
                self.store.emit(SessionEvent::AuthChanged { signed_in: true });
                log::info!("Signed in to cloud storage");
                // A remote file may have been waiting for the token
                self.run_pending_summaries().await;
            }
            Err(e) => {
                let reason = match e {
                    AssistantError::Gateway(reason) | AssistantError::Auth(reason) => reason,
                    other => other.to_string(),
                };
                let reason = if reason.trim().is_empty() {
                    "sign-in was cancelled or failed".to_string()
                } else {
                    reason
                };
                self.store.push_error(&AssistantError::Auth(reason));
            }
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.store.read(|s| s.auth_token.is_some())
    }

    /// Open the cloud picker; a picked file becomes the selection.
    pub async fn open_picker(&self) {
        let Some(token) = self.store.read(|s| s.auth_token.clone()) else {
            log::debug!("Picker requested without a token");
            return;
        };
        if !self.gateways.cloud_picker.is_ready() {
            log::debug!("Picker requested before it finished loading");
            return;
        }
        match self
            .gateways
            .cloud_picker
            .pick(&token, SUPPORTED_REMOTE_MIME_TYPES)
            .await
        {
            Ok(Some(file)) => self.select_remote_file(file).await,
            Ok(None) => log::debug!("Picker closed without a selection"),
            Err(e) => {
                self.store.push_error(&e);
            }
        }
    }

    // ─── Setup Guide ─────────────────────────────────────────

    pub fn open_setup_guide(&self) {
        self.set_setup_guide(true);
    }

    pub fn dismiss_setup_guide(&self) {
        self.set_setup_guide(false);
    }

    fn set_setup_guide(&self, visible: bool) {
        self.store.update(|s| s.show_setup_guide = visible);
        self.store.emit(SessionEvent::SetupGuideChanged { visible });
    }

    pub async fn save_cloud_credentials(&self, api_key: &str, client_id: &str) {
        let languages = self.store.read(|s| s.languages.clone());
        let config = {
            let mut config = self.config.borrow_mut();
            config.languages = languages;
            config.cloud.api_key = api_key.trim().to_string();
            config.cloud.client_id = client_id.trim().to_string();
            config.clone()
        };
        if config.cloud.is_configured() {
            self.set_setup_guide(false);
        }
        if let Err(e) = self.persistence.save_config(&config).await {
            log::error!("Failed to persist credentials: {}", e);
            self.store.push_error(&e);
        }
    }

    // ─── History ─────────────────────────────────────────────

    async fn record_history(&self, entry: HistoryEntry) {
        self.store.update(|s| s.history.record(entry));
        self.store.emit(SessionEvent::HistoryChanged);
        self.persist_history().await;
    }

    async fn persist_history(&self) {
        let history = self.store.read(|s| s.history.clone());
        if let Err(e) = self.persistence.save_history(&history).await {
            log::error!("Failed to persist history: {}", e);
        }
    }

    /// Show a past exchange as the current conversation.
    pub fn select_history(&self, id: &str) {
        let Some(entry) = self.store.read(|s| s.history.get(id).cloned()) else {
            log::warn!("Unknown history entry {}", id);
            return;
        };
        let mut reply = MessageDraft::model(entry.response);
        if let Some(image) = entry.image {
            reply = reply.with_image(image);
        }
        self.store
            .replace_messages(vec![MessageDraft::user(entry.prompt), reply]);
    }

    pub fn request_delete_history(&self, id: impl Into<String>) {
        self.set_confirmation(Some(Confirmation::DeleteEntry { id: id.into() }));
    }

    pub fn request_clear_history(&self) {
        self.set_confirmation(Some(Confirmation::ClearAll));
    }

    pub fn cancel_confirmation(&self) {
        self.set_confirmation(None);
    }

    fn set_confirmation(&self, confirmation: Option<Confirmation>) {
        self.store.update(|s| s.pending_confirmation = confirmation);
        self.store.emit(SessionEvent::ConfirmationChanged);
    }

    /// Apply the pending confirmation, if any.
    pub async fn confirm(&self) {
        let Some(confirmation) = self.store.update(|s| s.pending_confirmation.take()) else {
            return;
        };
        self.store.emit(SessionEvent::ConfirmationChanged);

        match confirmation {
            Confirmation::DeleteEntry { id } => {
                if self.store.update(|s| s.history.remove(&id).is_some()) {
                    self.store.emit(SessionEvent::HistoryChanged);
                    self.persist_history().await;
                }
            }
            Confirmation::ClearAll => {
                self.store.update(|s| s.history.clear());
                self.store.emit(SessionEvent::HistoryChanged);
                if let Err(e) = self.persistence.clear_history().await {
                    log::error!("Failed to clear stored history: {}", e);
                }
            }
        }
    }

    // ─── Voice & Audio ───────────────────────────────────────

    pub fn toggle_recording(&self) {
        self.voice.toggle();
    }

    pub fn is_recording(&self) -> bool {
        self.voice.is_recording()
    }

    pub async fn play_audio(&self, id: MessageId) {
        self.playback.play(id).await;
    }

    pub fn stop_audio(&self) {
        self.playback.stop();
    }
}
