//! `AssistantApp`: the session exported to JavaScript.
//!
//! Presentation calls one method per user intent, then re-renders from
//! `snapshot()`. Async intents return a Promise that settles once the
//! intent has been fully handled; they never reject.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use gloo_utils::format::JsValueSerdeExt;
use js_sys::{Array, Function, Promise};
use serde::Deserialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use assistant_core::event_bus::{EventBus, SubscriptionId};
use assistant_core::orchestrator::Orchestrator;
use assistant_core::ports::{Capabilities, Gateways};
use assistant_platform::storage::auto_detect_storage;
use assistant_platform::{JsGateways, WebAudioOutput, WebSpeechRecognition, WikipediaGateway};
use assistant_types::{
    config::{AssistantConfig, SourceLanguage, TARGET_LANGUAGES},
    event::SessionEvent,
    file::{LocalFile, RemoteFile},
    history::{format_relative_age, HistoryEntry},
    message::{GroundingSource, MessageId},
    mode::Mode,
};

/// Options accepted by the constructor; every field may be omitted
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AppOptions {
    config: AssistantConfig,
    wiki_language: Option<String>,
}

#[wasm_bindgen]
pub struct AssistantApp {
    orchestrator: Orchestrator,
    bus: EventBus,
    listener: RefCell<Option<SubscriptionId>>,
}

#[wasm_bindgen]
impl AssistantApp {
    /// `host` provides the AI and cloud-storage gateways (see `JsGateways`).
    #[wasm_bindgen(constructor)]
    pub fn new(host: JsValue, options: JsValue) -> Result<AssistantApp, JsValue> {
        let options: AppOptions = if options.is_undefined() || options.is_null() {
            AppOptions::default()
        } else {
            options.into_serde().map_err(to_js)?
        };

        let js = Rc::new(JsGateways::new(host).map_err(to_js)?);
        let wiki_language = options.wiki_language.as_deref().unwrap_or_default();
        let gateways = Gateways {
            documents: js.clone(),
            encyclopedia: Rc::new(WikipediaGateway::new(wiki_language)),
            images: js.clone(),
            speech: js.clone(),
            translation: js.clone(),
            cloud_auth: js.clone(),
            cloud_picker: js,
        };
        let capabilities = Capabilities {
            speech_recognition: Rc::new(WebSpeechRecognition::new()),
            audio_output: Rc::new(WebAudioOutput::new()),
        };

        let bus = EventBus::new();
        let orchestrator = Orchestrator::new(
            options.config,
            gateways,
            capabilities,
            auto_detect_storage(),
            bus.clone(),
        );
        log::info!("Assistant session created");

        Ok(Self {
            orchestrator,
            bus,
            listener: RefCell::new(None),
        })
    }

    /// Restore persisted state and post the greeting.
    pub fn initialize(&self) -> Promise {
        let orch = self.orchestrator.clone();
        settle(async move { orch.initialize().await })
    }

    // ─── Rendering ───────────────────────────────────────────

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        JsValue::from_serde(&self.orchestrator.snapshot()).map_err(to_js)
    }

    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&self) -> Result<JsValue, JsValue> {
        JsValue::from_serde(&self.bus.drain()).map_err(to_js)
    }

    /// Call `callback(event)` on every state change. Replaces any previous listener.
    #[wasm_bindgen(js_name = setListener)]
    pub fn set_listener(&self, callback: Function) {
        self.clear_listener();
        let id = self.bus.subscribe(Rc::new(move |event: &SessionEvent| {
            match JsValue::from_serde(event) {
                Ok(value) => {
                    if let Err(e) = callback.call1(&JsValue::NULL, &value) {
                        log::warn!("Session listener threw: {:?}", e);
                    }
                }
                Err(e) => log::error!("Failed to serialize event: {}", e),
            }
        }));
        *self.listener.borrow_mut() = Some(id);
    }

    #[wasm_bindgen(js_name = clearListener)]
    pub fn clear_listener(&self) {
        if let Some(id) = self.listener.borrow_mut().take() {
            self.bus.unsubscribe(id);
        }
    }

    /// History entries of one category, newest first
    #[wasm_bindgen(js_name = historyFor)]
    pub fn history_for(&self, mode: &str) -> Result<JsValue, JsValue> {
        let mode: Mode = mode.parse().map_err(to_js)?;
        let entries: Vec<HistoryEntry> = self
            .orchestrator
            .store()
            .read(|s| s.history.by_category(mode).cloned().collect());
        JsValue::from_serde(&entries).map_err(to_js)
    }

    // ─── Conversation ────────────────────────────────────────

    #[wasm_bindgen(js_name = setInput)]
    pub fn set_input(&self, text: String) {
        self.orchestrator.set_input(text);
    }

    pub fn submit(&self) -> Promise {
        let orch = self.orchestrator.clone();
        settle(async move { orch.submit().await })
    }

    #[wasm_bindgen(js_name = quickReply)]
    pub fn quick_reply(&self, text: String) -> Promise {
        let orch = self.orchestrator.clone();
        settle(async move { orch.quick_reply(text).await })
    }

    #[wasm_bindgen(js_name = followSource)]
    pub fn follow_source(&self, title: String, uri: String) -> Promise {
        let orch = self.orchestrator.clone();
        settle(async move { orch.follow_source(&GroundingSource::new(title, uri)).await })
    }

    #[wasm_bindgen(js_name = setMode)]
    pub fn set_mode(&self, mode: &str) -> Result<(), JsValue> {
        let mode: Mode = mode.parse().map_err(to_js)?;
        self.orchestrator.set_mode(mode);
        Ok(())
    }

    // ─── Files & Cloud Storage ───────────────────────────────

    #[wasm_bindgen(js_name = selectLocalFile)]
    pub fn select_local_file(&self, name: String, mime_type: String, data: Vec<u8>) -> Promise {
        let orch = self.orchestrator.clone();
        let file = LocalFile::new(name, mime_type, data);
        settle(async move { orch.select_local_file(file).await })
    }

    /// For hosts running their own picker; expects `{id, name, mimeType}`.
    #[wasm_bindgen(js_name = selectRemoteFile)]
    pub fn select_remote_file(&self, file: JsValue) -> Result<Promise, JsValue> {
        let file: RemoteFile = file.into_serde().map_err(to_js)?;
        let orch = self.orchestrator.clone();
        Ok(settle(async move { orch.select_remote_file(file).await }))
    }

    #[wasm_bindgen(js_name = removeFile)]
    pub fn remove_file(&self) {
        self.orchestrator.remove_file();
    }

    #[wasm_bindgen(js_name = signIn)]
    pub fn sign_in(&self) -> Promise {
        let orch = self.orchestrator.clone();
        settle(async move { orch.sign_in().await })
    }

    #[wasm_bindgen(js_name = openPicker)]
    pub fn open_picker(&self) -> Promise {
        let orch = self.orchestrator.clone();
        settle(async move { orch.open_picker().await })
    }

    // ─── Setup Guide ─────────────────────────────────────────

    #[wasm_bindgen(js_name = openSetupGuide)]
    pub fn open_setup_guide(&self) {
        self.orchestrator.open_setup_guide();
    }

    #[wasm_bindgen(js_name = dismissSetupGuide)]
    pub fn dismiss_setup_guide(&self) {
        self.orchestrator.dismiss_setup_guide();
    }

    #[wasm_bindgen(js_name = saveCloudCredentials)]
    pub fn save_cloud_credentials(&self, api_key: String, client_id: String) -> Promise {
        let orch = self.orchestrator.clone();
        settle(async move { orch.save_cloud_credentials(&api_key, &client_id).await })
    }

    // ─── History ─────────────────────────────────────────────

    #[wasm_bindgen(js_name = selectHistory)]
    pub fn select_history(&self, id: &str) {
        self.orchestrator.select_history(id);
    }

    #[wasm_bindgen(js_name = requestDeleteHistory)]
    pub fn request_delete_history(&self, id: String) {
        self.orchestrator.request_delete_history(id);
    }

    #[wasm_bindgen(js_name = requestClearHistory)]
    pub fn request_clear_history(&self) {
        self.orchestrator.request_clear_history();
    }

    pub fn confirm(&self) -> Promise {
        let orch = self.orchestrator.clone();
        settle(async move { orch.confirm().await })
    }

    #[wasm_bindgen(js_name = cancelConfirmation)]
    pub fn cancel_confirmation(&self) {
        self.orchestrator.cancel_confirmation();
    }

    // ─── Settings ────────────────────────────────────────────

    #[wasm_bindgen(js_name = setVoiceLanguage)]
    pub fn set_voice_language(&self, language: String) {
        self.orchestrator.set_voice_language(language);
    }

    #[wasm_bindgen(js_name = setTargetLanguage)]
    pub fn set_target_language(&self, language: String) {
        self.orchestrator.set_target_language(language);
    }

    /// `"Auto"` (or an empty string) asks for auto-detection
    #[wasm_bindgen(js_name = setSourceLanguage)]
    pub fn set_source_language(&self, language: &str) {
        self.orchestrator
            .set_source_language(SourceLanguage::parse(language));
    }

    #[wasm_bindgen(js_name = toggleTheme)]
    pub fn toggle_theme(&self) -> Promise {
        let orch = self.orchestrator.clone();
        settle(async move { orch.toggle_theme().await })
    }

    // ─── Voice & Audio ───────────────────────────────────────

    #[wasm_bindgen(js_name = toggleRecording)]
    pub fn toggle_recording(&self) {
        self.orchestrator.toggle_recording();
    }

    /// Message ids cross the boundary as numbers
    #[wasm_bindgen(js_name = playAudio)]
    pub fn play_audio(&self, id: f64) -> Promise {
        let orch = self.orchestrator.clone();
        let id = MessageId(id as u64);
        settle(async move { orch.play_audio(id).await })
    }

    #[wasm_bindgen(js_name = stopAudio)]
    pub fn stop_audio(&self) {
        self.orchestrator.stop_audio();
    }
}

/// "3 minutes ago" style label for a history timestamp
#[wasm_bindgen(js_name = relativeAge)]
pub fn relative_age(timestamp_ms: f64) -> String {
    format_relative_age(timestamp_ms as i64, js_sys::Date::now() as i64)
}

/// Language names offered as translation targets
#[wasm_bindgen(js_name = targetLanguages)]
pub fn target_languages() -> Array {
    TARGET_LANGUAGES.iter().map(|name| JsValue::from_str(name)).collect()
}

fn settle(task: impl Future<Output = ()> + 'static) -> Promise {
    future_to_promise(async move {
        task.await;
        Ok(JsValue::UNDEFINED)
    })
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}
