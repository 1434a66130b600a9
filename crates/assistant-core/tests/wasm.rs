//! WASM-target tests for assistant-core.
//!
//! Runs EventBus, PCM decoding, and an orchestrator round trip
//! under wasm32-unknown-unknown via `wasm-pack test --node`.

use wasm_bindgen_test::*;

use assistant_core::event_bus::EventBus;
use assistant_core::orchestrator::Orchestrator;
use assistant_core::pcm::decode_pcm16;
use assistant_core::ports::*;
use assistant_types::config::AssistantConfig;
use assistant_types::event::SessionEvent;
use assistant_types::file::{DocumentSource, RemoteFile};
use assistant_types::message::*;
use assistant_types::mode::Mode;
use assistant_types::{AssistantError, Result};

use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

// ─── EventBus Tests ──────────────────────────────────────

#[wasm_bindgen_test]
fn event_bus_drain_empties() {
    let bus = EventBus::new();
    bus.emit(SessionEvent::InputChanged);
    assert_eq!(bus.drain().len(), 1);
    assert!(bus.drain().is_empty());
}

#[wasm_bindgen_test]
fn event_bus_clone_shares_state() {
    let bus1 = EventBus::new();
    let bus2 = bus1.clone();
    bus1.emit(SessionEvent::ModeChanged { mode: Mode::Image });
    assert_eq!(bus2.drain(), vec![SessionEvent::ModeChanged { mode: Mode::Image }]);
}

// ─── PCM Tests ───────────────────────────────────────────

#[wasm_bindgen_test]
fn pcm_decodes_little_endian() {
    let clip = decode_pcm16(&[0x00, 0x40, 0x00, 0xC0], 24_000, 1).unwrap();
    assert_eq!(clip.channels[0], vec![0.5, -0.5]);
}

#[wasm_bindgen_test]
fn pcm_rejects_odd_length() {
    assert!(decode_pcm16(&[0x00], 24_000, 1).is_err());
}

// ─── Orchestrator ────────────────────────────────────────

/// Answers every gateway call by echoing its input
struct Echo;

#[async_trait(?Send)]
impl DocumentAnalysisPort for Echo {
    async fn analyze(&self, source: &DocumentSource, question: &str) -> Result<String> {
        Ok(format!("{}: {}", source.name(), question))
    }
}

#[async_trait(?Send)]
impl EncyclopediaPort for Echo {
    async fn search(&self, term: &str) -> Result<SearchResult> {
        Ok(SearchResult {
            content: format!("No results for {}", term),
            sources: Vec::new(),
        })
    }

    async fn summary(&self, title: &str) -> Result<String> {
        Ok(title.to_string())
    }
}

#[async_trait(?Send)]
impl ImageGenerationPort for Echo {
    async fn generate(&self, prompt: &str) -> Result<ImageRef> {
        Ok(ImageRef(format!("data:image/png;base64,{}", prompt.len())))
    }
}

#[async_trait(?Send)]
impl SpeechSynthesisPort for Echo {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
        Err(AssistantError::Gateway("No audio data received.".to_string()))
    }
}

#[async_trait(?Send)]
impl TranslationPort for Echo {
    async fn translate(&self, text: &str, target: &str, _source: Option<&str>) -> Result<String> {
        Ok(format!("[{}] {}", target, text))
    }
}

#[async_trait(?Send)]
impl CloudAuthPort for Echo {
    fn is_ready(&self) -> bool {
        false
    }

    async fn sign_in(&self) -> Result<String> {
        Err(AssistantError::Cancelled)
    }
}

#[async_trait(?Send)]
impl CloudPickerPort for Echo {
    fn is_ready(&self) -> bool {
        false
    }

    async fn pick(&self, _token: &str, _mime_types: &[&str]) -> Result<Option<RemoteFile>> {
        Ok(None)
    }
}

impl SpeechRecognitionPort for Echo {
    fn is_available(&self) -> bool {
        false
    }

    fn start(&self, _options: RecognitionOptions, _sink: RecognitionSink) -> Result<Rc<dyn RecognitionSession>> {
        Err(AssistantError::Unsupported("no recognizer".to_string()))
    }
}

impl AudioOutputPort for Echo {
    fn open(&self, _sample_rate: u32) -> Result<Rc<dyn AudioContextPort>> {
        Err(AssistantError::Audio("no output".to_string()))
    }
}

#[derive(Default)]
struct MemoryStore {
    data: RefCell<HashMap<String, Vec<u8>>>,
}

#[async_trait(?Send)]
impl StoragePort for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.data.borrow().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.data.borrow_mut().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.data.borrow_mut().remove(key);
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "wasm-test"
    }
}

fn orchestrator() -> Orchestrator {
    let echo = Rc::new(Echo);
    let gateways = Gateways {
        documents: echo.clone(),
        encyclopedia: echo.clone(),
        images: echo.clone(),
        speech: echo.clone(),
        translation: echo.clone(),
        cloud_auth: echo.clone(),
        cloud_picker: echo.clone(),
    };
    let capabilities = Capabilities {
        speech_recognition: echo.clone(),
        audio_output: echo,
    };
    Orchestrator::new(
        AssistantConfig::default(),
        gateways,
        capabilities,
        Rc::new(MemoryStore::default()),
        EventBus::new(),
    )
}

#[wasm_bindgen_test]
async fn translation_round_trip() {
    let orch = orchestrator();
    orch.initialize().await;
    orch.set_mode(Mode::Translation);
    orch.set_target_language("French");
    orch.set_input("Hello");
    orch.submit().await;

    let snap = orch.snapshot();
    assert_eq!(snap.messages.last().unwrap().content, "[French] Hello");
    assert_eq!(snap.history.len(), 1);
    assert!(!snap.busy);
}

#[wasm_bindgen_test]
async fn missing_capabilities_surface_errors() {
    let orch = orchestrator();
    orch.toggle_recording();
    assert!(!orch.is_recording());

    let id = orch.store().push_message(MessageDraft::model("Read me"));
    orch.play_audio(id).await;
    assert_eq!(orch.snapshot().playing, None);

    let roles: Vec<Role> = orch.snapshot().messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::Error, Role::Model, Role::Error]);
}
