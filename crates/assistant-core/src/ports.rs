//! Port traits: the hexagonal architecture boundary.
//!
//! These traits are defined here in `assistant-core` (pure Rust).
//! Implementations live in `assistant-platform` (browser adapters).
//! The core never imports platform code; it only depends on these traits.

use std::rc::Rc;

use async_trait::async_trait;
use assistant_types::{
    Result,
    file::{DocumentSource, RemoteFile},
    message::{ImageRef, SearchResult},
};

use crate::pcm::PcmClip;

// ─── Gateway Ports ───────────────────────────────────────────

#[async_trait(?Send)]
pub trait DocumentAnalysisPort {
    /// Answer `question` about the given document
    async fn analyze(&self, source: &DocumentSource, question: &str) -> Result<String>;
}

#[async_trait(?Send)]
pub trait EncyclopediaPort {
    async fn search(&self, term: &str) -> Result<SearchResult>;

    /// Plain-text summary of an article. Returns placeholder text when the
    /// article has no summary; fails only on transport errors.
    async fn summary(&self, title: &str) -> Result<String>;
}

#[async_trait(?Send)]
pub trait ImageGenerationPort {
    async fn generate(&self, prompt: &str) -> Result<ImageRef>;
}

#[async_trait(?Send)]
pub trait SpeechSynthesisPort {
    /// Raw 16-bit little-endian PCM at the configured sample rate
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

#[async_trait(?Send)]
pub trait TranslationPort {
    /// `source == None` asks the service to auto-detect the input language
    async fn translate(&self, text: &str, target: &str, source: Option<&str>) -> Result<String>;
}

#[async_trait(?Send)]
pub trait CloudAuthPort {
    /// Whether the auth SDK finished loading
    fn is_ready(&self) -> bool;

    /// Interactive sign-in; resolves to a bearer token
    async fn sign_in(&self) -> Result<String>;
}

#[async_trait(?Send)]
pub trait CloudPickerPort {
    fn is_ready(&self) -> bool;

    /// `Ok(None)` when the user closed the picker without choosing
    async fn pick(&self, token: &str, mime_types: &[&str]) -> Result<Option<RemoteFile>>;
}

/// Every external service the orchestrator dispatches to
#[derive(Clone)]
pub struct Gateways {
    pub documents: Rc<dyn DocumentAnalysisPort>,
    pub encyclopedia: Rc<dyn EncyclopediaPort>,
    pub images: Rc<dyn ImageGenerationPort>,
    pub speech: Rc<dyn SpeechSynthesisPort>,
    pub translation: Rc<dyn TranslationPort>,
    pub cloud_auth: Rc<dyn CloudAuthPort>,
    pub cloud_picker: Rc<dyn CloudPickerPort>,
}

// ─── Storage Port ────────────────────────────────────────────

#[async_trait(?Send)]
pub trait StoragePort {
    /// Get a value by key
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Set a value
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Delete a value
    async fn delete(&self, key: &str) -> Result<()>;

    /// Name of this backend (for logging/debug)
    fn backend_name(&self) -> &str;
}

// ─── Speech Recognition Capability ───────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionOptions {
    pub language: String,
    pub continuous: bool,
    pub interim_results: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Top alternative of every result so far, in order
    Transcript(Vec<String>),
    /// Raw error reason reported by the recognizer
    Error(String),
    /// The session ended, naturally or after an error or stop
    End,
}

/// Callback the recognizer invokes for every event of one session
pub type RecognitionSink = Rc<dyn Fn(RecognitionEvent)>;

pub trait RecognitionSession {
    /// Request a graceful stop; the session confirms with `RecognitionEvent::End`
    fn stop(&self);
}

pub trait SpeechRecognitionPort {
    fn is_available(&self) -> bool;

    fn start(
        &self,
        options: RecognitionOptions,
        sink: RecognitionSink,
    ) -> Result<Rc<dyn RecognitionSession>>;
}

// ─── Audio Output Capability ─────────────────────────────────

pub trait AudioOutputPort {
    /// Create an output context running at `sample_rate`
    fn open(&self, sample_rate: u32) -> Result<Rc<dyn AudioContextPort>>;
}

pub trait AudioContextPort {
    /// Start playing `clip`. `on_ended` runs once when playback finishes or is stopped.
    fn play(&self, clip: PcmClip, on_ended: Box<dyn FnOnce()>) -> Result<Box<dyn ActiveClip>>;
}

pub trait ActiveClip {
    fn stop(&self);
}

/// Browser capabilities that are not request/response gateways
#[derive(Clone)]
pub struct Capabilities {
    pub speech_recognition: Rc<dyn SpeechRecognitionPort>,
    pub audio_output: Rc<dyn AudioOutputPort>,
}
