//! Gateways provided by the host page.
//!
//! The generative-AI SDK and the cloud-storage auth/picker SDK are loaded by
//! the page, not by this crate. The host hands over one object whose methods
//! return Promises:
//!
//! | method              | arguments                         | resolves to                  |
//! |---------------------|-----------------------------------|------------------------------|
//! | `analyzeDocument`   | document descriptor, question     | answer text                  |
//! | `generateImage`     | prompt                            | embeddable image URL         |
//! | `synthesizeSpeech`  | text                              | PCM16 bytes or base64 string |
//! | `translate`         | text, target, source or `null`    | translated text              |
//! | `isAuthReady`       | none                              | bool (synchronous)           |
//! | `signIn`            | none                              | bearer token                 |
//! | `isPickerReady`     | none                              | bool (synchronous)           |
//! | `pickFile`          | token, MIME type array            | `{id, name, mimeType}`/null  |
//!
//! A rejection becomes `AssistantError::Gateway` carrying the error message.

use async_trait::async_trait;
use base64::Engine;
use gloo_utils::format::JsValueSerdeExt;
use js_sys::{Array, Function, Object, Promise, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use assistant_core::ports::{
    CloudAuthPort, CloudPickerPort, DocumentAnalysisPort, ImageGenerationPort, SpeechSynthesisPort,
    TranslationPort,
};
use assistant_types::{
    AssistantError, Result,
    file::{DocumentSource, RemoteFile},
    message::ImageRef,
};

#[derive(Clone)]
pub struct JsGateways {
    host: JsValue,
}

impl JsGateways {
    pub fn new(host: JsValue) -> Result<Self> {
        if !host.is_object() {
            return Err(AssistantError::JsInterop(
                "gateway host must be an object".to_string(),
            ));
        }
        Ok(Self { host })
    }

    fn method(&self, name: &str) -> Result<Function> {
        Reflect::get(&self.host, &JsValue::from_str(name))
            .map_err(|e| AssistantError::JsInterop(format!("{:?}", e)))?
            .dyn_into::<Function>()
            .map_err(|_| AssistantError::JsInterop(format!("gateway host has no {}()", name)))
    }

    /// Call `name(...args)` and await the result, Promise or not.
    async fn call(&self, name: &str, args: &[JsValue]) -> Result<JsValue> {
        let function = self.method(name)?;
        let args: Array = args.iter().collect();
        let returned = function.apply(&self.host, &args).map_err(gateway_error)?;
        JsFuture::from(Promise::resolve(&returned))
            .await
            .map_err(gateway_error)
    }

    async fn call_text(&self, name: &str, args: &[JsValue]) -> Result<String> {
        self.call(name, args)
            .await?
            .as_string()
            .ok_or_else(|| AssistantError::Gateway(format!("{} returned no text", name)))
    }

    fn flag(&self, name: &str) -> bool {
        match self.method(name) {
            Ok(function) => function
                .call0(&self.host)
                .map(|value| value.is_truthy())
                .unwrap_or(false),
            Err(e) => {
                log::warn!("{}", e);
                false
            }
        }
    }
}

#[async_trait(?Send)]
impl DocumentAnalysisPort for JsGateways {
    async fn analyze(&self, source: &DocumentSource, question: &str) -> Result<String> {
        let descriptor = document_descriptor(source)?;
        self.call_text("analyzeDocument", &[descriptor, JsValue::from_str(question)])
            .await
    }
}

#[async_trait(?Send)]
impl ImageGenerationPort for JsGateways {
    async fn generate(&self, prompt: &str) -> Result<ImageRef> {
        let url = self
            .call_text("generateImage", &[JsValue::from_str(prompt)])
            .await?;
        if url.is_empty() {
            return Err(AssistantError::Gateway("No image was generated.".to_string()));
        }
        Ok(ImageRef(url))
    }
}

#[async_trait(?Send)]
impl SpeechSynthesisPort for JsGateways {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let audio = self
            .call("synthesizeSpeech", &[JsValue::from_str(text)])
            .await?;
        let bytes = audio_bytes(&audio)?;
        if bytes.is_empty() {
            return Err(AssistantError::Gateway("No audio data received.".to_string()));
        }
        Ok(bytes)
    }
}

#[async_trait(?Send)]
impl TranslationPort for JsGateways {
    async fn translate(&self, text: &str, target: &str, source: Option<&str>) -> Result<String> {
        let source = source.map(JsValue::from_str).unwrap_or(JsValue::NULL);
        self.call_text(
            "translate",
            &[JsValue::from_str(text), JsValue::from_str(target), source],
        )
        .await
    }
}

#[async_trait(?Send)]
impl CloudAuthPort for JsGateways {
    fn is_ready(&self) -> bool {
        self.flag("isAuthReady")
    }

    async fn sign_in(&self) -> Result<String> {
        let token = self.call_text("signIn", &[]).await?;
        if token.is_empty() {
            return Err(AssistantError::Auth("no access token returned".to_string()));
        }
        Ok(token)
    }
}

#[async_trait(?Send)]
impl CloudPickerPort for JsGateways {
    fn is_ready(&self) -> bool {
        self.flag("isPickerReady")
    }

    async fn pick(&self, token: &str, mime_types: &[&str]) -> Result<Option<RemoteFile>> {
        let filter: Array = mime_types.iter().map(|m| JsValue::from_str(m)).collect();
        let picked = self
            .call("pickFile", &[JsValue::from_str(token), filter.into()])
            .await?;
        if picked.is_null() || picked.is_undefined() {
            return Ok(None);
        }
        picked
            .into_serde::<RemoteFile>()
            .map(Some)
            .map_err(|e| AssistantError::JsInterop(format!("pickFile returned an unexpected value: {}", e)))
    }
}

/// `{kind: "local", name, mimeType, data}` or `{kind: "remote", id, name, mimeType, token}`
fn document_descriptor(source: &DocumentSource) -> Result<JsValue> {
    let object = Object::new();
    let put = |key: &str, value: &JsValue| {
        Reflect::set(&object, &JsValue::from_str(key), value)
            .map(|_| ())
            .map_err(|e| AssistantError::JsInterop(format!("{:?}", e)))
    };
    match source {
        DocumentSource::Local(file) => {
            put("kind", &JsValue::from_str("local"))?;
            put("name", &JsValue::from_str(&file.name))?;
            put("mimeType", &JsValue::from_str(&file.mime_type))?;
            put("data", &Uint8Array::from(&file.data[..]).into())?;
        }
        DocumentSource::Remote { file, token } => {
            put("kind", &JsValue::from_str("remote"))?;
            put("id", &JsValue::from_str(&file.id))?;
            put("name", &JsValue::from_str(&file.name))?;
            put("mimeType", &JsValue::from_str(&file.mime_type))?;
            put("token", &JsValue::from_str(token))?;
        }
    }
    Ok(object.into())
}

/// Accepts a `Uint8Array`, an `ArrayBuffer` or a base64 string
fn audio_bytes(value: &JsValue) -> Result<Vec<u8>> {
    if let Some(text) = value.as_string() {
        return base64::engine::general_purpose::STANDARD
            .decode(text.trim())
            .map_err(|e| AssistantError::Gateway(format!("Speech audio is not valid base64: {}", e)));
    }
    if value.is_instance_of::<Uint8Array>() || value.is_instance_of::<js_sys::ArrayBuffer>() {
        return Ok(Uint8Array::new(value).to_vec());
    }
    if value.is_null() || value.is_undefined() {
        return Ok(Vec::new());
    }
    Err(AssistantError::JsInterop(
        "synthesizeSpeech must resolve to bytes or a base64 string".to_string(),
    ))
}

/// Human-readable reason of a rejected call; empty when there is none
fn gateway_error(value: JsValue) -> AssistantError {
    let reason = if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        String::from(error.message())
    } else if let Some(text) = value.as_string() {
        text
    } else {
        Reflect::get(&value, &JsValue::from_str("message"))
            .ok()
            .and_then(|message| message.as_string())
            .unwrap_or_default()
    };
    AssistantError::Gateway(reason)
}
